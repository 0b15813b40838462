// src/presentation/http/controllers/mod.rs
pub mod account;
pub mod certs;
pub mod discovery;
pub mod userinfo;
