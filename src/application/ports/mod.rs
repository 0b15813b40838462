// src/application/ports/mod.rs
pub mod database;
pub mod security;
pub mod session;
pub mod time;
pub mod token_endpoint;
