// src/infrastructure/mod.rs
pub mod http_client;
pub mod persistence;
pub mod security;
pub mod time;
