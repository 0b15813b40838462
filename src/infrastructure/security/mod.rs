// src/infrastructure/security/mod.rs
pub mod jwt;
pub mod keys;
pub mod session_store;

pub use jwt::JoseJwtCodec;
pub use keys::generate_rsa_key_pair;
pub use session_store::InMemorySessionStore;
