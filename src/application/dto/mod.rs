// src/application/dto/mod.rs
pub mod request;
pub mod token;

pub use request::RequestContext;
pub use token::{JwtInfo, JwtToken, TokenResponse};
