// src/presentation/http/middleware/mod.rs
pub mod jwt;
pub mod request_context;
pub mod session;

pub use jwt::{bearer_token_layer, jwt_session_handler, requires_scope};
pub use request_context::request_context_layer;
pub use session::session_layer;
