// src/domain/mod.rs
pub mod client;
pub mod code;
pub mod errors;
pub mod key_pair;
pub mod refresh_token;
pub mod resource;
pub mod scope;
pub mod settings;
pub mod user;
pub mod user_session;

pub use client::{Client, RedirectUri, ThreeStateSetting};
pub use code::Code;
pub use key_pair::{KeyPair, KeyState};
pub use refresh_token::{RefreshToken, RefreshTokenType};
pub use resource::{Permission, Resource};
pub use settings::Settings;
pub use user::{Attribute, Group, User};
pub use user_session::{UserSession, UserSessionClient};
