// src/application/ports/time.rs
use chrono::{DateTime, Utc};

/// Source of "now" for every expiry and session-validity decision.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
