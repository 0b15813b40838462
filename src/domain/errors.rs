// src/domain/errors.rs
use thiserror::Error;

/// Invariant violations raised by entities and by the stores that hold them.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid value: {0}")]
    Validation(String),
    #[error("already exists: {0}")]
    Conflict(String),
}
