// src/application/error.rs
use crate::domain::errors::DomainError;
use std::fmt;
use thiserror::Error;

pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// Structured validation failure surfaced directly to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub description: String,
    pub http_status: Option<u16>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            http_status: None,
        }
    }

    pub fn with_status(
        code: impl Into<String>,
        description: impl Into<String>,
        http_status: u16,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            http_status: Some(http_status),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Detailed(ErrorDetail),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
}

impl ApplicationError {
    pub fn detailed(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Detailed(ErrorDetail::new(code, description))
    }

    pub fn detailed_with_status(
        code: impl Into<String>,
        description: impl Into<String>,
        http_status: u16,
    ) -> Self {
        Self::Detailed(ErrorDetail::with_status(code, description, http_status))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn infrastructure(msg: impl Into<String>) -> Self {
        Self::Infrastructure(msg.into())
    }

    /// The structured detail, when this is a caller-facing validation error.
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            Self::Detailed(detail) => Some(detail),
            _ => None,
        }
    }
}
