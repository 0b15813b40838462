// src/presentation/http/error.rs
use crate::application::{ApplicationResult, error::ApplicationError};
use crate::domain::errors::DomainError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    code: Option<String>,
    message: String,
    request_id: Option<String>,
}

impl HttpError {
    pub fn from_error(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Detailed(detail) => {
                let status = detail
                    .http_status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .unwrap_or(StatusCode::BAD_REQUEST);
                Self {
                    status,
                    code: Some(detail.code),
                    message: detail.description,
                    request_id: None,
                }
            }
            ApplicationError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            ApplicationError::Unauthorized(msg) => Self::new(StatusCode::UNAUTHORIZED, msg),
            ApplicationError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            ApplicationError::Infrastructure(msg) => Self::internal(msg),
            ApplicationError::Domain(domain_err) => match domain_err {
                DomainError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
                DomainError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            },
        }
    }

    fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            code: None,
            message,
            request_id: None,
        }
    }

    /// Logs the cause under a fresh request id and hides it from the client.
    fn internal(cause: String) -> Self {
        let request_id = Uuid::new_v4().to_string();
        tracing::error!(request_id = %request_id, error = %cause, "internal error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: None,
            message: "An unexpected error has occurred.".into(),
            request_id: Some(request_id),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let payload = ErrorResponse {
            error: self.code.unwrap_or_else(|| {
                self.status
                    .canonical_reason()
                    .unwrap_or("error")
                    .to_string()
            }),
            message: self.message,
            request_id: self.request_id,
        };
        (self.status, Json(payload)).into_response()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

pub type HttpResult<T> = Result<T, HttpError>;

pub trait IntoHttpResult<T> {
    fn into_http(self) -> HttpResult<T>;
}

impl<T> IntoHttpResult<T> for ApplicationResult<T> {
    fn into_http(self) -> HttpResult<T> {
        self.map_err(HttpError::from_error)
    }
}
