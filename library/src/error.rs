//! Errors surfaced by the sensor endpoints.
//!
//! Every variant renders as `{"message": "..."}` with the status code of
//! its kind, so handlers can return `Result<_, ServiceError>` directly.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub const INVALID_PAYLOAD: &str = "Invalid payload.";
pub const INVALID_DATE_FORMAT: &str = "Invalid date format.";
pub const INVALID_QUERY_PARAMETER: &str = "Invalid query parameter.";
pub const SENSOR_NOT_FOUND: &str = "Sensor not found.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Malformed or missing client input
    #[error("{0}")]
    Validation(String),

    /// Unknown reading id
    #[error("{0}")]
    NotFound(String),

    /// Storage layer failure, message passed through as-is
    #[error("{0}")]
    Persistence(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

impl ServiceError {
    pub fn invalid_payload() -> Self {
        ServiceError::Validation(INVALID_PAYLOAD.to_owned())
    }

    pub fn not_found() -> Self {
        ServiceError::NotFound(SENSOR_NOT_FOUND.to_owned())
    }

    pub fn message(&self) -> &str {
        match self {
            ServiceError::Validation(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::Persistence(msg) => msg,
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.message(),
        })
    }
}

impl From<diesel::result::Error> for ServiceError {
    fn from(err: diesel::result::Error) -> Self {
        ServiceError::Persistence(err.to_string())
    }
}

impl From<r2d2::Error> for ServiceError {
    fn from(err: r2d2::Error) -> Self {
        ServiceError::Persistence(err.to_string())
    }
}

impl From<actix::MailboxError> for ServiceError {
    fn from(err: actix::MailboxError) -> Self {
        ServiceError::Persistence(err.to_string())
    }
}
