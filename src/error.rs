use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::state::engine::EngineError;

/// Failures reported by the service layer, independent of the transport.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The game is not in a phase that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The addressed connection or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<EngineError> for ServiceError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::EmptyCatalog => Self::InvalidState(err.to_string()),
        }
    }
}

/// HTTP-facing error, rendered as `{"code", "message"}`.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request body failed validation.
    #[error("{0}")]
    BadRequest(String),
    /// Addressed resource does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Request conflicts with the current game phase.
    #[error("{0}")]
    Conflict(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidState(message) => Self::Conflict(message),
            ServiceError::NotFound(message) => Self::NotFound(message),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self::BadRequest(format!("validation failed: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_http_statuses() {
        let cases = [
            (
                AppError::from(ServiceError::NotFound("connection `x` not found".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(ServiceError::from(EngineError::EmptyCatalog)),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(ValidationErrors::new()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn message_carries_the_cause() {
        let err = AppError::from(ServiceError::from(EngineError::EmptyCatalog));
        assert_eq!(err.code(), "conflict");
        assert_eq!(
            err.to_string(),
            "invalid state: no rounds found in the round catalog"
        );
    }
}
