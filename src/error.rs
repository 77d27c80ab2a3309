use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use store::StoreError;
use thiserror::Error;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by services and handlers.
///
/// The first six variants carry a message that is safe to return to the
/// client. Everything else is logged and collapsed into a generic 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    DuplicateEntity(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(message) => ApiError::DuplicateEntity(message),
            StoreError::InvalidReference(message) => ApiError::InvalidData(message),
            other => ApiError::Store(other),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateEntity(_) => StatusCode::CONFLICT,
            ApiError::Authentication(_) | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidData(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::DuplicateEntity(_) => "DUPLICATE_ENTITY",
            ApiError::Authentication(_) => "AUTHENTICATION_FAILED",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InvalidData(_) => "INVALID_DATA",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let message = match self {
            ApiError::NotFound(message)
            | ApiError::DuplicateEntity(message)
            | ApiError::Authentication(message)
            | ApiError::Unauthorized(message)
            | ApiError::InvalidData(message) => {
                warn!(code, %message, "Request rejected");
                message
            }
            other => {
                error!(error = %other, "Internal error while handling request");
                "Internal server error".to_string()
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            success: false,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_client_errors() {
        let duplicate: ApiError = StoreError::Duplicate("email".to_string()).into();
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);
        assert_eq!(duplicate.code(), "DUPLICATE_ENTITY");

        let reference: ApiError = StoreError::InvalidReference("currency".to_string()).into();
        assert_eq!(reference.status_code(), StatusCode::BAD_REQUEST);

        let database: ApiError = StoreError::Database(DbErr::Custom("boom".to_string())).into();
        assert_eq!(database.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(database.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_internal_details_are_not_returned() {
        let response = ApiError::Internal("secret detail".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
