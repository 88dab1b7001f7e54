use crate::schemas::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use model::RepositoryError;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by the HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// The requested user does not exist
    #[error("User {0} not found")]
    UserNotFound(i32),

    /// The request passed extraction but is still unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Error from the repository
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::UserNotFound(_) | ApiError::Repository(RepositoryError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND")
            }
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Repository(RepositoryError::AssociationNotFound { .. }) => {
                (StatusCode::BAD_REQUEST, "ASSOCIATION_NOT_FOUND")
            }
            ApiError::Repository(
                RepositoryError::AlreadyPersisted(_) | RepositoryError::NotPersisted,
            ) => (StatusCode::BAD_REQUEST, "INVALID_USER_STATE"),
            ApiError::Repository(RepositoryError::Database(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            warn!("Request rejected: {}", self);
            self.to_string()
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
    fn test_status_mapping() {
        let cases = [
            (ApiError::UserNotFound(1), StatusCode::NOT_FOUND),
            (
                ApiError::Repository(RepositoryError::NotFound(1)),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Repository(RepositoryError::AssociationNotFound {
                    kind: "category",
                    id: 3,
                    user_id: 1,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Repository(RepositoryError::Database(sea_orm::DbErr::Custom(
                    "boom".to_string(),
                ))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
