use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Failures surfaced by the document store, object storage and the post
/// synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The remote call did not complete.
    #[error("network failure: {0}")]
    Network(String),
    /// The referenced post or comment document is absent.
    #[error("document not found: {0}")]
    NotFound(String),
    /// A malformed document or a missing input.
    #[error("validation failure: {0}")]
    Validation(String),
    /// The acting user may not change the referenced document.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

pub type FeedResult<T> = Result<T, FeedError>;

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Validation(err.to_string())
    }
}

#[derive(Debug)]
pub enum ApiError {
    InvalidCredentials,
    UserAlreadyExists,
    Unauthorized,
    Forbidden,
    NotFound(String),
    ValidationError(String),
    BadGateway(String),
    InternalError(String),
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::NotFound(path) => ApiError::NotFound(path),
            FeedError::Validation(msg) => ApiError::ValidationError(msg),
            FeedError::Network(msg) => ApiError::BadGateway(msg),
            FeedError::Forbidden(_) => ApiError::Forbidden,
        }
    }
}

/// Convert our custom errors to HTTP responses
///
/// Store failures become 502 so the client can tell them apart from its own
/// mistakes.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            ApiError::UserAlreadyExists => (StatusCode::CONFLICT, "User already exists"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            ApiError::ValidationError(msg) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                      "error": msg
                    })),
                )
                    .into_response();
            }
            ApiError::BadGateway(msg) => {
                error!("Remote store failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "Remote store unavailable")
            }
            ApiError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (
            status,
            Json(serde_json::json!({
              "error": message
            })),
        )
            .into_response()
    }
}
