/// Unified error types for the geopost service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or invalid bearer credential
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Malformed request input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Submission carried no media attachment while media is required
    #[error("Media attachment is required")]
    MediaRequired,

    /// Media attachment present but unreadable
    #[error("Media error: {0}")]
    Media(String),

    /// Blob storage errors (existence check, write, publish, attribute fetch)
    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    /// Annotation service errors (transport or service failure, never "no face")
    #[error("Annotation error: {0}")]
    Annotation(String),

    /// Document index errors
    #[error("Index error: {0}")]
    Index(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ServiceError {
    /// Stable error code reported to clients
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Authentication(_) => "Unauthorized",
            ServiceError::Validation(_) => "BadInput",
            ServiceError::MediaRequired | ServiceError::Media(_) => "MediaError",
            ServiceError::BlobStorage(_) => "StorageError",
            ServiceError::Annotation(_) => "AnnotationError",
            ServiceError::Index(_) => "IndexError",
            ServiceError::NotFound(_) => "NotFound",
            ServiceError::Config(_) | ServiceError::Internal(_) | ServiceError::Io(_) => {
                "InternalServerError"
            }
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Validation(_) | ServiceError::MediaRequired | ServiceError::Media(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert ServiceError to HTTP response
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServiceError::BlobStorage(_) => "Failed to save media to blob storage".to_string(),
            ServiceError::Annotation(_) => "Failed to annotate image".to_string(),
            ServiceError::Index(_) => "Failed to access the post index".to_string(),
            // Don't leak details
            ServiceError::Config(_) | ServiceError::Internal(_) | ServiceError::Io(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
