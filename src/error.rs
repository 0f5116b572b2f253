//! Error types for every layer, and their mapping onto HTTP responses.

use crate::models::{Category, InvalidCategory, ValidationError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failures of the translation round trip. All of them mean nothing may be
/// persisted.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("translation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("translation not found in the response")]
    MissingPayload,

    #[error("mismatch in number of translated lines: sent {sent}, received {received}")]
    LineCountMismatch { sent: usize, received: usize },
}

impl TranslationError {
    /// Whether asking again could plausibly succeed.
    ///
    /// Transport failures (including timeouts), rate limiting and server
    /// errors are retried; a response without a payload or with the wrong
    /// number of lines is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Transport(_) => true,
            TranslationError::Status { status, .. } => *status == 429 || *status >= 500,
            TranslationError::MissingPayload | TranslationError::LineCountMismatch { .. } => false,
        }
    }
}

/// Failures of the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("document {id} was modified concurrently")]
    VersionConflict { id: String },

    #[error("document {id} not found")]
    NotFound { id: String },

    #[error("stored document is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failures loading a static content file.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of a bulk import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No data provided.")]
    NoData,

    #[error("Entry '{id}' is invalid: {source}")]
    Invalid {
        id: String,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything a route handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("translation failed: {source}")]
    Translation {
        category: Category,
        #[source]
        source: TranslationError,
    },

    #[error("{message}: {source}")]
    Store {
        message: String,
        #[source]
        source: StoreError,
    },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Translation { .. } | ApiError::Store { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Wrap a store failure, keeping duplicate keys and lost races as 409.
    pub fn store(message: impl Into<String>, source: StoreError) -> Self {
        match source {
            StoreError::Duplicate(_) => ApiError::Conflict("Duplicate entries detected.".to_string()),
            StoreError::VersionConflict { id } => ApiError::Conflict(format!(
                "{} was modified concurrently, please retry",
                id
            )),
            source => ApiError::Store {
                message: message.into(),
                source,
            },
        }
    }

    /// Message shown to clients. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::Translation { category, .. } => {
                format!("Error fetching {} data: translation failed", category)
            }
            ApiError::Store { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<InvalidCategory> for ApiError {
    fn from(err: InvalidCategory) -> Self {
        ApiError::NotFound(err.to_string())
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Store(source) => ApiError::store("Something went wrong.", source),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        error!("Failed to load language content: {}", err);
        ApiError::Internal("Failed to read content file.".to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}
