//! Error taxonomy and HTTP mapping
//!
//! Validation and missing-layout failures map to 400, upstream and
//! persistence failures to 500; every response body is `{"error": message}`.

use std::path::Path;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Disk persistence failure (history snapshot or canonical layout copy)
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("history snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PersistenceError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Failures surfaced by the ingest / query / reset operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Malformed or missing input; the message is returned to the caller verbatim
    #[error("{0}")]
    Validation(String),

    #[error("No spatial layout uploaded yet.")]
    MissingLayout,

    /// Backend call failed, timed out, or returned nothing usable
    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::Validation(_) | ServiceError::MissingLayout => StatusCode::BAD_REQUEST,
            ServiceError::Upstream(_) | ServiceError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
