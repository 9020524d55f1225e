//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Unparseable input maps to 422 with the parser's message as `detail`;
//! internal failures map to 500 and their detail is logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use guardian_schema::SchemaError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable summary.
    pub message: String,
    /// Cause, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// The request or its document could not be parsed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code for this error.
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(detail) => ErrorBody {
                message: "Validation error".to_string(),
                detail: Some(detail.clone()),
            },
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                ErrorBody {
                    message: "An internal error occurred".to_string(),
                    detail: None,
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Document problems are the client's; schema configuration problems are ours.
impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        if err.is_document_error() {
            Self::Validation(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<guardian_core::DocumentError> for AppError {
    fn from(err: guardian_core::DocumentError) -> Self {
        if err.is_parse_error() {
            Self::Validation(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}
