//! # Validation Endpoint
//!
//! `POST /validate` parses the submitted YAML text and runs the configured
//! validation modes against the active schema. A document that fails
//! validation is a 400 with the error list; text that cannot be parsed is a
//! 422 from [`AppError`].

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use guardian_core::{parse_document, DocumentFormat};
use guardian_schema::{ErrorEntry, ValidationOutcome};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Request body for `POST /validate`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateRequest {
    /// YAML (or JSON) document text.
    pub yaml_content: String,
}

/// One validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorItem {
    /// Dotted path of the offending field, `(root)` for the document itself.
    pub field_path: String,
    /// Human-readable message.
    pub message: String,
}

impl From<&ErrorEntry> for ErrorItem {
    fn from(entry: &ErrorEntry) -> Self {
        Self {
            field_path: entry.field_path.clone(),
            message: entry.message.clone(),
        }
    }
}

/// Response body for `POST /validate`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationResponse {
    pub message: String,
    /// Present only when validation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorItem>>,
}

/// Build the validation router.
pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_document))
}

/// POST /validate: Validate a document against the active schema.
#[utoipa::path(
    post,
    path = "/validate",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Document is valid", body = ValidationResponse),
        (status = 400, description = "Document failed validation", body = ValidationResponse),
        (status = 422, description = "Request or document could not be parsed", body = crate::error::ErrorBody),
        (status = 500, description = "Internal error", body = crate::error::ErrorBody),
    ),
    tag = "validation"
)]
pub async fn validate_document(
    State(state): State<AppState>,
    body: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ValidationResponse>), AppError> {
    let req = extract_json(body)?;
    let data = parse_document(&req.yaml_content, DocumentFormat::Yaml)?;

    match state.ctx.validate(&state.schema, &data)? {
        ValidationOutcome::Passed => Ok((
            StatusCode::OK,
            Json(ValidationResponse {
                message: "Validation successful".to_string(),
                errors: None,
            }),
        )),
        ValidationOutcome::Failed { mode, report } => {
            tracing::info!(schema = state.schema.name(), %mode, errors = report.len(), "validation failed");
            Ok((
                StatusCode::BAD_REQUEST,
                Json(ValidationResponse {
                    message: "Validation failed".to_string(),
                    errors: Some(report.errors().iter().map(ErrorItem::from).collect()),
                }),
            ))
        }
    }
}
