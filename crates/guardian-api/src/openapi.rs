//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI spec served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Guardian API",
        description = "Validate YAML documents against rule-form schemas and inspect the active schema's JSON Schema form."
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        crate::routes::validate::validate_document,
        crate::routes::schema::get_schema,
    ),
    components(schemas(
        crate::routes::validate::ValidateRequest,
        crate::routes::validate::ValidationResponse,
        crate::routes::validate::ErrorItem,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "validation", description = "Document validation"),
        (name = "schema", description = "Active schema"),
    )
)]
pub struct ApiDoc;

/// Router serving the spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
