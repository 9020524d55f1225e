//! # Schema Endpoint
//!
//! `GET /schema` returns the active schema in constraint (JSON Schema
//! draft-07) form, so clients can validate before submitting.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

/// Build the schema router.
pub fn router() -> Router<AppState> {
    Router::new().route("/schema", get(get_schema))
}

/// GET /schema: The active schema's constraint form.
#[utoipa::path(
    get,
    path = "/schema",
    responses(
        (status = 200, description = "Draft-07 JSON Schema of the active schema", body = Object),
    ),
    tag = "schema"
)]
pub async fn get_schema(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.schema.constraint().as_value().clone())
}
