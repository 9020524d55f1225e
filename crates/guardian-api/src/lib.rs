//! # guardian-api: Axum Validation Service
//!
//! Serves the validation engine over HTTP. The active schema is loaded once
//! at start-up and shared read-only across requests.
//!
//! ## API Surface
//!
//! | Route                  | Module                  | Purpose                     |
//! |------------------------|-------------------------|-----------------------------|
//! | `POST /validate`       | [`routes::validate`]    | Validate a YAML document    |
//! | `GET /schema`          | [`routes::schema`]      | Active schema, JSON Schema  |
//! | `GET /openapi.json`    | [`openapi`]             | OpenAPI spec                |
//! | `GET /health/*`        | this module             | Liveness and readiness      |

pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::validate::router())
        .merge(routes::schema::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. [`AppState`] only exists once the active schema has
/// loaded and compiled, so a serving process is ready.
async fn readiness() -> &'static str {
    "ready"
}
