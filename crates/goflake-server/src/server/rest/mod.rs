//! HTTP transport, selected with `SERVER_TYPE=rest`.
//!
//! Handlers live in [`handler`]; failures are rendered by
//! [`ApiError`](crate::server::error::ApiError).

pub mod handler;

use crate::server::state::AppState;
use axum::{Router, routing::get};
use handler::{decompose, health, next_uuid};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Builds the application router:
///
/// - `GET /v1/uuid`
/// - `GET|POST /v1/decompose/{uuid}`
/// - `GET /health`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/uuid", get(next_uuid))
        .route("/v1/decompose/{uuid}", get(decompose).post(decompose))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
