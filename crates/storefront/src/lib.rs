//! Llama Treats storefront library.
//!
//! The binary in `main.rs` only loads configuration, sets up logging and
//! serves [`router`]. Everything else lives here so the integration tests
//! can drive the same router against an in-memory bakery API.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bakery;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

use std::time::Duration;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the full application.
///
/// `checkout` is the router from [`routes::checkout_routes`], with or without
/// a rate limiter on top.
pub fn router(state: AppState, checkout: Router<AppState>) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/cart", routes::cart_routes())
        .nest("/api/favorites", routes::favorite_routes())
        .nest("/api/specials", routes::special_routes())
        .nest("/api/checkout", checkout)
        .nest("/api", routes::catalog_routes())
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::serialize_session_requests,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// The application without rate limiting, as tests use it.
pub fn app(state: AppState) -> Router {
    router(state, routes::checkout_routes())
}

/// Liveness: the process is up.
async fn health() -> &'static str {
    "ok"
}

/// Readiness: the bakery API answers.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.api().settings().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Bakery API not reachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
