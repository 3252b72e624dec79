//! HTTP route modules and router assembly.

pub mod contact;
pub mod health;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Maximum submissions processed at once; each may hold an outbound call
/// open for the full relay timeout.
const MAX_CONCURRENT_SUBMISSIONS: usize = 64;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let contact_routes = contact::router().layer(tower::limit::ConcurrencyLimitLayer::new(
        MAX_CONCURRENT_SUBMISSIONS,
    ));

    Router::new()
        .merge(contact_routes)
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
