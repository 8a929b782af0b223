use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::auth::{require_admin, require_tenant};
use crate::metrics::encode_metrics;
use crate::repo::ADMINS;
use crate::state::AppState;
use crate::store::Query;

pub mod admin;
pub mod auth;
pub mod tenant;

/// Build the full HTTP surface.
///
/// `/api/auth` is public, `/api/admin` needs an admin session and
/// `/api/tenant` a tenant session.
pub fn router(state: Arc<AppState>) -> Router {
    let admin = admin::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_admin,
    ));
    let tenant = tenant::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_tenant,
    ));

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/auth", auth::router())
        .nest("/api/admin", admin)
        .nest("/api/tenant", tenant)
        .fallback(fallback_404)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "no such route", "code": "not_found" })),
    )
}

/// Ready once the store answers a trivial count.
async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.repo.store().count(ADMINS, &Query::new()).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable")
        }
    }
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
