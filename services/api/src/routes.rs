use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use placement_portal::portal::repository::PortalStore;
use placement_portal::portal::{portal_router, IdentityProvider, PlacementPortal};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Portal API plus the health, readiness and metrics endpoints.
pub(crate) fn with_operational_routes<S, P>(portal: Arc<PlacementPortal<S, P>>) -> Router
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    portal_router(portal)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Acquire) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
