use crate::infra::{AppState, MemoryPortalState};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use nomination_portal::workflows::nomination::{portal_router, MemoryBlobStore};
use serde_json::json;
use std::sync::Arc;

/// Path the in-memory bucket is served from; matches the default storage base URL.
pub(crate) const STORAGE_ROUTE: &str = "/storage/v1/object/public/tops-uploads/:object_name";

pub(crate) fn with_portal_routes(state: MemoryPortalState) -> axum::Router {
    portal_router(state)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(STORAGE_ROUTE, axum::routing::get(stored_object_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn stored_object_endpoint(
    Extension(blobs): Extension<Arc<MemoryBlobStore>>,
    Path(object_name): Path<String>,
) -> Response {
    match blobs.read(&object_name) {
        Some(object) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, object.content_type),
                (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            ],
            object.bytes,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "file not found" })),
        )
            .into_response(),
    }
}
