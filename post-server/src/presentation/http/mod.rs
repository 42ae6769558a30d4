use axum::{Json, Router, routing::get};
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// Liveness surface served next to the gRPC listener.
pub(crate) fn routes() -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Serialize)]
struct HealthzResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthzResponse> {
    Json(HealthzResponse { status: "ok" })
}
