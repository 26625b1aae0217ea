//! HTTP surface: `/health`, `/ready`, `/metrics`, `/predict`.

use crate::application::PredictionService;
use crate::domain::errors::ServiceError;
use crate::infrastructure::observability::metrics::CONTENT_TYPE;
use anyhow::Result;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared request-handler state
pub type AppState = Arc<PredictionService>;

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .route("/predict", post(predict_handler))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

/// Serves until `shutdown` resolves.
pub async fn serve<F>(service: AppState, addr: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        addr = %listener.local_addr()?,
        ready = service.is_ready(),
        "Prediction server listening"
    );

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Liveness: answers as long as the process runs, model or not.
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn ready_handler(State(service): State<AppState>) -> Response {
    match service.model_info() {
        Some((name, version)) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "model": name, "version": version })),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready" })),
        )
            .into_response(),
    }
}

async fn metrics_handler(State(service): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        service.metrics().render(),
    )
        .into_response()
}

async fn predict_handler(
    State(service): State<AppState>,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let result = service.handle_predict_body(&body).await?;
    Ok(Json(result).into_response())
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
