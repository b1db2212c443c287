use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub documents: usize,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    match state.retrieval.store().len().await {
        Ok(documents) => Ok(Json(ReadinessResponse {
            status: "ready".into(),
            documents,
        })),
        Err(e) => {
            tracing::error!(error = %e, "store unavailable");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
