use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub status: String,
}

/// Liveness of the console, plus whether the backend currently answers.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let backend = match state.service_context.backend.health_check().await {
        Ok(()) => "reachable",
        Err(e) => {
            tracing::warn!("Backend health check failed: {}", e);
            "unreachable"
        }
    };

    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "backend": backend,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub async fn api_info() -> impl IntoResponse {
    Json(ApiInfo {
        name: "ZeroCore Console".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Internal announcements board and employee directory".to_string(),
        status: "operational".to_string(),
    })
}
