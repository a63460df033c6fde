use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::bootstrap::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub sessions: HealthCheck,
    pub checked_at: String,
}

/// Readiness probe. The engine is pure and the agent holds no connections,
/// so the service is ready as soon as it is serving.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "hearth-server runtime initialized".to_string(),
        },
        sessions: HealthCheck {
            status: "ready",
            detail: format!("{} active sessions", state.sessions.len()),
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
