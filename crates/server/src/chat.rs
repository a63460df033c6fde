use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use hearth_core::CalculatorState;

use crate::bootstrap::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub state: CalculatorState,
}

/// One conversational turn. An unknown or missing session id starts a fresh
/// session; the returned id keeps the caller attached to it.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<Value>)> {
    let session_id =
        request.session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let handle = state.sessions.get_or_create(&session_id);
    let mut session = handle.lock().await;

    let reply = state.runtime.handle_message(&mut session, &request.message).await.map_err(
        |err| {
            error!(event_name = "chat.agent_error", error = %err, "agent failed to reply");
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": err.to_string() })))
        },
    )?;

    Ok(Json(ChatResponse { session_id, reply, state: session.state }))
}

/// Snapshot of a session's calculator state.
pub async fn session_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CalculatorState>, (StatusCode, Json<Value>)> {
    match state.sessions.get(&id) {
        Some(handle) => {
            let session = handle.lock().await;
            Ok(Json(session.state))
        }
        None => Err((StatusCode::NOT_FOUND, Json(json!({ "error": "session not found" })))),
    }
}
