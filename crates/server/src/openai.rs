use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use futures::stream;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use crate::bootstrap::AppState;

/// Chat-completions shim for the voice platform. Only the last user message
/// is routed through the agent; session affinity comes from the `user`
/// field, so a caller that omits it gets a fresh session per request.
#[derive(Debug, Deserialize)]
pub struct CompletionsRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<IncomingMessage>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

pub async fn completions(
    State(state): State<AppState>,
    Json(request): Json<CompletionsRequest>,
) -> Response {
    let Some(message) = request
        .messages
        .iter()
        .rev()
        .find(|message| message.role == "user")
        .and_then(|message| message.content.clone())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "request carried no user message" })),
        )
            .into_response();
    };

    let session_id = request.user.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let handle = state.sessions.get_or_create(&session_id);
    let mut session = handle.lock().await;

    let reply = match state.runtime.handle_message(&mut session, &message).await {
        Ok(reply) => reply,
        Err(err) => {
            error!(event_name = "completions.agent_error", error = %err, "agent failed to reply");
            return (StatusCode::BAD_GATEWAY, Json(json!({ "error": err.to_string() })))
                .into_response();
        }
    };
    drop(session);

    let model = request.model.unwrap_or_else(|| state.model.clone());
    let completion_id = format!("chatcmpl-{}", Uuid::new_v4().simple());
    let created = Utc::now().timestamp();

    if request.stream {
        stream_response(completion_id, model, created, reply)
    } else {
        Json(json!({
            "id": completion_id,
            "object": "chat.completion",
            "created": created,
            "model": model,
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": reply },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 0, "completion_tokens": 0, "total_tokens": 0 }
        }))
        .into_response()
    }
}

/// The reply is already complete, so the "stream" is three frames and the
/// terminator, which is all the platform needs to treat us as a streaming
/// backend.
fn stream_response(completion_id: String, model: String, created: i64, reply: String) -> Response {
    let chunk = |delta: Value, finish_reason: Value| {
        json!({
            "id": &completion_id,
            "object": "chat.completion.chunk",
            "created": created,
            "model": &model,
            "choices": [{ "index": 0, "delta": delta, "finish_reason": finish_reason }]
        })
        .to_string()
    };

    let frames: Vec<Result<Event, Infallible>> = vec![
        Ok(Event::default().data(chunk(json!({ "role": "assistant", "content": "" }), Value::Null))),
        Ok(Event::default().data(chunk(json!({ "content": reply }), Value::Null))),
        Ok(Event::default().data(chunk(json!({}), json!("stop")))),
        Ok(Event::default().data("[DONE]")),
    ];

    Sse::new(stream::iter(frames)).into_response()
}

pub async fn models(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [{
            "id": state.model,
            "object": "model",
            "created": Utc::now().timestamp(),
            "owned_by": "hearth"
        }]
    }))
}
