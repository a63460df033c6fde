use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::AgentError;

/// One message in the chat-completions wire format. The same shape is used
/// for requests and responses, so optional fields stay optional throughout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain("assistant", content)
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

/// `arguments` is a JSON document encoded as a string, as the wire format
/// demands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One round trip: the full conversation so far plus the available tool
    /// specs, returning the assistant's next message (which may carry tool
    /// calls instead of content).
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ChatMessage, AgentError>;
}

pub struct OpenAiChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    max_retries: u32,
}

impl OpenAiChatClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        model: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AgentError::Llm)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url, api_key, model: model.into(), max_retries })
    }

    async fn request_once(
        &self,
        url: &str,
        request: &ChatRequest<'_>,
    ) -> Result<ChatMessage, AgentError> {
        let mut builder = self.http.post(url).json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await?.error_for_status()?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| AgentError::MalformedResponse(err.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::MalformedResponse("response carried no choices".to_string()))
    }
}

/// Timeouts, connection failures, rate limits and server errors are worth
/// another attempt; anything else (auth, bad request, malformed body) is
/// deterministic and retrying would only repeat it.
fn is_transient(error: &AgentError) -> bool {
    match error {
        AgentError::Llm(source) => {
            source.is_timeout()
                || source.is_connect()
                || source.status().is_some_and(retryable_status)
        }
        _ => false,
    }
}

fn retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(250 * u64::from(attempt))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [Value],
}

fn no_tools(tools: &&[Value]) -> bool {
    tools.is_empty()
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ChatMessage, AgentError> {
        let request = ChatRequest { model: &self.model, messages, tools };
        let url = format!("{}/chat/completions", self.base_url);

        let mut attempt = 0u32;
        loop {
            match self.request_once(&url, &request).await {
                Ok(message) => return Ok(message),
                Err(error) if attempt < self.max_retries && is_transient(&error) => {
                    attempt += 1;
                    warn!(
                        event_name = "llm_retry",
                        attempt,
                        max_retries = self.max_retries,
                        error = %error,
                        "transient chat-completions failure, retrying"
                    );
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;

    use crate::errors::AgentError;

    use super::{is_transient, retry_delay, retryable_status, ChatMessage, FunctionCall, ToolCall};

    #[test]
    fn plain_messages_omit_tool_fields_on_the_wire() {
        let message = ChatMessage::user("How much stamp duty on £300,000?");
        let json = serde_json::to_value(&message).expect("serializable");
        let object = json.as_object().expect("object");
        assert_eq!(object["role"], "user");
        assert!(!object.contains_key("tool_calls"));
        assert!(!object.contains_key("tool_call_id"));
    }

    #[test]
    fn tool_results_carry_the_call_id() {
        let message = ChatMessage::tool_result("call_1", r#"{"stamp_duty":2500.0}"#);
        assert_eq!(message.role, "tool");
        assert_eq!(message.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn only_rate_limits_and_server_errors_are_retryable_statuses() {
        assert!(retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!retryable_status(StatusCode::BAD_REQUEST));
        assert!(!retryable_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn malformed_responses_are_never_retried() {
        let error = AgentError::MalformedResponse("response carried no choices".to_string());
        assert!(!is_transient(&error));
        let error = AgentError::Configuration("missing key".to_string());
        assert!(!is_transient(&error));
    }

    #[test]
    fn retry_delay_backs_off_linearly() {
        assert_eq!(retry_delay(1), Duration::from_millis(250));
        assert_eq!(retry_delay(2), Duration::from_millis(500));
        assert!(retry_delay(3) > retry_delay(2));
    }

    #[test]
    fn assistant_tool_calls_round_trip() {
        let raw = r#"{
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "calculate_mortgage", "arguments": "{\"principal\": 300000}"}
            }]
        }"#;
        let message: ChatMessage = serde_json::from_str(raw).expect("parseable");
        assert_eq!(message.content, None);
        let calls = message.tool_calls.expect("tool calls present");
        assert_eq!(
            calls[0],
            ToolCall {
                id: "call_1".to_string(),
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: "calculate_mortgage".to_string(),
                    arguments: "{\"principal\": 300000}".to_string(),
                },
            }
        );
    }
}
