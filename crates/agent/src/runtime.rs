use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use hearth_core::config::{LlmConfig, LlmProvider};

use crate::conversation::IntentExtractor;
use crate::errors::AgentError;
use crate::llm::{ChatMessage, LlmClient, OpenAiChatClient};
use crate::render::render_reply;
use crate::session::Session;
use crate::tools::ToolRegistry;

pub const SYSTEM_PROMPT: &str = "You are a UK mortgage calculator assistant.\n\
\n\
Your role is to help homebuyers:\n\
1. Calculate monthly mortgage payments\n\
2. Calculate UK stamp duty land tax\n\
3. Compare different mortgage scenarios\n\
4. Explain mortgage concepts clearly\n\
\n\
IMPORTANT RULES:\n\
- Always use the appropriate tools to perform calculations\n\
- Never estimate or guess - use the calculator tools\n\
- Provide clear explanations with the results\n\
- Use British English and UK-specific terminology\n\
- All amounts are in GBP (£)\n\
- Interest rates are annual percentages\n\
\n\
When users ask about mortgages, proactively offer to calculate payments.\n\
When users mention property values, offer to calculate stamp duty.";

/// Upper bound on assistant/tool round trips for one user message. A
/// well-behaved exchange needs one or two.
pub const MAX_TOOL_ROUNDS: usize = 4;

pub struct AgentRuntime {
    llm: Option<Box<dyn LlmClient>>,
    tools: ToolRegistry,
    extractor: IntentExtractor,
}

impl AgentRuntime {
    /// Builds the runtime for the configured provider. `scripted` carries no
    /// client and answers through the deterministic extractor.
    pub fn from_config(config: &LlmConfig) -> Result<Self, AgentError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let llm: Option<Box<dyn LlmClient>> = match config.provider {
            LlmProvider::OpenAi => {
                let base_url = config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| OpenAiChatClient::DEFAULT_BASE_URL.to_string());
                Some(Box::new(OpenAiChatClient::new(
                    base_url,
                    config.api_key.clone(),
                    config.model.clone(),
                    timeout,
                    config.max_retries,
                )?))
            }
            LlmProvider::Ollama => {
                let base_url = config.base_url.clone().ok_or_else(|| {
                    AgentError::Configuration(
                        "ollama provider requires llm.base_url".to_string(),
                    )
                })?;
                // Ollama exposes an OpenAI-compatible surface under /v1.
                let base_url = format!("{}/v1", base_url.trim_end_matches('/'));
                Some(Box::new(OpenAiChatClient::new(
                    base_url,
                    None,
                    config.model.clone(),
                    timeout,
                    config.max_retries,
                )?))
            }
            LlmProvider::Scripted => None,
        };

        Ok(Self { llm, tools: ToolRegistry::with_default_tools(), extractor: IntentExtractor::new() })
    }

    /// Scripted runtime with the given tools, for tests and offline use.
    pub fn scripted() -> Self {
        Self { llm: None, tools: ToolRegistry::with_default_tools(), extractor: IntentExtractor::new() }
    }

    pub fn with_llm(llm: Box<dyn LlmClient>) -> Self {
        Self {
            llm: Some(llm),
            tools: ToolRegistry::with_default_tools(),
            extractor: IntentExtractor::new(),
        }
    }

    /// Handles one user message, mutating the session's state and history.
    pub async fn handle_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<String, AgentError> {
        let reply = match &self.llm {
            Some(llm) => self.run_tool_loop(llm.as_ref(), session, text).await?,
            None => self.run_scripted(session, text),
        };

        session.history.push(ChatMessage::user(text));
        session.history.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    fn run_scripted(&self, session: &mut Session, text: &str) -> String {
        let intent = self.extractor.extract(text);
        debug!(
            event_name = "intent_extracted",
            topic = ?intent.topic,
            confidence = intent.confidence_score,
            "scripted intent extraction"
        );

        match intent.to_invocation(&session.state) {
            Some(invocation) => {
                let result =
                    self.tools.dispatch(invocation.tool, &mut session.state, invocation.arguments);
                render_reply(invocation.tool, &result)
            }
            None => intent.clarification_prompt.unwrap_or_else(|| {
                "Could you share a few more details, such as the loan amount, rate, or term?"
                    .to_string()
            }),
        }
    }

    async fn run_tool_loop(
        &self,
        llm: &dyn LlmClient,
        session: &mut Session,
        text: &str,
    ) -> Result<String, AgentError> {
        let specs = self.tools.specs();

        let mut messages = Vec::with_capacity(session.history.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(session.history.iter().cloned());
        messages.push(ChatMessage::user(text));

        for round in 0..MAX_TOOL_ROUNDS {
            let assistant = llm.chat(&messages, &specs).await?;

            let Some(tool_calls) = assistant.tool_calls.clone().filter(|calls| !calls.is_empty())
            else {
                return assistant.content.ok_or_else(|| {
                    AgentError::MalformedResponse(
                        "assistant message carried neither content nor tool calls".to_string(),
                    )
                });
            };

            debug!(
                event_name = "tool_round",
                round,
                calls = tool_calls.len(),
                "assistant requested tool calls"
            );
            messages.push(assistant);

            for call in tool_calls {
                let arguments: Value =
                    serde_json::from_str(&call.function.arguments).unwrap_or_else(|err| {
                        warn!(
                            event_name = "malformed_tool_arguments",
                            tool = %call.function.name,
                            error = %err,
                            "model sent unparseable tool arguments"
                        );
                        Value::Object(Default::default())
                    });
                let result =
                    self.tools.dispatch(&call.function.name, &mut session.state, arguments);
                messages.push(ChatMessage::tool_result(call.id, result.to_string()));
            }
        }

        Err(AgentError::ToolLoopExceeded { limit: MAX_TOOL_ROUNDS })
    }
}
