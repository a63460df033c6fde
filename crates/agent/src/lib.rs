//! Agent runtime - conversational orchestration over the calculation engine
//!
//! This crate is the "brain" between the HTTP layer and `hearth-core`:
//! - Extracts structured intent from natural language (chat messages)
//! - Dispatches tool calls into the deterministic engine
//! - Talks to an OpenAI-compatible chat-completions API when configured
//! - Renders structured results back into reply text
//!
//! # Architecture
//!
//! The agent follows a constrained loop:
//! 1. **Intent Extraction** (`conversation`) - Parse NL into a tool invocation
//! 2. **Tool Execution** (`tools`) - Call engine operations, update session state
//! 3. **Response Generation** (`render`) - Format results as British-English text
//!
//! With an LLM provider configured, steps 1 and 3 are delegated to the model
//! through a bounded tool-call loop (`runtime`). In `scripted` mode the
//! deterministic extractor and renderer stand in, which is also the test seam.
//!
//! # Safety Principle
//!
//! The LLM is strictly a translator. It NEVER computes payments, tax, or
//! affordability figures. Those are deterministic decisions made by the
//! engine in `hearth-core`.

pub mod conversation;
pub mod errors;
pub mod llm;
pub mod render;
pub mod runtime;
pub mod session;
pub mod tools;

pub use errors::AgentError;
pub use llm::{ChatMessage, LlmClient, OpenAiChatClient};
pub use runtime::AgentRuntime;
pub use session::{Session, SessionStore};
pub use tools::{Tool, ToolRegistry};
