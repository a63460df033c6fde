use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("llm request failed: {0}")]
    Llm(#[from] reqwest::Error),
    #[error("llm returned a malformed response: {0}")]
    MalformedResponse(String),
    #[error("tool loop exceeded {limit} rounds without a final answer")]
    ToolLoopExceeded { limit: usize },
    #[error("agent configuration error: {0}")]
    Configuration(String),
}
