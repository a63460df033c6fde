use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::info;

use hearth_agent::{AgentError, AgentRuntime, SessionStore};
use hearth_core::config::{AppConfig, ConfigError, LoadOptions};

use crate::{chat, health, openai};

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AgentRuntime>,
    pub sessions: SessionStore,
}

/// Shared handler state. Everything in here is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<AgentRuntime>,
    pub sessions: SessionStore,
    pub model: String,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("agent runtime construction failed: {0}")]
    Agent(#[from] AgentError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let runtime = Arc::new(AgentRuntime::from_config(&config.llm)?);
    info!(
        event_name = "system.bootstrap.agent_ready",
        provider = ?config.llm.provider,
        "agent runtime constructed"
    );

    Ok(Application { config, runtime, sessions: SessionStore::new() })
}

/// The full HTTP surface. CORS is permissive: the browser calculators and
/// the voice platform call this API from arbitrary origins.
pub fn app_router(app: &Application) -> Router {
    let state = AppState {
        runtime: app.runtime.clone(),
        sessions: app.sessions.clone(),
        model: app.config.llm.model.clone(),
    };

    Router::new()
        .route("/api/chat", post(chat::chat))
        .route("/api/session/{id}", get(chat::session_state))
        .route("/v1/chat/completions", post(openai::completions))
        .route("/v1/models", get(openai::models))
        .route("/health", get(health::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
