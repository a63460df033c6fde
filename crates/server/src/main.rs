mod bootstrap;
mod chat;
mod health;
mod openai;

use anyhow::Result;
use hearth_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use hearth_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let router = bootstrap::app_router(&app);

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        provider = ?app.config.llm.provider,
        "hearth-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(event_name = "system.server.stopped", "hearth-server stopped");
    Ok(())
}

async fn wait_for_shutdown() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!(event_name = "system.server.stopping", "shutdown signal received");
    }
}
