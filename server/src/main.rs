use std::sync::Arc;

use flowsmith_core::AiSettings;
use flowsmith_generate::LlmEngine;
use flowsmith_lib::{run, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Misconfiguration stops the server before it binds.
    let settings = AiSettings::from_env()?;
    tracing::info!(?settings, "loaded AI settings");
    let engine = LlmEngine::new(settings)?;
    let config = ServerConfig::from_env()?;

    run(config, AppState::new(Arc::new(engine))).await
}
