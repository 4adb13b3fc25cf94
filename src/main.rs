use std::sync::Arc;

use anyhow::Context;
use scam_guard::config::AppConfig;
use scam_guard::llm::ProviderManager;
use scam_guard::server::{AppState, app_router};
use scam_guard::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.database_path)
            .await
            .context("failed to open database")?,
    );

    let providers = Arc::new(ProviderManager::from_settings(
        &config.ai,
        reqwest::Client::new(),
    ));
    let provider = providers.provider_name().await;
    if !providers.is_configured().await {
        tracing::warn!("No usable AI provider; analysis requests will fail until one is configured");
    }

    let app = app_router(AppState::new(db, providers));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    eprintln!("🛡️  Scam Guard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Provider: {provider}");
    eprintln!("   Database: {}", config.database_path.display());
    eprintln!("   API: http://{}/api/analyze", config.bind_addr);

    tracing::info!(addr = %config.bind_addr, provider = %provider, "Server started");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
