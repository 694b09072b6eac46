use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use storefront_assistant::store::{PgCatalogStore, PgConversationStore, PgSettingsStore};
use storefront_assistant::{
    Assistant, FallbackCredentials, GenerationClient, HttpProviderFactory,
};
use storefront_core::{AppConfig, KeyCipher};
use storefront_server::{build_router, AppState};

#[derive(Parser)]
#[command(name = "storefront-server", about = "Storefront shopping assistant server")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, default_value = "./config/storefront.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting storefront-server");

    let cli = Cli::parse();
    let config_path = cli.config.canonicalize().with_context(|| {
        format!(
            "Config file not found: {}. Create one or specify --config <path>",
            cli.config.display()
        )
    })?;
    tracing::info!(config = %config_path.display(), "Loading config");

    let file_config = storefront_core::file_config::load_config(&config_path)?;
    let config = AppConfig::from_env()?;

    let cipher = config
        .encryption_key
        .as_deref()
        .map(KeyCipher::from_base64_key)
        .transpose()
        .context("ASSISTANT_ENCRYPTION_KEY must be a base64-encoded 32-byte key")?;
    if cipher.is_none() {
        tracing::warn!("ASSISTANT_ENCRYPTION_KEY not set; stored provider keys cannot be used");
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Migrations complete");

    let settings = Arc::new(PgSettingsStore::new(pool.clone()));
    let generation = GenerationClient::new(
        Arc::new(HttpProviderFactory),
        cipher.clone(),
        FallbackCredentials::from_app_config(&config),
        file_config.assistant.clone(),
    );
    let assistant = Arc::new(Assistant::new(
        Arc::new(PgCatalogStore::new(pool.clone())),
        settings.clone(),
        generation,
    ));

    let state = AppState {
        assistant,
        conversations: Arc::new(PgConversationStore::new(pool)),
        settings,
        cipher,
    };
    let app = build_router(state, &file_config.server.allowed_origins);

    let addr = format!("0.0.0.0:{}", file_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
