use ai_client::ProviderKind;
use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Contains only secrets and env-specific values; server and assistant
/// defaults live in the TOML FileConfig.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database
    pub database_url: String,

    // Environment-level provider credentials (fallback path)
    pub openai_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,

    // Base64 AES-256 key for stored provider credentials
    pub encryption_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            openai_api_key: non_empty_env(ProviderKind::OpenAi.api_key_env()),
            openrouter_api_key: non_empty_env(ProviderKind::OpenRouter.api_key_env()),
            encryption_key: non_empty_env("ASSISTANT_ENCRYPTION_KEY"),
        };

        config.log_keys();
        Ok(config)
    }

    /// Default credential for a provider, from the environment.
    pub fn env_api_key(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::OpenRouter => self.openrouter_api_key.as_deref(),
        }
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let n = v.char_indices().nth(5).map(|(i, _)| i).unwrap_or(v.len());
                    format!("{}...({} chars)", &v[..n], v.len())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  OPENAI_API_KEY: {}", preview_opt(&self.openai_api_key));
        tracing::info!("  OPENROUTER_API_KEY: {}", preview_opt(&self.openrouter_api_key));
        tracing::info!(
            "  ASSISTANT_ENCRYPTION_KEY: {}",
            if self.encryption_key.is_some() { "<set>" } else { "<not set>" }
        );
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
