use ai_client::ProviderKind;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// TOML-backed configuration loaded from disk.
/// Secrets (API keys, DB URL, encryption key) stay as env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub assistant: AssistantDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Environment-level generation defaults. Used by the cross-provider
/// fallback and whenever no settings record is active.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantDefaults {
    #[serde(default = "default_provider")]
    pub default_provider: ProviderKind,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_openrouter_model")]
    pub openrouter_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AssistantDefaults {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            openai_model: default_openai_model(),
            openrouter_model: default_openrouter_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl AssistantDefaults {
    pub fn model_for(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::OpenAi => &self.openai_model,
            ProviderKind::OpenRouter => &self.openrouter_model,
        }
    }
}

fn default_provider() -> ProviderKind {
    ProviderKind::OpenAi
}
fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_openrouter_model() -> String {
    "deepseek/deepseek-chat".to_string()
}
fn default_max_tokens() -> u32 {
    600
}
fn default_temperature() -> f32 {
    0.4
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_config(content: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(content)?;

    if !(0.0..=2.0).contains(&config.assistant.temperature) {
        anyhow::bail!("assistant.temperature must be in [0.0, 2.0]");
    }
    if config.assistant.max_tokens == 0 {
        anyhow::bail!("assistant.max_tokens must be > 0");
    }

    Ok(config)
}
