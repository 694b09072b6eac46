use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::openai::OpenAi;
use crate::openrouter::OpenRouter;
use crate::traits::TextGenerationProvider;

/// Supported chat-completion providers, selected by their string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openrouter")]
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::OpenRouter];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    /// The other supported provider, used for the one-shot fallback.
    pub fn alternate(&self) -> ProviderKind {
        match self {
            ProviderKind::OpenAi => ProviderKind::OpenRouter,
            ProviderKind::OpenRouter => ProviderKind::OpenAi,
        }
    }

    /// Environment variable holding this provider's default credential.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            other => Err(AiError::Config(format!(
                "Unknown provider '{other}'. Must be openai or openrouter."
            ))),
        }
    }
}

/// Construct the concrete provider for `kind`.
pub fn build_provider(
    kind: ProviderKind,
    api_key: impl Into<String>,
    model: impl Into<String>,
) -> Result<Arc<dyn TextGenerationProvider>, AiError> {
    let api_key = api_key.into();
    if api_key.trim().is_empty() {
        return Err(AiError::Config(format!("No API key for provider {kind}")));
    }

    Ok(match kind {
        ProviderKind::OpenAi => Arc::new(OpenAi::new(api_key, model)),
        ProviderKind::OpenRouter => Arc::new(OpenRouter::new(api_key, model)),
    })
}
