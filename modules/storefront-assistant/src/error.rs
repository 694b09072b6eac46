use ai_client::AiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// No active settings, no credential for the provider, or an
    /// undecryptable key. Triggers the provider fallback.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Non-success status or malformed body from a generation endpoint.
    #[error("Provider error: {0}")]
    Provider(AiError),

    /// Vocabulary or inventory query failed. Surfaced to the caller.
    #[error("Catalog error: {0}")]
    Catalog(#[source] anyhow::Error),
}

impl From<AiError> for AssistantError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::Config(msg) => AssistantError::ConfigurationMissing(msg),
            other => AssistantError::Provider(other),
        }
    }
}
