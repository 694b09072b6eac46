//! Generation client: resolve the active provider from the settings record,
//! send the grounded prompt, and run the one-shot cross-provider fallback.

use std::sync::Arc;

use ai_client::{
    build_provider, last_turns, AiError, Completion, CompletionParams, CompletionRequest, Message,
    ProviderKind, TextGenerationProvider,
};
use tracing::{debug, info};

use storefront_core::{AppConfig, AssistantDefaults, AssistantSettings, KeyCipher};

use crate::error::AssistantError;

/// Prior turns sent with each primary request.
pub const HISTORY_TURNS: usize = 8;

/// Returned when both the primary and the fallback provider fail.
pub const EMERGENCY_APOLOGY: &str = "Lo siento, en este momento no puedo procesar tu consulta. \
     Por favor intenta de nuevo en unos minutos o contacta a nuestro equipo de atención.";

/// System prompt for the fallback attempt. Carries no inventory, so it must
/// not let the model describe products.
const FALLBACK_SYSTEM_PROMPT: &str = "Eres el asistente de compras de una tienda en línea y \
     respondes en español. No tienes acceso al inventario en este momento: no menciones \
     productos, precios ni disponibilidad. Responde brevemente y sugiere al cliente que \
     repita su consulta en unos minutos.";

/// Builds providers. Swapped for a recording fake in tests.
pub trait ProviderFactory: Send + Sync {
    fn build(
        &self,
        kind: ProviderKind,
        api_key: &str,
        model: &str,
    ) -> Result<Arc<dyn TextGenerationProvider>, AiError>;
}

/// Real HTTP providers from the `ai_client` registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProviderFactory;

impl ProviderFactory for HttpProviderFactory {
    fn build(
        &self,
        kind: ProviderKind,
        api_key: &str,
        model: &str,
    ) -> Result<Arc<dyn TextGenerationProvider>, AiError> {
        build_provider(kind, api_key, model)
    }
}

/// Environment-level default credentials, used only by the fallback.
#[derive(Debug, Clone, Default)]
pub struct FallbackCredentials {
    pub openai: Option<String>,
    pub openrouter: Option<String>,
}

impl FallbackCredentials {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            openai: config.env_api_key(ProviderKind::OpenAi).map(str::to_string),
            openrouter: config.env_api_key(ProviderKind::OpenRouter).map(str::to_string),
        }
    }

    pub fn for_kind(&self, kind: ProviderKind) -> Option<&str> {
        let key = match kind {
            ProviderKind::OpenAi => self.openai.as_deref(),
            ProviderKind::OpenRouter => self.openrouter.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }
}

pub struct GenerationClient {
    factory: Arc<dyn ProviderFactory>,
    cipher: Option<KeyCipher>,
    fallback: FallbackCredentials,
    defaults: AssistantDefaults,
}

impl GenerationClient {
    pub fn new(
        factory: Arc<dyn ProviderFactory>,
        cipher: Option<KeyCipher>,
        fallback: FallbackCredentials,
        defaults: AssistantDefaults,
    ) -> Self {
        Self {
            factory,
            cipher,
            fallback,
            defaults,
        }
    }

    /// Provider the primary attempt targets: the settings record's, or the
    /// configured default when no record is active.
    pub fn primary_kind(&self, settings: Option<&AssistantSettings>) -> ProviderKind {
        settings
            .map(|s| s.provider)
            .unwrap_or(self.defaults.default_provider)
    }

    /// Primary attempt with the active settings record. The stored key is
    /// decrypted here and nowhere else.
    pub async fn generate(
        &self,
        settings: Option<&AssistantSettings>,
        system: &str,
        history: &[Message],
        user: &str,
    ) -> Result<Completion, AssistantError> {
        let settings = settings.ok_or_else(|| {
            AssistantError::ConfigurationMissing("no active assistant settings".into())
        })?;
        let api_key = self.decrypt_key(settings)?;

        let model = if settings.model_name.trim().is_empty() {
            self.defaults.model_for(settings.provider)
        } else {
            settings.model_name.as_str()
        };
        let provider = self.factory.build(settings.provider, &api_key, model)?;

        let request = CompletionRequest::new(
            system,
            user,
            CompletionParams {
                model: model.to_string(),
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
            },
        )
        .with_history(last_turns(history, HISTORY_TURNS));

        debug!(
            provider = %settings.provider,
            model,
            history = request.history.len(),
            "Sending primary completion"
        );
        Ok(provider.complete(&request).await?)
    }

    /// One attempt against the provider that did not fail, with env
    /// credentials, environment defaults, no inventory and no history.
    pub async fn generate_fallback(
        &self,
        failed: ProviderKind,
        user: &str,
    ) -> Result<Completion, AssistantError> {
        let kind = failed.alternate();
        let api_key = self.fallback.for_kind(kind).ok_or_else(|| {
            AssistantError::ConfigurationMissing(format!(
                "{} is not set for fallback provider {kind}",
                kind.api_key_env()
            ))
        })?;
        let model = self.defaults.model_for(kind);
        let provider = self.factory.build(kind, api_key, model)?;

        let request = CompletionRequest::new(
            FALLBACK_SYSTEM_PROMPT,
            user,
            CompletionParams {
                model: model.to_string(),
                temperature: self.defaults.temperature,
                max_tokens: self.defaults.max_tokens,
            },
        );

        info!(failed = %failed, fallback = %kind, "Falling back to alternate provider");
        Ok(provider.complete(&request).await?)
    }

    fn decrypt_key(&self, settings: &AssistantSettings) -> Result<String, AssistantError> {
        let stored = settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AssistantError::ConfigurationMissing(format!(
                    "no API key stored for {}",
                    settings.provider
                ))
            })?;
        let cipher = self.cipher.as_ref().ok_or_else(|| {
            AssistantError::ConfigurationMissing("ASSISTANT_ENCRYPTION_KEY is not set".into())
        })?;
        cipher.decrypt(stored).map_err(|e| {
            AssistantError::ConfigurationMissing(format!(
                "stored API key for {} is unreadable: {e}",
                settings.provider
            ))
        })
    }
}
