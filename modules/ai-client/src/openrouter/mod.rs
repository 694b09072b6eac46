mod client;

use async_trait::async_trait;

use crate::error::AiError;
use crate::registry::ProviderKind;
use crate::traits::{Completion, CompletionRequest, TextGenerationProvider};
use crate::wire::ChatRequest;

use client::OpenRouterClient;

// =============================================================================
// OpenRouter Provider
// =============================================================================

#[derive(Clone)]
pub struct OpenRouter {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl OpenRouter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub(crate) fn client(&self) -> OpenRouterClient {
        let client = OpenRouterClient::new(&self.api_key, self.http.clone());
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }
}

#[async_trait]
impl TextGenerationProvider for OpenRouter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError> {
        let wire = ChatRequest::from(request);
        let response = self.client().chat(&wire).await?;
        response.into_completion(ProviderKind::OpenRouter, &request.params.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openrouter_new() {
        let or = OpenRouter::new("or-test", "deepseek/deepseek-chat");
        assert_eq!(or.model, "deepseek/deepseek-chat");
        assert_eq!(or.api_key, "or-test");
    }

    #[test]
    fn test_openrouter_with_base_url() {
        let or = OpenRouter::new("or-test", "deepseek/deepseek-chat")
            .with_base_url("https://proxy.example.com/v1");
        assert_eq!(or.base_url, Some("https://proxy.example.com/v1".to_string()));
    }
}
