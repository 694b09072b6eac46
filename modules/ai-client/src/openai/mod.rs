mod client;

use async_trait::async_trait;

use crate::error::AiError;
use crate::registry::ProviderKind;
use crate::traits::{Completion, CompletionRequest, TextGenerationProvider};
use crate::wire::ChatRequest;

use client::OpenAiClient;

// =============================================================================
// OpenAi Provider
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl OpenAi {
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

    pub(crate) fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key, self.http.clone());
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }
}

#[async_trait]
impl TextGenerationProvider for OpenAi {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError> {
        let wire = ChatRequest::from(request);
        let response = self.client().chat(&wire).await?;
        response.into_completion(ProviderKind::OpenAi, &request.params.model)
    }
}
