//! OpenAI-compatible chat-completion wire types, shared by every provider
//! that speaks the `/chat/completions` dialect.

use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::registry::ProviderKind;
use crate::traits::{Completion, CompletionRequest, Message, MessageRole};

// =============================================================================
// Chat Request
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: Some(message.content.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

impl From<&CompletionRequest> for ChatRequest {
    fn from(request: &CompletionRequest) -> Self {
        Self {
            model: request.params.model.clone(),
            messages: request.messages().iter().map(WireMessage::from).collect(),
            temperature: request.params.temperature,
            max_tokens: request.params.max_tokens,
            stream: false,
        }
    }
}

// =============================================================================
// Chat Response
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Choice {
    pub message: WireMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Usage {
    pub total_tokens: u32,
}

impl ChatResponse {
    /// Normalize to a [`Completion`]. A missing or blank first choice is a parse error.
    pub fn into_completion(
        self,
        provider: ProviderKind,
        requested_model: &str,
    ) -> Result<Completion, AiError> {
        let tokens_used = self.usage.map(|u| u.total_tokens);
        let model = self.model.unwrap_or_else(|| requested_model.to_string());

        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AiError::Parse(format!("No response content from {provider}")))?;

        Ok(Completion {
            content,
            tokens_used,
            provider,
            model,
        })
    }
}
