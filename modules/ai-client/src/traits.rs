use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::registry::ProviderKind;

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(AiError::Parse(format!("unknown message role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Completion Request / Response
// =============================================================================

/// Sampling settings for a single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Provider-agnostic request: system prompt, prior turns, then the user message.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub history: Vec<Message>,
    pub user: String,
    pub params: CompletionParams,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, params: CompletionParams) -> Self {
        Self {
            system: system.into(),
            history: Vec::new(),
            user: user.into(),
            params,
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    /// Full message list in send order: system, history, user.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Message::system(&self.system));
        messages.extend(self.history.iter().cloned());
        messages.push(Message::user(&self.user));
        messages
    }
}

/// Normalized provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub tokens_used: Option<u32>,
    pub provider: ProviderKind,
    pub model: String,
}

// =============================================================================
// TextGenerationProvider Trait
// =============================================================================

#[async_trait]
pub trait TextGenerationProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;

    /// Send one non-streaming chat completion. Non-success statuses and
    /// responses without content are errors.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CompletionParams {
        CompletionParams {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.4,
            max_tokens: 512,
        }
    }

    #[test]
    fn messages_are_ordered_system_history_user() {
        let request = CompletionRequest::new("be brief", "hola", params()).with_history(vec![
            Message::user("antes"),
            Message::assistant("respuesta"),
        ]);

        let roles: Vec<MessageRole> = request.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
        assert_eq!(request.messages().last().unwrap().content, "hola");
    }

    #[test]
    fn role_parses_from_stored_string() {
        assert_eq!("assistant".parse::<MessageRole>().unwrap(), MessageRole::Assistant);
        assert!("tool".parse::<MessageRole>().is_err());
    }
}
