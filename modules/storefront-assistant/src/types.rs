use ai_client::Message;
use serde::{Deserialize, Serialize};

/// One incoming chat message. Not persisted by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub text: String,
    pub session_id: String,
    /// The session already has turns; suppresses repeated greetings.
    #[serde(default)]
    pub has_prior_turns: bool,
}

impl UserMessage {
    pub fn new(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
            has_prior_turns: false,
        }
    }

    pub fn with_prior_turns(mut self, has_prior_turns: bool) -> Self {
        self.has_prior_turns = has_prior_turns;
        self
    }
}

/// Explicit shopper context supplied by the caller alongside the message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    pub budget: Option<f64>,
    pub intended_use: Option<String>,
    pub brand_preference: Option<String>,
    /// Prior turns, oldest first. Trimmed before generation.
    #[serde(default)]
    pub history: Vec<Message>,
}

impl QueryContext {
    pub fn intended_use(&self) -> Option<&str> {
        non_blank(self.intended_use.as_deref())
    }

    pub fn brand_preference(&self) -> Option<&str> {
        non_blank(self.brand_preference.as_deref())
    }

    pub fn budget(&self) -> Option<f64> {
        self.budget.filter(|b| *b > 0.0)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Which path produced a [`GenerationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    NoInventory,
    Clarify,
    Generate,
    Fallback,
    Emergency,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::NoInventory => "no_inventory",
            Outcome::Clarify => "clarify",
            Outcome::Generate => "generate",
            Outcome::Fallback => "fallback",
            Outcome::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply handed back to the caller, who persists it with the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: String,
    /// Provider tag, `"rules"` for deterministic replies, or `"emergency"`.
    pub provider: String,
    pub model: String,
    pub tokens_used: Option<u32>,
    /// Always empty for now.
    pub suggested_products: Vec<String>,
    pub follow_up_questions: Vec<String>,
    pub outcome: Outcome,
    pub search_terms: Vec<String>,
}
