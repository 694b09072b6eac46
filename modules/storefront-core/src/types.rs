use ai_client::{MessageRole, ProviderKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on clarifying questions per turn.
pub const MAX_CLARIFY_QUESTIONS: usize = 6;

// --- Catalog ---

/// A catalog entry as stored in the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub price: f64,
    pub stock: i32,
    pub sku: String,
    pub is_active: bool,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, price: f64, stock: i32) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            sku: sku_from_name(&name),
            name,
            brand: None,
            category: None,
            tags: Vec::new(),
            price,
            stock,
            is_active: true,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Active and in stock.
    pub fn is_available(&self) -> bool {
        self.is_active && self.stock > 0
    }

    /// Read-only projection handed to the decider and prompt builder.
    pub fn to_inventory_item(&self) -> InventoryItem {
        InventoryItem {
            name: self.name.clone(),
            brand: self.brand.clone(),
            category: self.category.clone(),
            price: self.price,
            stock: self.stock,
            sku: self.sku.clone(),
        }
    }
}

fn sku_from_name(name: &str) -> String {
    let slug: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("SKU-{slug}")
}

/// Projection of a catalog entry at query time. Stale after the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InventoryItem {
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub sku: String,
}

// --- Assistant settings ---

/// The mutable assistant configuration record. Read fresh on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantSettings {
    pub provider: ProviderKind,
    /// Encrypted at rest; see [`crate::KeyCipher`].
    pub api_key: Option<String>,
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(default)]
    pub stopwords: Vec<String>,
    #[serde(default = "default_true")]
    pub clarify_before_recommend: bool,
    #[serde(default = "default_clarify_max_questions")]
    pub clarify_max_questions: usize,
}

fn default_true() -> bool {
    true
}

fn default_clarify_max_questions() -> usize {
    3
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            api_key: None,
            model_name: "gpt-4o-mini".to_string(),
            max_tokens: 600,
            temperature: 0.4,
            stopwords: Vec::new(),
            clarify_before_recommend: true,
            clarify_max_questions: default_clarify_max_questions(),
        }
    }
}

impl AssistantSettings {
    /// Number of clarifying questions to ask, clamped to `1..=MAX_CLARIFY_QUESTIONS`.
    pub fn clarify_question_count(&self) -> usize {
        self.clarify_max_questions.clamp(1, MAX_CLARIFY_QUESTIONS)
    }

    /// Lowercased, trimmed, non-empty stopwords.
    pub fn normalized_stopwords(&self) -> Vec<String> {
        self.stopwords
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect()
    }
}

// --- Conversations ---

/// One stored message of a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub provider: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            role: MessageRole::User,
            content: content.into(),
            provider: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(
        session_id: impl Into<String>,
        content: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            role: MessageRole::Assistant,
            content: content.into(),
            provider: Some(provider.into()),
            created_at: Utc::now(),
        }
    }

    pub fn to_message(&self) -> ai_client::Message {
        ai_client::Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}
