// Trait abstractions for the assistant's collaborators.
//
// CatalogStore: read-only vocabulary and inventory queries.
// SettingsStore: the mutable assistant settings record.
// ConversationStore: per-session message history, owned by the caller.
//
// Postgres implementations live in `store`; in-memory mocks in `testing`.

use anyhow::Result;
use async_trait::async_trait;

use storefront_core::{AssistantSettings, ConversationTurn, InventoryItem};

use crate::catalog::InventoryFilter;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Distinct tags over active, in-stock items.
    async fn distinct_tags(&self) -> Result<Vec<String>>;

    /// Distinct categories over active, in-stock items.
    async fn distinct_categories(&self) -> Result<Vec<String>>;

    /// Items matching `filter`, at most `limit`, ordered by price then name.
    async fn find_inventory(
        &self,
        filter: &InventoryFilter,
        limit: usize,
    ) -> Result<Vec<InventoryItem>>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The active record, if one exists. Never cached by callers.
    async fn active_settings(&self) -> Result<Option<AssistantSettings>>;

    async fn save_settings(&self, settings: &AssistantSettings) -> Result<()>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The most recent `limit` turns of a session, oldest first.
    async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<ConversationTurn>>;

    async fn append(&self, turns: &[ConversationTurn]) -> Result<()>;
}
