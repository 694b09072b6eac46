//! Postgres adapters for the collaborator traits.

pub mod catalog;
pub mod conversations;
pub mod settings;

pub use catalog::PgCatalogStore;
pub use conversations::PgConversationStore;
pub use settings::PgSettingsStore;
