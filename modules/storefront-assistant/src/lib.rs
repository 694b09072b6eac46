//! Conversational inventory matching and prompt construction for the
//! storefront shopping assistant.
//!
//! ```text
//! text ─▶ terms ─▶ matcher ─▶ catalog ─▶ decider ─┬─▶ deterministic reply
//!                                                 └─▶ prompt ─▶ generation
//! ```

pub mod assistant;
pub mod catalog;
pub mod decider;
pub mod error;
pub mod generation;
pub mod matcher;
pub mod prompt;
pub mod store;
pub mod terms;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod types;

pub use assistant::Assistant;
pub use error::AssistantError;
pub use generation::{FallbackCredentials, GenerationClient, HttpProviderFactory, ProviderFactory};
pub use traits::{CatalogStore, ConversationStore, SettingsStore};
pub use types::{GenerationResult, Outcome, QueryContext, UserMessage};
