// Test mocks for the assistant pipeline.
//
// One mock per trait boundary:
// - MockCatalog (CatalogStore): in-memory items, records every filter
// - MockSettings (SettingsStore): single optional record
// - MockConversations (ConversationStore): append-only Vec
// - RecordingProviderFactory (ProviderFactory): builds ScriptedProviders
//   and records every outbound completion

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use ai_client::{AiError, Completion, CompletionRequest, ProviderKind, TextGenerationProvider};
use anyhow::{bail, Result};
use async_trait::async_trait;

use storefront_core::{AssistantSettings, CatalogItem, ConversationTurn, InventoryItem};

use crate::catalog::InventoryFilter;
use crate::generation::ProviderFactory;
use crate::traits::{CatalogStore, ConversationStore, SettingsStore};

// ---------------------------------------------------------------------------
// MockCatalog
// ---------------------------------------------------------------------------

/// In-memory catalog evaluating [`InventoryFilter::matches`].
#[derive(Default)]
pub struct MockCatalog {
    items: Vec<CatalogItem>,
    fail: bool,
    filters: Mutex<Vec<InventoryFilter>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: CatalogItem) -> Self {
        self.items.push(item);
        self
    }

    /// Every query returns an error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Filters passed to `find_inventory`, in call order.
    pub fn filters(&self) -> Vec<InventoryFilter> {
        self.filters.lock().unwrap().clone()
    }

    fn available(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter().filter(|i| i.is_available())
    }
}

#[async_trait]
impl CatalogStore for MockCatalog {
    async fn distinct_tags(&self) -> Result<Vec<String>> {
        if self.fail {
            bail!("MockCatalog: tags unavailable");
        }
        let tags: BTreeSet<String> = self
            .available()
            .flat_map(|i| i.tags.iter().cloned())
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn distinct_categories(&self) -> Result<Vec<String>> {
        if self.fail {
            bail!("MockCatalog: categories unavailable");
        }
        let categories: BTreeSet<String> =
            self.available().filter_map(|i| i.category.clone()).collect();
        Ok(categories.into_iter().collect())
    }

    async fn find_inventory(
        &self,
        filter: &InventoryFilter,
        limit: usize,
    ) -> Result<Vec<InventoryItem>> {
        self.filters.lock().unwrap().push(filter.clone());
        if self.fail {
            bail!("MockCatalog: inventory unavailable");
        }
        let mut items: Vec<InventoryItem> = self
            .items
            .iter()
            .filter(|i| filter.matches(i))
            .map(CatalogItem::to_inventory_item)
            .collect();
        items.sort_by(|a, b| {
            a.price
                .total_cmp(&b.price)
                .then_with(|| a.name.cmp(&b.name))
        });
        items.truncate(limit);
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// MockSettings
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockSettings {
    record: Mutex<Option<AssistantSettings>>,
    fail_reads: bool,
}

impl MockSettings {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(settings: AssistantSettings) -> Self {
        Self {
            record: Mutex::new(Some(settings)),
            fail_reads: false,
        }
    }

    /// Reads return an error.
    pub fn unreadable() -> Self {
        Self {
            record: Mutex::new(None),
            fail_reads: true,
        }
    }

    pub fn current(&self) -> Option<AssistantSettings> {
        self.record.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettingsStore for MockSettings {
    async fn active_settings(&self) -> Result<Option<AssistantSettings>> {
        if self.fail_reads {
            bail!("MockSettings: settings table unavailable");
        }
        Ok(self.current())
    }

    async fn save_settings(&self, settings: &AssistantSettings) -> Result<()> {
        *self.record.lock().unwrap() = Some(settings.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockConversations
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockConversations {
    turns: Mutex<Vec<ConversationTurn>>,
}

impl MockConversations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<ConversationTurn> {
        self.turns.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationStore for MockConversations {
    async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        let session: Vec<ConversationTurn> = self
            .turns
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect();
        let start = session.len().saturating_sub(limit);
        Ok(session[start..].to_vec())
    }

    async fn append(&self, turns: &[ConversationTurn]) -> Result<()> {
        self.turns.lock().unwrap().extend_from_slice(turns);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedProvider + RecordingProviderFactory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Script {
    Reply(String),
    /// Fail as an HTTP error with this status.
    Status(u16),
    /// Fail with an unparseable body.
    Garbage,
}

/// One outbound completion as seen by the fake transport.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub request: CompletionRequest,
}

/// Provider that answers from a fixed script instead of the network.
#[derive(Clone)]
pub struct ScriptedProvider {
    kind: ProviderKind,
    model: String,
    api_key: String,
    script: Script,
    log: Option<Arc<Mutex<Vec<RecordedCall>>>>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            model: "scripted".to_string(),
            api_key: String::new(),
            script,
            log: None,
        }
    }

    pub fn replying(content: impl Into<String>) -> Self {
        Self::new(Script::Reply(content.into()))
    }

    pub fn failing(status: u16) -> Self {
        Self::new(Script::Status(status))
    }
}

#[async_trait]
impl TextGenerationProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError> {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(RecordedCall {
                kind: self.kind,
                api_key: self.api_key.clone(),
                model: self.model.clone(),
                request: request.clone(),
            });
        }
        match &self.script {
            Script::Reply(content) => Ok(Completion {
                content: content.clone(),
                tokens_used: Some(42),
                provider: self.kind,
                model: request.params.model.clone(),
            }),
            Script::Status(status) => Err(AiError::Api {
                status: *status,
                body: "scripted failure".to_string(),
            }),
            Script::Garbage => Err(AiError::Parse("scripted garbage".to_string())),
        }
    }
}

/// Builds [`ScriptedProvider`]s, one script per provider kind, and records
/// every completion they send. Blank keys are rejected like the real registry.
pub struct RecordingProviderFactory {
    default: ScriptedProvider,
    per_kind: HashMap<ProviderKind, ScriptedProvider>,
    log: Arc<Mutex<Vec<RecordedCall>>>,
}

impl RecordingProviderFactory {
    pub fn new(default: ScriptedProvider) -> Self {
        Self {
            default,
            per_kind: HashMap::new(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with(mut self, kind: ProviderKind, provider: ScriptedProvider) -> Self {
        self.per_kind.insert(kind, provider);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.lock().unwrap().clone()
    }

    pub fn calls_to(&self, kind: ProviderKind) -> usize {
        self.calls().iter().filter(|c| c.kind == kind).count()
    }
}

impl ProviderFactory for RecordingProviderFactory {
    fn build(
        &self,
        kind: ProviderKind,
        api_key: &str,
        model: &str,
    ) -> std::result::Result<Arc<dyn TextGenerationProvider>, AiError> {
        if api_key.trim().is_empty() {
            return Err(AiError::Config(format!("No API key for provider {kind}")));
        }
        let mut provider = self.per_kind.get(&kind).unwrap_or(&self.default).clone();
        provider.kind = kind;
        provider.model = model.to_string();
        provider.api_key = api_key.to_string();
        provider.log = Some(self.log.clone());
        Ok(Arc::new(provider))
    }
}
