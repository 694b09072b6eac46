use std::sync::Arc;

use tracing::{info, warn};

use storefront_core::AssistantSettings;

use crate::catalog::query_inventory;
use crate::decider::{decide, ClarifyPolicy, ContextSignals, DecisionOutcome};
use crate::error::AssistantError;
use crate::generation::{GenerationClient, EMERGENCY_APOLOGY};
use crate::matcher::{match_inventory, Vocabulary};
use crate::prompt::{build_prompt, PromptInput};
use crate::terms::{extract_terms, StopwordSet};
use crate::traits::{CatalogStore, SettingsStore};
use crate::types::{GenerationResult, Outcome, QueryContext, UserMessage};

/// Provider tag for replies produced without a model call.
pub const RULES_PROVIDER: &str = "rules";
pub const EMERGENCY_PROVIDER: &str = "emergency";

/// The shopping assistant pipeline. Holds no per-request state; settings
/// are read from the store on every call.
pub struct Assistant {
    catalog: Arc<dyn CatalogStore>,
    settings: Arc<dyn SettingsStore>,
    generation: GenerationClient,
}

impl Assistant {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        settings: Arc<dyn SettingsStore>,
        generation: GenerationClient,
    ) -> Self {
        Self {
            catalog,
            settings,
            generation,
        }
    }

    /// Answer one user message.
    ///
    /// Only catalog failures are returned as errors. Provider failures end
    /// in the fallback provider and, failing that, the emergency apology.
    pub async fn process_user_query(
        &self,
        message: &UserMessage,
        context: &QueryContext,
    ) -> Result<GenerationResult, AssistantError> {
        let settings = self.load_settings().await;
        let stopwords = StopwordSet::from_words(
            settings
                .as_ref()
                .map(AssistantSettings::normalized_stopwords)
                .unwrap_or_default(),
        );

        let tokens = extract_terms(&message.text, &stopwords);

        let (tags, categories) = tokio::try_join!(
            self.catalog.distinct_tags(),
            self.catalog.distinct_categories()
        )
        .map_err(AssistantError::Catalog)?;
        let vocabulary = Vocabulary::new(tags, categories);

        let matched = match_inventory(&message.text, &tokens, &vocabulary);
        let snapshot = query_inventory(self.catalog.as_ref(), &matched.search_terms, matched.budget)
            .await
            .map_err(AssistantError::Catalog)?;

        let signals = ContextSignals::resolve(context, matched.budget, &tokens, &snapshot);
        let policy = ClarifyPolicy::from_settings(settings.as_ref());
        let decision = decide(&snapshot, &matched.search_terms, &signals, policy);

        info!(
            session_id = %message.session_id,
            terms = ?matched.search_terms,
            raw_tokens = matched.used_raw_tokens,
            items = snapshot.len(),
            decision = decision.label(),
            "Assistant decision"
        );

        let intent_terms = match decision {
            DecisionOutcome::NoMatch(reply) => {
                return Ok(rules_result(
                    reply.message,
                    reply.follow_up_questions,
                    Outcome::NoInventory,
                    matched.search_terms,
                ));
            }
            DecisionOutcome::Clarify(reply) => {
                return Ok(rules_result(
                    reply.message,
                    reply.questions,
                    Outcome::Clarify,
                    matched.search_terms,
                ));
            }
            DecisionOutcome::Generate { intent_terms } => intent_terms,
        };

        let prompt = build_prompt(&PromptInput {
            snapshot: &snapshot,
            intent_terms: &intent_terms,
            user_message: &message.text,
            first_turn: !message.has_prior_turns,
            clarify_questions: policy.enabled.then(|| policy.question_count()),
            budget: signals.budget,
        });

        let primary = self.generation.primary_kind(settings.as_ref());
        let completion = match self
            .generation
            .generate(settings.as_ref(), &prompt, &context.history, &message.text)
            .await
        {
            Ok(completion) => Some((completion, Outcome::Generate)),
            Err(e) => {
                warn!(provider = %primary, error = %e, "Primary provider failed");
                match self.generation.generate_fallback(primary, &message.text).await {
                    Ok(completion) => Some((completion, Outcome::Fallback)),
                    Err(e) => {
                        warn!(
                            provider = %primary.alternate(),
                            error = %e,
                            "Fallback provider failed"
                        );
                        None
                    }
                }
            }
        };

        Ok(match completion {
            Some((completion, outcome)) => GenerationResult {
                content: completion.content,
                provider: completion.provider.to_string(),
                model: completion.model,
                tokens_used: completion.tokens_used,
                suggested_products: Vec::new(),
                follow_up_questions: Vec::new(),
                outcome,
                search_terms: matched.search_terms,
            },
            None => GenerationResult {
                content: EMERGENCY_APOLOGY.to_string(),
                provider: EMERGENCY_PROVIDER.to_string(),
                model: "none".to_string(),
                tokens_used: None,
                suggested_products: Vec::new(),
                follow_up_questions: Vec::new(),
                outcome: Outcome::Emergency,
                search_terms: matched.search_terms,
            },
        })
    }

    /// A read failure counts as "no active settings".
    async fn load_settings(&self) -> Option<AssistantSettings> {
        match self.settings.active_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to read assistant settings");
                None
            }
        }
    }
}

fn rules_result(
    content: String,
    follow_up_questions: Vec<String>,
    outcome: Outcome,
    search_terms: Vec<String>,
) -> GenerationResult {
    GenerationResult {
        content,
        provider: RULES_PROVIDER.to_string(),
        model: "none".to_string(),
        tokens_used: None,
        suggested_products: Vec::new(),
        follow_up_questions,
        outcome,
        search_terms,
    }
}
