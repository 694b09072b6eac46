use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use ai_client::ProviderKind;
use storefront_core::AssistantSettings;

use crate::traits::SettingsStore;

/// The single-row `assistant_settings` table. The key column holds the
/// encrypted form only.
#[derive(Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    provider: String,
    api_key: Option<String>,
    model_name: String,
    max_tokens: i32,
    temperature: f32,
    stopwords: Vec<String>,
    clarify_before_recommend: bool,
    clarify_max_questions: i32,
}

impl TryFrom<SettingsRow> for AssistantSettings {
    type Error = anyhow::Error;

    fn try_from(row: SettingsRow) -> Result<Self> {
        Ok(Self {
            provider: row
                .provider
                .parse::<ProviderKind>()
                .context("Invalid provider in assistant_settings")?,
            api_key: row.api_key,
            model_name: row.model_name,
            max_tokens: u32::try_from(row.max_tokens).unwrap_or(0),
            temperature: row.temperature,
            stopwords: row.stopwords,
            clarify_before_recommend: row.clarify_before_recommend,
            clarify_max_questions: usize::try_from(row.clarify_max_questions).unwrap_or(1),
        })
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn active_settings(&self) -> Result<Option<AssistantSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT provider, api_key, model_name, max_tokens, temperature, stopwords,
                   clarify_before_recommend, clarify_max_questions
            FROM assistant_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read assistant settings")?;

        row.map(AssistantSettings::try_from).transpose()
    }

    async fn save_settings(&self, settings: &AssistantSettings) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO assistant_settings (
                id, provider, api_key, model_name, max_tokens, temperature, stopwords,
                clarify_before_recommend, clarify_max_questions, updated_at
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, now())
            ON CONFLICT (id) DO UPDATE SET
                provider = EXCLUDED.provider,
                api_key = EXCLUDED.api_key,
                model_name = EXCLUDED.model_name,
                max_tokens = EXCLUDED.max_tokens,
                temperature = EXCLUDED.temperature,
                stopwords = EXCLUDED.stopwords,
                clarify_before_recommend = EXCLUDED.clarify_before_recommend,
                clarify_max_questions = EXCLUDED.clarify_max_questions,
                updated_at = now()
            "#,
        )
        .bind(settings.provider.as_str())
        .bind(settings.api_key.as_deref())
        .bind(&settings.model_name)
        .bind(i32::try_from(settings.max_tokens).unwrap_or(i32::MAX))
        .bind(settings.temperature)
        .bind(&settings.stopwords)
        .bind(settings.clarify_before_recommend)
        .bind(settings.clarify_question_count() as i32)
        .execute(&self.pool)
        .await
        .context("Failed to save assistant settings")?;

        Ok(())
    }
}
