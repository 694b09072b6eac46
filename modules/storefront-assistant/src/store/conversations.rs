use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};

use ai_client::MessageRole;
use storefront_core::ConversationTurn;

use crate::traits::ConversationStore;

#[derive(Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TurnRow {
    session_id: String,
    role: String,
    content: String,
    provider: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TurnRow> for ConversationTurn {
    type Error = anyhow::Error;

    fn try_from(row: TurnRow) -> Result<Self> {
        Ok(Self {
            role: row
                .role
                .parse::<MessageRole>()
                .context("Invalid role in conversation_messages")?,
            session_id: row.session_id,
            content: row.content,
            provider: row.provider,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        let rows = sqlx::query_as::<_, TurnRow>(
            r#"
            SELECT session_id, role, content, provider, created_at
            FROM (
                SELECT id, session_id, role, content, provider, created_at
                FROM conversation_messages
                WHERE session_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load conversation history")?;

        rows.into_iter().map(ConversationTurn::try_from).collect()
    }

    async fn append(&self, turns: &[ConversationTurn]) -> Result<()> {
        if turns.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::new(
            "INSERT INTO conversation_messages (session_id, role, content, provider, created_at) ",
        );
        qb.push_values(turns, |mut row, turn| {
            row.push_bind(turn.session_id.clone())
                .push_bind(turn.role.as_str())
                .push_bind(turn.content.clone())
                .push_bind(turn.provider.clone())
                .push_bind(turn.created_at);
        });
        qb.build()
            .execute(&self.pool)
            .await
            .context("Failed to append conversation turns")?;

        Ok(())
    }
}
