//! Message-store collaborator.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::ChatResult;
use crate::models::StoredMessage;

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append(&self, message: StoredMessage) -> ChatResult<()>;
    /// Conversation between two users, oldest first.
    async fn history(&self, a: &str, b: &str) -> ChatResult<Vec<StoredMessage>>;
    /// Distinct users `identity` has exchanged messages with, most recent
    /// conversation first.
    async fn interlocutors(&self, identity: &str) -> ChatResult<Vec<String>>;
}

pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn append(&self, message: StoredMessage) -> ChatResult<()> {
        sqlx::query(
            "INSERT INTO messages (id, text, sender_id, receiver_id, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&message.id)
        .bind(&message.text)
        .bind(&message.sender_id)
        .bind(&message.receiver_id)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn history(&self, a: &str, b: &str) -> ChatResult<Vec<StoredMessage>> {
        let rows = sqlx::query(
            "SELECT id, text, sender_id, receiver_id, created_at FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) \
                OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC",
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            messages.push(StoredMessage {
                id: row.try_get("id")?,
                text: row.try_get("text")?,
                sender_id: row.try_get("sender_id")?,
                receiver_id: row.try_get("receiver_id")?,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(messages)
    }

    async fn interlocutors(&self, identity: &str) -> ChatResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS interlocutor, \
                    MAX(created_at) AS last_message_at \
             FROM messages \
             WHERE sender_id = $1 OR receiver_id = $1 \
             GROUP BY interlocutor \
             ORDER BY last_message_at DESC",
        )
        .bind(identity)
        .fetch_all(&self.pool)
        .await?;

        let mut interlocutors = Vec::with_capacity(rows.len());
        for row in rows {
            interlocutors.push(row.try_get("interlocutor")?);
        }
        Ok(interlocutors)
    }
}
