//! Notification persistence collaborator.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::{NotificationError, NotificationResult};
use crate::models::{Notification, NotificationKind};

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn append(&self, notification: Notification) -> NotificationResult<()>;
    /// Everything addressed to `recipient_id`, most recent first.
    async fn list_by_recipient(&self, recipient_id: &str) -> NotificationResult<Vec<Notification>>;
}

pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn append(&self, notification: Notification) -> NotificationResult<()> {
        sqlx::query(
            "INSERT INTO notifications \
             (id, title, body, sender_id, recipient_id, kind, listing_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(notification.id)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.sender_id)
        .bind(&notification.recipient_id)
        .bind(notification.kind.as_str())
        .bind(&notification.listing_id)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_by_recipient(&self, recipient_id: &str) -> NotificationResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, title, body, sender_id, recipient_id, kind, listing_id, created_at \
             FROM notifications \
             WHERE recipient_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;

        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            let kind: String = row.try_get("kind")?;
            let kind = NotificationKind::from_str(&kind).ok_or_else(|| {
                NotificationError::Database(format!("unrecognized notification kind: {kind}"))
            })?;
            notifications.push(Notification {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                body: row.try_get("body")?,
                sender_id: row.try_get("sender_id")?,
                recipient_id: row.try_get("recipient_id")?,
                kind,
                listing_id: row.try_get("listing_id")?,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(notifications)
    }
}
