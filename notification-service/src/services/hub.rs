//! Notification creation and live fan-out.
//!
//! A notification is durable first: the row is written before anyone hears
//! about it, and a store failure fails the whole create. Live delivery is
//! detached best-effort work over small bounded queues; a subscriber that
//! cannot keep up loses pushes rather than stalling the creator.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use stream_registry::{
    delivery_queue, ConnectionId, ConnectionRegistry, DeliveryQueue, DeliverySender,
    DELIVERY_QUEUE_CAPACITY,
};

use crate::db::NotificationStore;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{Notification, NotificationKind};

pub type NotificationRegistry = ConnectionRegistry<DeliverySender<Notification>>;

/// Fields a caller supplies; everything else is stamped here.
pub struct NewNotification {
    pub title: String,
    pub body: String,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub listing_id: Option<String>,
}

pub struct NotificationHub {
    registry: Arc<NotificationRegistry>,
    store: Arc<dyn NotificationStore>,
}

impl NotificationHub {
    pub fn new(registry: Arc<NotificationRegistry>, store: Arc<dyn NotificationStore>) -> Self {
        Self { registry, store }
    }

    /// Persist a new notification and push it to any live streams. Returns
    /// the stored notification; only the persistence step can fail.
    pub async fn create(
        &self,
        sender_id: String,
        new: NewNotification,
    ) -> NotificationResult<Notification> {
        if new.recipient_id.is_empty() {
            return Err(NotificationError::Validation(
                "recipient_id must not be empty".to_string(),
            ));
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            title: new.title,
            body: new.body,
            sender_id,
            recipient_id: new.recipient_id,
            kind: new.kind,
            listing_id: new.listing_id,
            created_at: Utc::now(),
        };

        self.store.append(notification.clone()).await?;
        self.broadcast_detached(notification.clone());
        Ok(notification)
    }

    /// Open a live stream for `identity`, replacing any stale one.
    pub fn subscribe(&self, identity: &str) -> (ConnectionId, DeliveryQueue<Notification>) {
        let (tx, rx) = delivery_queue(DELIVERY_QUEUE_CAPACITY);
        let connection = self.registry.register(identity, tx);
        (connection, rx)
    }

    pub fn unsubscribe(&self, identity: &str, connection: ConnectionId) {
        self.registry.unregister(identity, connection);
    }

    pub async fn list(&self, recipient_id: &str) -> NotificationResult<Vec<Notification>> {
        self.store.list_by_recipient(recipient_id).await
    }

    /// Push to the recipient's stream and, when distinct, the sender's own.
    /// Queue overflow and offline parties are silent losses; the row is
    /// already durable.
    fn broadcast_detached(&self, notification: Notification) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let mut targets = vec![notification.recipient_id.clone()];
            if notification.sender_id != notification.recipient_id {
                targets.push(notification.sender_id.clone());
            }
            for target in targets {
                if let Some(handle) = registry.lookup(&target) {
                    if !handle.try_push(notification.clone()) {
                        warn!(user = %target, "notification queue full, dropping push");
                    }
                }
            }
        });
    }
}
