//! Hub behavior with an in-memory notification store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use notification_service::db::NotificationStore;
use notification_service::error::{NotificationError, NotificationResult};
use notification_service::models::{Notification, NotificationKind};
use notification_service::services::{NewNotification, NotificationHub, NotificationRegistry};

#[derive(Default)]
struct InMemoryNotificationStore {
    notifications: Mutex<Vec<Notification>>,
    fail_appends: AtomicBool,
}

impl InMemoryNotificationStore {
    fn appended(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn append(&self, notification: Notification) -> NotificationResult<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(NotificationError::Database("store unavailable".into()));
        }
        self.notifications.lock().unwrap().push(notification);
        Ok(())
    }

    async fn list_by_recipient(&self, recipient_id: &str) -> NotificationResult<Vec<Notification>> {
        let mut matching: Vec<Notification> = self
            .appended()
            .into_iter()
            .filter(|n| n.recipient_id == recipient_id)
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}

fn setup() -> (
    Arc<NotificationHub>,
    Arc<NotificationRegistry>,
    Arc<InMemoryNotificationStore>,
) {
    let registry = Arc::new(NotificationRegistry::new());
    let store = Arc::new(InMemoryNotificationStore::default());
    let hub = Arc::new(NotificationHub::new(Arc::clone(&registry), store.clone()));
    (hub, registry, store)
}

fn order_update_for(recipient: &str, title: &str) -> NewNotification {
    NewNotification {
        title: title.to_owned(),
        body: "your order moved along".to_owned(),
        recipient_id: recipient.to_owned(),
        kind: NotificationKind::OrderUpdate,
        listing_id: Some("listing-7".to_owned()),
    }
}

#[tokio::test]
async fn create_persists_and_returns_the_stored_notification() {
    let (hub, _registry, store) = setup();

    let created = hub
        .create("seller-1".into(), order_update_for("buyer-1", "Shipped"))
        .await
        .unwrap();

    assert_eq!(created.sender_id, "seller-1");
    assert_eq!(created.recipient_id, "buyer-1");
    assert_eq!(created.title, "Shipped");
    assert_eq!(created.kind, NotificationKind::OrderUpdate);
    assert_eq!(created.listing_id.as_deref(), Some("listing-7"));

    let stored = store.appended();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], created);
}

#[tokio::test]
async fn offline_recipient_still_gets_a_durable_record() {
    let (hub, _registry, _store) = setup();

    hub.create("a".into(), order_update_for("b", "first"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    hub.create("a".into(), order_update_for("b", "second"))
        .await
        .unwrap();

    // Most recent first.
    let listed = hub.list("b").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title, "second");
    assert_eq!(listed[1].title, "first");
}

#[tokio::test]
async fn live_recipient_receives_a_push() {
    let (hub, _registry, _store) = setup();

    let (_conn, mut queue) = hub.subscribe("buyer-1");
    let created = hub
        .create("seller-1".into(), order_update_for("buyer-1", "Shipped"))
        .await
        .unwrap();

    let pushed = timeout(Duration::from_secs(1), queue.recv())
        .await
        .expect("push never arrived")
        .unwrap();
    assert_eq!(pushed, created);
}

#[tokio::test]
async fn sender_gets_a_copy_on_their_own_stream() {
    let (hub, _registry, _store) = setup();

    let (_conn_r, mut recipient_queue) = hub.subscribe("buyer-1");
    let (_conn_s, mut sender_queue) = hub.subscribe("seller-1");

    let created = hub
        .create("seller-1".into(), order_update_for("buyer-1", "Shipped"))
        .await
        .unwrap();

    let to_recipient = timeout(Duration::from_secs(1), recipient_queue.recv())
        .await
        .expect("recipient push never arrived")
        .unwrap();
    let to_sender = timeout(Duration::from_secs(1), sender_queue.recv())
        .await
        .expect("sender push never arrived")
        .unwrap();
    assert_eq!(to_recipient, created);
    assert_eq!(to_sender, created);
}

#[tokio::test]
async fn self_notification_is_pushed_once() {
    let (hub, _registry, _store) = setup();

    let (_conn, mut queue) = hub.subscribe("solo");
    hub.create("solo".into(), order_update_for("solo", "Note to self"))
        .await
        .unwrap();

    timeout(Duration::from_secs(1), queue.recv())
        .await
        .expect("push never arrived")
        .unwrap();
    // No duplicate for sender == recipient.
    assert!(timeout(Duration::from_millis(200), queue.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn overflowing_subscriber_loses_pushes_but_no_records() {
    let (hub, _registry, store) = setup();

    let (_conn, mut queue) = hub.subscribe("buyer-1");
    for i in 0..11 {
        hub.create("seller-1".into(), order_update_for("buyer-1", &format!("n{i}")))
            .await
            .unwrap();
    }
    // Let every detached broadcast run before draining.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut received = 0;
    while timeout(Duration::from_millis(100), queue.recv())
        .await
        .ok()
        .flatten()
        .is_some()
    {
        received += 1;
    }
    assert_eq!(received, 10);

    // Every create still produced a row.
    assert_eq!(store.appended().len(), 11);
}

#[tokio::test]
async fn empty_recipient_is_rejected() {
    let (hub, _registry, store) = setup();

    let err = hub
        .create("seller-1".into(), order_update_for("", "Nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, NotificationError::Validation(_)));
    assert!(store.appended().is_empty());
}

#[tokio::test]
async fn store_failure_aborts_the_create() {
    let (hub, _registry, store) = setup();
    store.fail_appends.store(true, Ordering::SeqCst);

    let (_conn, mut queue) = hub.subscribe("buyer-1");
    let err = hub
        .create("seller-1".into(), order_update_for("buyer-1", "Lost"))
        .await
        .unwrap_err();
    assert!(matches!(err, NotificationError::Database(_)));

    // Nothing durable, so nothing is pushed either.
    assert!(timeout(Duration::from_millis(200), queue.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn resubscribe_replaces_the_stale_stream() {
    let (hub, registry, _store) = setup();

    let (stale_conn, _stale_queue) = hub.subscribe("buyer-1");
    let (_fresh_conn, mut fresh_queue) = hub.subscribe("buyer-1");

    // A late unsubscribe from the stale stream's task is a no-op.
    hub.unsubscribe("buyer-1", stale_conn);
    assert!(registry.lookup("buyer-1").is_some());

    hub.create("seller-1".into(), order_update_for("buyer-1", "Still live"))
        .await
        .unwrap();
    let pushed = timeout(Duration::from_secs(1), fresh_queue.recv())
        .await
        .expect("push never arrived")
        .unwrap();
    assert_eq!(pushed.title, "Still live");
}
