//! Per-connection chat routing.
//!
//! A connection is bound to its authenticated identity before the first
//! frame is read, serves inbound frames until the stream ends or errors, and
//! then unregisters exactly once. Persistence is detached work; a slow or
//! failing store never stalls the stream.

use std::sync::Arc;
use std::time::SystemTime;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tonic::Status;
use tracing::{debug, warn};
use uuid::Uuid;

use stream_registry::{ConnectionId, ConnectionRegistry};

use crate::db::MessageStore;
use crate::market::chat::v1::ChatFrame;
use crate::models::StoredMessage;

/// Outbound buffer per connection. Forwarding awaits on a full buffer, which
/// backpressures only the sender whose receiver is slow.
pub const OUTBOUND_BUFFER: usize = 32;

pub type ChatSender = mpsc::Sender<Result<ChatFrame, Status>>;
pub type ChatRegistry = ConnectionRegistry<ChatSender>;

pub struct ChatRouter {
    registry: Arc<ChatRegistry>,
    store: Arc<dyn MessageStore>,
}

impl ChatRouter {
    pub fn new(registry: Arc<ChatRegistry>, store: Arc<dyn MessageStore>) -> Self {
        Self { registry, store }
    }

    /// Bind a freshly authenticated connection: create its outbound channel
    /// and register the write half under `identity`, silently replacing any
    /// stale connection.
    pub fn bind(
        &self,
        identity: &str,
    ) -> (ConnectionId, mpsc::Receiver<Result<ChatFrame, Status>>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let connection = self.registry.register(identity, tx);
        (connection, rx)
    }

    /// Serve one bound connection until its inbound stream ends, then
    /// unregister. The connection id guard keeps a late exit of this task
    /// from evicting a newer connection for the same identity.
    pub async fn run<S>(&self, identity: String, connection: ConnectionId, mut inbound: S)
    where
        S: Stream<Item = Result<ChatFrame, Status>> + Unpin,
    {
        while let Some(frame) = inbound.next().await {
            let mut msg = match frame {
                Ok(msg) => msg,
                Err(status) => {
                    debug!(identity = %identity, status = %status, "inbound stream error");
                    break;
                }
            };

            // No addressee: heartbeat, nothing to do.
            if msg.receiver_id.is_empty() {
                continue;
            }

            if msg.id.is_empty() {
                msg.id = Uuid::new_v4().to_string();
            }
            if msg.created_at.is_none() {
                msg.created_at = Some(SystemTime::now().into());
            }
            // The sender identity comes from the validated credential, never
            // from the frame.
            msg.sender_id = identity.clone();

            self.persist_detached(StoredMessage::from_frame(&msg));
            self.forward(msg).await;
        }

        self.registry.unregister(&identity, connection);
        debug!(identity = %identity, "chat connection closed");
    }

    /// Best-effort durability: failures are logged, the stream survives.
    fn persist_detached(&self, record: StoredMessage) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.append(record).await {
                warn!(error = %e, "failed to persist chat message");
            }
        });
    }

    /// Forward to the receiver's live stream, if any. A miss is a silent
    /// drop; the sender is never notified.
    async fn forward(&self, msg: ChatFrame) {
        match self.registry.lookup(&msg.receiver_id) {
            Some(handle) => {
                if handle.send(Ok(msg)).await.is_err() {
                    warn!("receiver stream closed before delivery");
                }
            }
            None => {
                warn!(receiver = %msg.receiver_id, "no live stream for receiver, dropping");
            }
        }
    }
}
