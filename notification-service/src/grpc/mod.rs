//! gRPC surface for notifications.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use token_codec::{TokenClass, TokenCodec};

use crate::error::NotificationError;
use crate::market::notification::v1 as pb;
use crate::market::notification::v1::notification_service_server::NotificationService;
pub use crate::market::notification::v1::notification_service_server::NotificationServiceServer;
use crate::models::NotificationKind;
use crate::services::hub::NewNotification;
use crate::services::NotificationHub;

pub struct NotificationGrpc {
    codec: Arc<TokenCodec>,
    hub: Arc<NotificationHub>,
}

impl NotificationGrpc {
    pub fn new(codec: Arc<TokenCodec>, hub: Arc<NotificationHub>) -> Self {
        Self { codec, hub }
    }

    fn authenticate(&self, metadata: &tonic::metadata::MetadataMap) -> Result<String, Status> {
        let token = grpc_metadata::bearer_token(metadata)?;
        self.codec
            .validate(&token, TokenClass::Access)
            .map_err(|e| NotificationError::from(e).into())
    }
}

#[tonic::async_trait]
impl NotificationService for NotificationGrpc {
    async fn create_notification(
        &self,
        request: Request<pb::CreateNotificationRequest>,
    ) -> Result<Response<pb::Notification>, Status> {
        let identity = self.authenticate(request.metadata())?;
        let req = request.into_inner();

        let kind = pb::NotificationKind::try_from(req.kind)
            .ok()
            .and_then(NotificationKind::from_proto)
            .ok_or_else(|| Status::invalid_argument("kind is required"))?;

        let notification = self
            .hub
            .create(
                identity,
                NewNotification {
                    title: req.title,
                    body: req.body,
                    recipient_id: req.recipient_id,
                    kind,
                    listing_id: req.listing_id,
                },
            )
            .await
            .map_err(Status::from)?;

        Ok(Response::new(notification.into_proto()))
    }

    async fn list_notifications(
        &self,
        request: Request<pb::ListNotificationsRequest>,
    ) -> Result<Response<pb::ListNotificationsResponse>, Status> {
        let identity = self.authenticate(request.metadata())?;

        let notifications = self.hub.list(&identity).await.map_err(Status::from)?;

        Ok(Response::new(pb::ListNotificationsResponse {
            notifications: notifications.into_iter().map(|n| n.into_proto()).collect(),
        }))
    }

    type StreamNotificationsStream = ReceiverStream<Result<pb::Notification, Status>>;

    async fn stream_notifications(
        &self,
        request: Request<pb::StreamNotificationsRequest>,
    ) -> Result<Response<Self::StreamNotificationsStream>, Status> {
        let identity = self.authenticate(request.metadata())?;

        let (connection, mut queue) = self.hub.subscribe(&identity);
        info!(identity = %identity, "notification stream opened");

        // Pump the delivery queue into the response stream. The registry
        // holds a sender for the queue, so `recv` alone would never end; a
        // dropped response stream must also end the task, or the
        // registration leaks and later pushes land in a dead queue.
        let (tx, rx) = mpsc::channel(1);
        let hub = Arc::clone(&self.hub);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    pushed = queue.recv() => match pushed {
                        Some(notification) => {
                            if tx.send(Ok(notification.into_proto())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                    _ = tx.closed() => break,
                }
            }
            hub.unsubscribe(&identity, connection);
            debug!(identity = %identity, "notification stream closed");
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
