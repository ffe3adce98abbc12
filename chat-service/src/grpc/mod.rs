//! gRPC surface for real-time chat.

use std::sync::Arc;

use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::info;

use token_codec::{TokenClass, TokenCodec};

use crate::db::MessageStore;
use crate::error::ChatError;
use crate::market::chat::v1::chat_service_server::ChatService;
pub use crate::market::chat::v1::chat_service_server::ChatServiceServer;
use crate::market::chat::v1::{
    ChatFrame, ChatHistoryRequest, ChatHistoryResponse, ListConversationsRequest,
    ListConversationsResponse,
};
use crate::services::ChatRouter;

pub struct ChatGrpc {
    codec: Arc<TokenCodec>,
    router: Arc<ChatRouter>,
    store: Arc<dyn MessageStore>,
}

impl ChatGrpc {
    pub fn new(codec: Arc<TokenCodec>, router: Arc<ChatRouter>, store: Arc<dyn MessageStore>) -> Self {
        Self {
            codec,
            router,
            store,
        }
    }

    fn authenticate(&self, metadata: &tonic::metadata::MetadataMap) -> Result<String, Status> {
        let token = grpc_metadata::bearer_token(metadata)?;
        self.codec
            .validate(&token, TokenClass::Access)
            .map_err(|e| ChatError::from(e).into())
    }
}

#[tonic::async_trait]
impl ChatService for ChatGrpc {
    type ChatStream = ReceiverStream<Result<ChatFrame, Status>>;

    async fn chat(
        &self,
        request: Request<Streaming<ChatFrame>>,
    ) -> Result<Response<Self::ChatStream>, Status> {
        // Credential validation first; registration only happens for an
        // authenticated identity.
        let identity = self.authenticate(request.metadata())?;
        let inbound = request.into_inner();

        let (connection, outbound) = self.router.bind(&identity);
        info!(identity = %identity, "chat stream opened");

        let router = Arc::clone(&self.router);
        tokio::spawn(async move {
            router.run(identity, connection, inbound).await;
        });

        Ok(Response::new(ReceiverStream::new(outbound)))
    }

    async fn chat_history(
        &self,
        request: Request<ChatHistoryRequest>,
    ) -> Result<Response<ChatHistoryResponse>, Status> {
        let identity = self.authenticate(request.metadata())?;
        let req = request.into_inner();

        if req.interlocutor_id.is_empty() {
            return Err(Status::invalid_argument("interlocutor_id is required"));
        }

        let messages = self
            .store
            .history(&identity, &req.interlocutor_id)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(ChatHistoryResponse {
            messages: messages.into_iter().map(|m| m.into_frame()).collect(),
        }))
    }

    async fn list_conversations(
        &self,
        request: Request<ListConversationsRequest>,
    ) -> Result<Response<ListConversationsResponse>, Status> {
        let identity = self.authenticate(request.metadata())?;

        let interlocutor_ids = self
            .store
            .interlocutors(&identity)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(ListConversationsResponse { interlocutor_ids }))
    }
}
