use grpc_metadata::MetadataError;
use thiserror::Error;
use token_codec::TokenError;
use tonic::Status;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("database error: {0}")]
    Database(String),
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;

impl From<sqlx::Error> for ChatError {
    fn from(err: sqlx::Error) -> Self {
        ChatError::Database(err.to_string())
    }
}

impl From<ChatError> for Status {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Token(_) | ChatError::Metadata(_) => {
                Status::unauthenticated(err.to_string())
            }
            ChatError::Database(_) => {
                tracing::error!(error = %err, "internal failure");
                Status::internal("internal server error")
            }
        }
    }
}
