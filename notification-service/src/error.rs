use grpc_metadata::MetadataError;
use thiserror::Error;
use token_codec::TokenError;
use tonic::Status;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(String),
}

pub type NotificationResult<T> = std::result::Result<T, NotificationError>;

impl From<sqlx::Error> for NotificationError {
    fn from(err: sqlx::Error) -> Self {
        NotificationError::Database(err.to_string())
    }
}

impl From<NotificationError> for Status {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Token(_) | NotificationError::Metadata(_) => {
                Status::unauthenticated(err.to_string())
            }
            NotificationError::Validation(msg) => Status::invalid_argument(msg),
            NotificationError::Database(_) => {
                tracing::error!(error = %err, "internal failure");
                Status::internal("internal server error")
            }
        }
    }
}
