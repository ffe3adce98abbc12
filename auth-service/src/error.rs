use grpc_metadata::MetadataError;
use thiserror::Error;
use token_codec::TokenError;
use tonic::Status;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("email already registered")]
    EmailAlreadyExists,

    #[error("presented refresh token does not match the stored one")]
    CredentialMismatch,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Database(err.to_string())
    }
}

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::CredentialMismatch
            | AuthError::Token(_)
            | AuthError::Metadata(_) => Status::unauthenticated(err.to_string()),
            AuthError::UserNotFound => Status::not_found(err.to_string()),
            AuthError::EmailAlreadyExists => Status::already_exists(err.to_string()),
            AuthError::Validation(msg) => Status::invalid_argument(msg),
            AuthError::Database(_) | AuthError::Internal(_) => {
                tracing::error!(error = %err, "internal failure");
                Status::internal("internal server error")
            }
        }
    }
}
