//! gRPC surface for the token lifecycle service.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::info;

use crate::services::{SessionTokens, TokenService};
use crate::validators;

use crate::market::auth::v1::auth_service_server::AuthService;
pub use crate::market::auth::v1::auth_service_server::AuthServiceServer;
use crate::market::auth::v1::{
    LoginRequest, LogoutRequest, LogoutResponse, RefreshAccessRequest, RegisterRequest,
    TokenPairResponse,
};

pub struct AuthGrpc {
    tokens: Arc<TokenService>,
}

impl AuthGrpc {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

fn token_pair(tokens: SessionTokens) -> TokenPairResponse {
    TokenPairResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_at: tokens.expires_at.timestamp(),
    }
}

#[tonic::async_trait]
impl AuthService for AuthGrpc {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<TokenPairResponse>, Status> {
        let fingerprint = grpc_metadata::fingerprint(request.metadata())?;
        let req = request.into_inner();

        validators::validate_email(&req.email)?;
        validators::validate_password(&req.password)?;

        let tokens = self
            .tokens
            .register(&req.email, &req.password, &fingerprint)
            .await?;

        info!(email = %req.email, "registered new account");
        Ok(Response::new(token_pair(tokens)))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<TokenPairResponse>, Status> {
        let fingerprint = grpc_metadata::fingerprint(request.metadata())?;
        let req = request.into_inner();

        validators::validate_email(&req.email)?;
        validators::validate_password(&req.password)?;

        let tokens = self
            .tokens
            .login(&req.email, &req.password, &fingerprint)
            .await?;

        Ok(Response::new(token_pair(tokens)))
    }

    async fn logout(
        &self,
        request: Request<LogoutRequest>,
    ) -> Result<Response<LogoutResponse>, Status> {
        let refresh = grpc_metadata::bearer_token(request.metadata())?;
        let fingerprint = grpc_metadata::fingerprint(request.metadata())?;

        self.tokens.logout(&refresh, &fingerprint).await?;

        Ok(Response::new(LogoutResponse {
            message: "logged out".to_string(),
        }))
    }

    async fn refresh_access(
        &self,
        request: Request<RefreshAccessRequest>,
    ) -> Result<Response<TokenPairResponse>, Status> {
        let refresh = grpc_metadata::bearer_token(request.metadata())?;
        let fingerprint = grpc_metadata::fingerprint(request.metadata())?;

        let tokens = self.tokens.refresh_access(&refresh, &fingerprint).await?;
        Ok(Response::new(token_pair(tokens)))
    }
}
