use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tonic::transport::Server;
use tracing::info;

use auth_service::config::Settings;
use auth_service::db::PgUserRepository;
use auth_service::grpc::{AuthGrpc, AuthServiceServer};
use auth_service::services::TokenService;
use token_codec::TokenCodec;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "auth_service=info,info".into()),
        )
        .init();

    info!("Starting auth service");

    let settings = Settings::load().context("failed to load configuration")?;

    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!(
        max_connections = settings.database.max_connections,
        "database pool initialized"
    );

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("failed to run database migrations")?;

    let codec = Arc::new(TokenCodec::new(
        settings.tokens.access_secret.as_bytes(),
        settings.tokens.refresh_secret.as_bytes(),
    ));
    let users = Arc::new(PgUserRepository::new(db_pool));
    let tokens = Arc::new(TokenService::new(codec, users));

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<AuthServiceServer<AuthGrpc>>()
        .await;

    let addr = settings.server.grpc_addr()?;
    info!(%addr, "gRPC server listening");

    Server::builder()
        .add_service(health_service)
        .add_service(AuthServiceServer::new(AuthGrpc::new(tokens)))
        .serve_with_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await
        .context("gRPC server error")?;

    Ok(())
}
