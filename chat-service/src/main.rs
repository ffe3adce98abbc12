use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tonic::transport::Server;
use tracing::info;

use chat_service::config::Settings;
use chat_service::db::{MessageStore, PgMessageStore};
use chat_service::grpc::{ChatGrpc, ChatServiceServer};
use chat_service::services::{ChatRegistry, ChatRouter};
use token_codec::TokenCodec;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "chat_service=info,info".into()),
        )
        .init();

    info!("Starting chat service");

    let settings = Settings::load().context("failed to load configuration")?;

    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await
        .context("failed to connect to PostgreSQL")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("failed to run database migrations")?;

    let codec = Arc::new(TokenCodec::new(
        settings.tokens.access_secret.as_bytes(),
        settings.tokens.refresh_secret.as_bytes(),
    ));
    let registry = Arc::new(ChatRegistry::new());
    let store: Arc<dyn MessageStore> = Arc::new(PgMessageStore::new(db_pool));
    let router = Arc::new(ChatRouter::new(registry, Arc::clone(&store)));

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<ChatServiceServer<ChatGrpc>>()
        .await;

    let addr = settings.server.grpc_addr()?;
    info!(%addr, "gRPC server listening");

    Server::builder()
        .add_service(health_service)
        .add_service(ChatServiceServer::new(ChatGrpc::new(codec, router, store)))
        .serve_with_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await
        .context("gRPC server error")?;

    Ok(())
}
