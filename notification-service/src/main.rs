use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tonic::transport::Server;
use tracing::info;

use notification_service::config::Settings;
use notification_service::db::{NotificationStore, PgNotificationStore};
use notification_service::grpc::{NotificationGrpc, NotificationServiceServer};
use notification_service::services::{NotificationHub, NotificationRegistry};
use token_codec::TokenCodec;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "notification_service=info,info".into()),
        )
        .init();

    info!("Starting notification service");

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
    let registry = Arc::new(NotificationRegistry::new());
    let store: Arc<dyn NotificationStore> = Arc::new(PgNotificationStore::new(db_pool));
    let hub = Arc::new(NotificationHub::new(registry, store));

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<NotificationServiceServer<NotificationGrpc>>()
        .await;

    let addr = settings.server.grpc_addr()?;
    info!(%addr, "gRPC server listening");

    Server::builder()
        .add_service(health_service)
        .add_service(NotificationServiceServer::new(NotificationGrpc::new(
            codec, hub,
        )))
        .serve_with_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await
        .context("gRPC server error")?;

    Ok(())
}
