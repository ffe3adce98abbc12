//! Environment-backed configuration.

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub tokens: TokenSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
}

impl ServerSettings {
    pub fn grpc_addr(&self) -> Result<SocketAddr> {
        format!("0.0.0.0:{}", self.port)
            .parse()
            .context("invalid gRPC listen address")
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

/// Same signing secrets the auth service issues with; this service only
/// validates.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Settings {
            server: ServerSettings {
                port: env::var("GRPC_PORT")
                    .unwrap_or_else(|_| "50053".to_string())
                    .parse()
                    .context("GRPC_PORT must be a port number")?,
            },
            database: DatabaseSettings {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            },
            tokens: TokenSettings {
                access_secret: env::var("ACCESS_TOKEN_SECRET")
                    .context("ACCESS_TOKEN_SECRET is required")?,
                refresh_secret: env::var("REFRESH_TOKEN_SECRET")
                    .context("REFRESH_TOKEN_SECRET is required")?,
            },
        })
    }
}
