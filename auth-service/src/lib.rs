pub mod config;
pub mod db;
pub mod error;
pub mod grpc;
pub mod models;
pub mod security;
pub mod services;
pub mod validators;

pub use error::{AuthError, AuthResult};

pub mod market {
    pub mod auth {
        pub mod v1 {
            tonic::include_proto!("market.auth.v1");
        }
    }
}
