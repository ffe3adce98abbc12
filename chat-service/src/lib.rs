pub mod config;
pub mod db;
pub mod error;
pub mod grpc;
pub mod models;
pub mod services;

pub use error::{ChatError, ChatResult};

pub mod market {
    pub mod chat {
        pub mod v1 {
            tonic::include_proto!("market.chat.v1");
        }
    }
}
