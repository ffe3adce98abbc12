pub mod config;
pub mod db;
pub mod error;
pub mod grpc;
pub mod models;
pub mod services;

pub use error::{NotificationError, NotificationResult};

pub mod market {
    pub mod notification {
        pub mod v1 {
            tonic::include_proto!("market.notification.v1");
        }
    }
}
