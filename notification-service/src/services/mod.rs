pub mod hub;

pub use hub::{NewNotification, NotificationHub, NotificationRegistry};
