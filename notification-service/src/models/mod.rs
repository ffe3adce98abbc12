use chrono::{DateTime, Utc};
use prost_types::Timestamp;
use uuid::Uuid;

use crate::market::notification::v1 as pb;

/// What a notification is about. Stored as text; the wire form is the proto
/// enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Message,
    Feedback,
    OrderUpdate,
    System,
    Promo,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Message => "message",
            NotificationKind::Feedback => "feedback",
            NotificationKind::OrderUpdate => "order_update",
            NotificationKind::System => "system",
            NotificationKind::Promo => "promo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "message" => Some(NotificationKind::Message),
            "feedback" => Some(NotificationKind::Feedback),
            "order_update" => Some(NotificationKind::OrderUpdate),
            "system" => Some(NotificationKind::System),
            "promo" => Some(NotificationKind::Promo),
            _ => None,
        }
    }

    /// `None` for the unspecified value: a create request must name a kind.
    pub fn from_proto(kind: pb::NotificationKind) -> Option<Self> {
        match kind {
            pb::NotificationKind::Unspecified => None,
            pb::NotificationKind::Message => Some(NotificationKind::Message),
            pb::NotificationKind::Feedback => Some(NotificationKind::Feedback),
            pb::NotificationKind::OrderUpdate => Some(NotificationKind::OrderUpdate),
            pb::NotificationKind::System => Some(NotificationKind::System),
            pb::NotificationKind::Promo => Some(NotificationKind::Promo),
        }
    }

    pub fn to_proto(self) -> pb::NotificationKind {
        match self {
            NotificationKind::Message => pb::NotificationKind::Message,
            NotificationKind::Feedback => pb::NotificationKind::Feedback,
            NotificationKind::OrderUpdate => pb::NotificationKind::OrderUpdate,
            NotificationKind::System => pb::NotificationKind::System,
            NotificationKind::Promo => pb::NotificationKind::Promo,
        }
    }
}

/// Immutable once created; persisted first, then broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub listing_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn into_proto(self) -> pb::Notification {
        pb::Notification {
            id: self.id.to_string(),
            title: self.title,
            body: self.body,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            kind: self.kind.to_proto() as i32,
            created_at: Some(Timestamp {
                seconds: self.created_at.timestamp(),
                nanos: self.created_at.timestamp_subsec_nanos() as i32,
            }),
            listing_id: self.listing_id,
        }
    }
}
