use chrono::{DateTime, Utc};
use prost_types::Timestamp;

use crate::market::chat::v1::ChatFrame;

/// Durable form of a chat message. Created once on receipt, persisted, then
/// dropped from memory after forwarding.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: String,
    pub text: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    /// Snapshot of an already-stamped wire frame.
    pub fn from_frame(frame: &ChatFrame) -> Self {
        let created_at = frame
            .created_at
            .as_ref()
            .and_then(timestamp_to_datetime)
            .unwrap_or_else(Utc::now);

        Self {
            id: frame.id.clone(),
            text: frame.text.clone(),
            sender_id: frame.sender_id.clone(),
            receiver_id: frame.receiver_id.clone(),
            created_at,
        }
    }

    pub fn into_frame(self) -> ChatFrame {
        ChatFrame {
            id: self.id,
            text: self.text,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            created_at: Some(datetime_to_timestamp(self.created_at)),
        }
    }
}

pub fn timestamp_to_datetime(ts: &Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.seconds, ts.nanos.try_into().ok()?)
}

pub fn datetime_to_timestamp(dt: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}
