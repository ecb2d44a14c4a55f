//! HTTP API response DTOs for the chat bridge.

use serde::{Deserialize, Serialize};

use crate::{domain::SessionSnapshot, infrastructure::repository::inmemory::StoredMessage};

/// Live session of one room for the sessions endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDto {
    pub room_key: String,
    pub patient_connection: Option<String>,
    pub staff_connection: Option<String>,
}

impl From<SessionSnapshot> for SessionDto {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            room_key: snapshot.room_key.as_str().to_string(),
            patient_connection: snapshot.patient.map(|id| id.to_string()),
            staff_connection: snapshot.staff.map(|id| id.to_string()),
        }
    }
}

/// Stored message for the history endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: u64,
    pub sender_role: String,
    pub sender_id: String,
    pub content: String,
    pub sent_at: String, // ISO 8601
}

impl From<StoredMessage> for MessageDto {
    fn from(stored: StoredMessage) -> Self {
        Self {
            id: stored.id.value(),
            sender_role: stored.message.sender_role.as_str().to_string(),
            sender_id: stored.message.sender_id.into_string(),
            content: stored.message.body.as_str().to_string(),
            sent_at: carelink_shared::time::timestamp_to_jst_rfc3339(
                stored.message.received_at.value(),
            ),
        }
    }
}
