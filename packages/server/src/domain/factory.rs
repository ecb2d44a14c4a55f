//! Domain factories for creating domain entities and value objects.

use super::{ChatRoomKey, ConnectionId, UserId};

/// Factory for building canonical chat room keys.
///
/// The key is `<staff_id>_<patient_id>`, so the same pair always maps to the
/// same room.
pub struct ChatRoomKeyFactory;

impl ChatRoomKeyFactory {
    pub fn for_pair(staff_id: &UserId, patient_id: &UserId) -> ChatRoomKey {
        ChatRoomKey::from_user_ids(staff_id, patient_id)
    }
}

/// Factory for generating ConnectionId instances.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    pub fn generate() -> ConnectionId {
        ConnectionId::from_uuid(uuid::Uuid::new_v4())
    }
}
