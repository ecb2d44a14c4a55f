//! Repository traits owned by the domain layer.
//!
//! Infrastructure provides the implementations; use cases depend only on
//! these traits (dependency inversion).

use async_trait::async_trait;

use super::{
    ChatRoom, ChatRoomKey, ConnectionHandle, ConnectionId, DirectoryError, Role, SessionSnapshot,
    UserId,
};

/// Chat room directory: resolves a connecting patient to its chat room.
#[async_trait]
pub trait ChatRoomRepository: Send + Sync {
    /// Return the patient's chat room, creating it on first use.
    ///
    /// Idempotent: repeated calls for the same patient return the same room.
    ///
    /// # Errors
    ///
    /// `DirectoryError::PatientNotFound` if the patient is unknown.
    async fn resolve_or_create(&self, patient_id: &UserId) -> Result<ChatRoom, DirectoryError>;
}

/// Process-wide table of live connections per chat room.
///
/// Every operation is atomic with respect to the same room key. The backend
/// is pluggable (in-process map, shared key-value store, ...).
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Occupy the `role` slot of `room_key`, creating the pair if absent.
    /// Returns the connection it displaced, if any.
    async fn register(
        &self,
        room_key: &ChatRoomKey,
        role: Role,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle>;

    /// Clear the `role` slot only if it is still held by `connection_id`.
    /// Drops the room entry once both slots are empty.
    ///
    /// Returns whether the slot was cleared.
    async fn unregister(
        &self,
        room_key: &ChatRoomKey,
        role: Role,
        connection_id: ConnectionId,
    ) -> bool;

    /// Live connections in `room_key` other than the `excluding` role.
    async fn peers(&self, room_key: &ChatRoomKey, excluding: Role) -> Vec<ConnectionHandle>;

    /// Number of rooms with at least one live connection.
    async fn room_count(&self) -> usize;

    /// Current slots of one room.
    async fn snapshot(&self, room_key: &ChatRoomKey) -> Option<SessionSnapshot>;

    /// Current slots of every live room, ordered by room key.
    async fn snapshot_all(&self) -> Vec<SessionSnapshot>;
}
