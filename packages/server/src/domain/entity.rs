//! Core domain models for the chat bridge.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{
    error::LifecycleError,
    value_object::{ChatRoomKey, ConnectionId, MessageBody, Role, Timestamp, UserId},
};

/// Pairing of exactly one patient with one medical staff member.
///
/// Immutable once created by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoom {
    pub key: ChatRoomKey,
    pub patient_id: UserId,
    pub staff_id: UserId,
    pub created_at: Timestamp,
}

impl ChatRoom {
    pub fn new(
        key: ChatRoomKey,
        patient_id: UserId,
        staff_id: UserId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            key,
            patient_id,
            staff_id,
            created_at,
        }
    }

    /// Identity of the party holding `role` in this room.
    pub fn participant(&self, role: Role) -> &UserId {
        match role {
            Role::Patient => &self.patient_id,
            Role::Staff => &self.staff_id,
        }
    }
}

/// Lifecycle of a single connection. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    /// Validate a transition and return the resulting state.
    ///
    /// `Closed -> Closed` is accepted so that closing twice is harmless.
    pub fn transition(self, to: ConnectionState) -> Result<ConnectionState, LifecycleError> {
        use ConnectionState::*;
        match (self, to) {
            (Connecting, Open) | (Connecting, Closed) | (Open, Closed) | (Closed, Closed) => Ok(to),
            (from, to) => Err(LifecycleError::InvalidTransition { from, to }),
        }
    }
}

/// Non-owning reference to a live connection: its id plus the sending half
/// of its bounded outbound queue.
///
/// The transport owns the socket; dropping a handle never closes it.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<String>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, outbound: mpsc::Sender<String>) -> Self {
        Self { id, outbound }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn outbound(&self) -> &mpsc::Sender<String> {
        &self.outbound
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// A connection as seen by the core: identity resolved once at
/// connection-establishment time, plus its lifecycle state.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub role: Role,
    pub room: ChatRoom,
    pub connected_at: Timestamp,
    state: ConnectionState,
}

impl Connection {
    /// Create a connection in the `Connecting` state.
    pub fn new(id: ConnectionId, role: Role, room: ChatRoom, connected_at: Timestamp) -> Self {
        Self {
            id,
            role,
            room,
            connected_at,
            state: ConnectionState::Connecting,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn room_key(&self) -> &ChatRoomKey {
        &self.room.key
    }

    /// Authoritative identity of whoever sends on this connection.
    pub fn sender_id(&self) -> &UserId {
        self.room.participant(self.role)
    }

    /// Identity of the party on the other side of the room.
    pub fn recipient_id(&self) -> &UserId {
        self.room.participant(self.role.opposite())
    }

    /// `Connecting -> Open`
    pub fn open(&mut self) -> Result<(), LifecycleError> {
        self.state = self.state.transition(ConnectionState::Open)?;
        Ok(())
    }

    /// Move to `Closed` from any state, returning the state it left.
    pub fn close(&mut self) -> ConnectionState {
        std::mem::replace(&mut self.state, ConnectionState::Closed)
    }
}

/// The live connections of one chat room: at most one per role.
#[derive(Debug, Clone, Default)]
pub struct SessionSlotPair {
    patient: Option<ConnectionHandle>,
    staff: Option<ConnectionHandle>,
}

impl SessionSlotPair {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<ConnectionHandle> {
        match role {
            Role::Patient => &mut self.patient,
            Role::Staff => &mut self.staff,
        }
    }

    pub fn occupant(&self, role: Role) -> Option<&ConnectionHandle> {
        match role {
            Role::Patient => self.patient.as_ref(),
            Role::Staff => self.staff.as_ref(),
        }
    }

    /// Put `handle` into the slot for `role`, returning the displaced occupant.
    pub fn set(&mut self, role: Role, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        self.slot_mut(role).replace(handle)
    }

    /// Clear the slot for `role` only if it is held by `id`.
    pub fn clear_if_owned(&mut self, role: Role, id: ConnectionId) -> bool {
        let slot = self.slot_mut(role);
        if slot.as_ref().is_some_and(|h| h.id() == id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// Registered connections other than the one holding `excluding`.
    pub fn peers(&self, excluding: Role) -> Vec<ConnectionHandle> {
        self.occupant(excluding.opposite())
            .cloned()
            .into_iter()
            .collect()
    }

    pub fn is_idle(&self) -> bool {
        self.patient.is_none() && self.staff.is_none()
    }
}

/// Point-in-time view of one room's slots, for introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub room_key: ChatRoomKey,
    pub patient: Option<ConnectionId>,
    pub staff: Option<ConnectionId>,
}

impl SessionSnapshot {
    pub fn of(room_key: ChatRoomKey, pair: &SessionSlotPair) -> Self {
        Self {
            room_key,
            patient: pair.occupant(Role::Patient).map(ConnectionHandle::id),
            staff: pair.occupant(Role::Staff).map(ConnectionHandle::id),
        }
    }
}

/// A decoded chat message, stamped with the sending connection's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub room_key: ChatRoomKey,
    pub sender_role: Role,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub body: MessageBody,
    pub received_at: Timestamp,
}

impl InboundMessage {
    pub fn from_connection(
        connection: &Connection,
        body: MessageBody,
        received_at: Timestamp,
    ) -> Self {
        Self {
            room_key: connection.room_key().clone(),
            sender_role: connection.role,
            sender_id: connection.sender_id().clone(),
            recipient_id: connection.recipient_id().clone(),
            body,
            received_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::factory::{ChatRoomKeyFactory, ConnectionIdFactory};

    fn room() -> ChatRoom {
        let patient = UserId::new("42".to_string()).unwrap();
        let staff = UserId::new("7".to_string()).unwrap();
        ChatRoom::new(
            ChatRoomKeyFactory::for_pair(&staff, &patient),
            patient,
            staff,
            Timestamp::new(0),
        )
    }

    fn handle() -> (ConnectionHandle, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(4);
        (ConnectionHandle::new(ConnectionIdFactory::generate(), tx), rx)
    }

    #[test]
    fn test_connection_state_transitions() {
        // テスト項目: 許可された遷移のみ成功する
        use ConnectionState::*;

        // then (期待する結果):
        assert_eq!(Connecting.transition(Open), Ok(Open));
        assert_eq!(Connecting.transition(Closed), Ok(Closed));
        assert_eq!(Open.transition(Closed), Ok(Closed));
        assert_eq!(Closed.transition(Closed), Ok(Closed));
        assert_eq!(
            Closed.transition(Open),
            Err(LifecycleError::InvalidTransition {
                from: Closed,
                to: Open
            })
        );
        assert!(Open.transition(Connecting).is_err());
        assert!(Open.transition(Open).is_err());
    }

    #[test]
    fn test_connection_identity_follows_role() {
        // テスト項目: 送信者と受信者の ID は接続のロールから決まる
        // given (前提条件):
        let patient_conn = Connection::new(
            ConnectionIdFactory::generate(),
            Role::Patient,
            room(),
            Timestamp::new(1),
        );
        let staff_conn = Connection::new(
            ConnectionIdFactory::generate(),
            Role::Staff,
            room(),
            Timestamp::new(1),
        );

        // then (期待する結果):
        assert_eq!(patient_conn.sender_id().as_str(), "42");
        assert_eq!(patient_conn.recipient_id().as_str(), "7");
        assert_eq!(staff_conn.sender_id().as_str(), "7");
        assert_eq!(staff_conn.recipient_id().as_str(), "42");
        assert_eq!(patient_conn.room_key().as_str(), "7_42");
    }

    #[test]
    fn test_connection_open_then_close_twice() {
        // テスト項目: Open の後の Close は 2 回目が no-op になる
        // given (前提条件):
        let mut conn = Connection::new(
            ConnectionIdFactory::generate(),
            Role::Patient,
            room(),
            Timestamp::new(1),
        );

        // when (操作):
        conn.open().unwrap();
        let first = conn.close();
        let second = conn.close();

        // then (期待する結果):
        assert_eq!(first, ConnectionState::Open);
        assert_eq!(second, ConnectionState::Closed);
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(conn.open().is_err());
    }

    #[test]
    fn test_slot_pair_set_replaces_and_returns_previous() {
        // テスト項目: 同じロールへの登録は以前の接続を置き換えて返す
        // given (前提条件):
        let mut pair = SessionSlotPair::new();
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();

        // when (操作):
        let first = pair.set(Role::Patient, a.clone());
        let second = pair.set(Role::Patient, b.clone());

        // then (期待する結果):
        assert!(first.is_none());
        assert_eq!(second.map(|h| h.id()), Some(a.id()));
        assert_eq!(pair.occupant(Role::Patient).map(|h| h.id()), Some(b.id()));
    }

    #[test]
    fn test_slot_pair_clear_requires_ownership() {
        // テスト項目: 現在の占有者以外による解除は無視される
        // given (前提条件):
        let mut pair = SessionSlotPair::new();
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();
        pair.set(Role::Patient, a.clone());
        pair.set(Role::Patient, b.clone());

        // when (操作):
        let stale = pair.clear_if_owned(Role::Patient, a.id());
        let owner = pair.clear_if_owned(Role::Patient, b.id());

        // then (期待する結果):
        assert!(!stale);
        assert!(owner);
        assert!(pair.is_idle());
    }

    #[test]
    fn test_slot_pair_peers_excludes_own_role() {
        // テスト項目: peers は相手ロールの接続だけを返す
        // given (前提条件):
        let mut pair = SessionSlotPair::new();
        let (p, _rx_p) = handle();
        let (s, _rx_s) = handle();
        pair.set(Role::Patient, p.clone());

        // then (期待する結果): 相手がいなければ空
        assert!(pair.peers(Role::Patient).is_empty());

        pair.set(Role::Staff, s.clone());
        let peers = pair.peers(Role::Patient);
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].id(), s.id());
        assert_eq!(pair.peers(Role::Staff)[0].id(), p.id());
    }
}
