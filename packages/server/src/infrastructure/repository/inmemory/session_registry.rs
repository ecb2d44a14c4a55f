//! InMemory Session Registry 実装
//!
//! ドメイン層が定義する SessionRegistry trait の具体的な実装。
//! `ChatRoomKey -> SessionSlotPair` の HashMap を 1 つの Mutex で保護します。
//! 競合は少ないため、ルーム単位ではなくレジストリ全体をロックする粗い粒度で十分です。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatRoomKey, ConnectionHandle, ConnectionId, Role, SessionRegistry, SessionSlotPair,
    SessionSnapshot,
};

/// インメモリ Session Registry 実装
#[derive(Default)]
pub struct InMemorySessionRegistry {
    rooms: Mutex<HashMap<ChatRoomKey, SessionSlotPair>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn register(
        &self,
        room_key: &ChatRoomKey,
        role: Role,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let mut rooms = self.rooms.lock().await;
        rooms.entry(room_key.clone()).or_default().set(role, handle)
    }

    async fn unregister(
        &self,
        room_key: &ChatRoomKey,
        role: Role,
        connection_id: ConnectionId,
    ) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(pair) = rooms.get_mut(room_key) else {
            return false;
        };
        let cleared = pair.clear_if_owned(role, connection_id);
        if pair.is_idle() {
            rooms.remove(room_key);
        }
        cleared
    }

    async fn peers(&self, room_key: &ChatRoomKey, excluding: Role) -> Vec<ConnectionHandle> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_key)
            .map(|pair| pair.peers(excluding))
            .unwrap_or_default()
    }

    async fn room_count(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }

    async fn snapshot(&self, room_key: &ChatRoomKey) -> Option<SessionSnapshot> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_key)
            .map(|pair| SessionSnapshot::of(room_key.clone(), pair))
    }

    async fn snapshot_all(&self) -> Vec<SessionSnapshot> {
        let rooms = self.rooms.lock().await;
        let mut snapshots: Vec<SessionSnapshot> = rooms
            .iter()
            .map(|(key, pair)| SessionSnapshot::of(key.clone(), pair))
            .collect();
        snapshots.sort_by(|a, b| a.room_key.cmp(&b.room_key));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectionIdFactory;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemorySessionRegistry の register / unregister / peers
    // - ロールごとに最大 1 接続という不変条件
    // - 古い接続の close が新しい接続を追い出さないこと
    // - 両方のスロットが空になったらルームが削除されること
    //
    // 【なぜこのテストが必要か】
    // - レジストリはプロセス全体で共有される唯一の可変状態
    // - 再接続と close イベントの順序が入れ替わっても整合性を保つ必要がある
    // ========================================

    fn key(s: &str) -> ChatRoomKey {
        ChatRoomKey::new(s.to_string()).unwrap()
    }

    fn handle() -> (ConnectionHandle, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectionHandle::new(ConnectionIdFactory::generate(), tx), rx)
    }

    #[tokio::test]
    async fn test_register_creates_room() {
        // テスト項目: 登録するとルームが作成される
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (staff, _rx) = handle();

        // when (操作):
        let evicted = registry.register(&key("7_42"), Role::Staff, staff.clone()).await;

        // then (期待する結果):
        assert!(evicted.is_none());
        assert_eq!(registry.room_count().await, 1);
        let snapshot = registry.snapshot(&key("7_42")).await.unwrap();
        assert_eq!(snapshot.staff, Some(staff.id()));
        assert_eq!(snapshot.patient, None);
    }

    #[tokio::test]
    async fn test_register_same_role_replaces_previous() {
        // テスト項目: 同じロールの再登録は以前の接続を置き換える（後勝ち）
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();
        registry.register(&key("7_42"), Role::Patient, a.clone()).await;

        // when (操作):
        let evicted = registry.register(&key("7_42"), Role::Patient, b.clone()).await;

        // then (期待する結果):
        assert_eq!(evicted.map(|h| h.id()), Some(a.id()));
        let snapshot = registry.snapshot(&key("7_42")).await.unwrap();
        assert_eq!(snapshot.patient, Some(b.id()));
    }

    #[tokio::test]
    async fn test_stale_close_does_not_evict_newer_connection() {
        // テスト項目: 置き換えられた接続 A の close は新しい接続 B を削除しない
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();
        registry.register(&key("7_42"), Role::Patient, a.clone()).await;
        registry.register(&key("7_42"), Role::Patient, b.clone()).await;

        // when (操作): A の close が遅れて到着する
        let cleared = registry.unregister(&key("7_42"), Role::Patient, a.id()).await;

        // then (期待する結果):
        assert!(!cleared);
        let snapshot = registry.snapshot(&key("7_42")).await.unwrap();
        assert_eq!(snapshot.patient, Some(b.id()));
        assert_eq!(registry.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        // テスト項目: 同じ接続の unregister を 2 回呼んでも問題ない
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (a, _rx_a) = handle();
        registry.register(&key("7_42"), Role::Patient, a.clone()).await;

        // when (操作):
        let first = registry.unregister(&key("7_42"), Role::Patient, a.id()).await;
        let second = registry.unregister(&key("7_42"), Role::Patient, a.id()).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_room_evicted_when_both_sides_leave() {
        // テスト項目: 7_42 のシナリオ。両者が切断するとルームが削除される
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let room = key("7_42");
        let (staff, _rx_s) = handle();
        let (patient, _rx_p) = handle();

        // when (操作) / then (期待する結果):
        registry.register(&room, Role::Staff, staff.clone()).await;
        registry.register(&room, Role::Patient, patient.clone()).await;
        let snapshot = registry.snapshot(&room).await.unwrap();
        assert_eq!(snapshot.patient, Some(patient.id()));
        assert_eq!(snapshot.staff, Some(staff.id()));

        registry.unregister(&room, Role::Staff, staff.id()).await;
        let snapshot = registry.snapshot(&room).await.unwrap();
        assert_eq!(snapshot.patient, Some(patient.id()));
        assert_eq!(snapshot.staff, None);

        registry.unregister(&room, Role::Patient, patient.id()).await;
        assert!(registry.snapshot(&room).await.is_none());
        assert_eq!(registry.room_count().await, 0);

        // 再登録すると以前の状態を引き継がない新しいペアになる
        let (again, _rx_again) = handle();
        registry.register(&room, Role::Patient, again.clone()).await;
        let snapshot = registry.snapshot(&room).await.unwrap();
        assert_eq!(snapshot.staff, None);
        assert_eq!(snapshot.patient, Some(again.id()));
    }

    #[tokio::test]
    async fn test_peers_returns_opposite_role_only() {
        // テスト項目: peers は送信者と反対のロールの接続のみを返す
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let room = key("7_42");
        let (staff, _rx_s) = handle();
        let (patient, _rx_p) = handle();

        // then (期待する結果): ルームが無ければ空
        assert!(registry.peers(&room, Role::Patient).await.is_empty());

        registry.register(&room, Role::Patient, patient.clone()).await;
        assert!(registry.peers(&room, Role::Patient).await.is_empty());

        registry.register(&room, Role::Staff, staff.clone()).await;
        let peers = registry.peers(&room, Role::Patient).await;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].id(), staff.id());
    }

    #[tokio::test]
    async fn test_concurrent_churn_keeps_pairing_invariant() {
        // テスト項目: 並行して登録・解除しても各ロール最大 1 接続が保たれる
        // given (前提条件):
        let registry = Arc::new(InMemorySessionRegistry::new());
        let room = key("7_42");

        // when (操作):
        let mut tasks = Vec::new();
        for i in 0..32 {
            let registry = registry.clone();
            let room = room.clone();
            tasks.push(tokio::spawn(async move {
                let role = if i % 2 == 0 { Role::Patient } else { Role::Staff };
                let (h, _rx) = handle();
                registry.register(&room, role, h.clone()).await;
                tokio::task::yield_now().await;
                if i % 3 == 0 {
                    registry.unregister(&room, role, h.id()).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // then (期待する結果):
        assert!(registry.room_count().await <= 1);
        if let Some(snapshot) = registry.snapshot(&room).await {
            assert!(snapshot.patient.is_some() || snapshot.staff.is_some());
        }
        assert!(registry.peers(&room, Role::Patient).await.len() <= 1);
        assert!(registry.peers(&room, Role::Staff).await.len() <= 1);
    }
}
