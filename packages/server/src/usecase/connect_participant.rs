//! UseCase: 参加者接続処理（Connecting -> Open）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::resolve() / execute() メソッド
//! - 接続メタデータからのルーム解決と、Session Registry への登録
//!
//! ### なぜこのテストが必要か
//! - 存在しない患者の接続はレジストリに到達してはならない
//! - 同じロールの再接続は以前の接続を置き換える（後勝ち）
//! - 相手側に参加通知が届くことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：スタッフ・患者の接続と登録
//! - 異常系：存在しない患者、不正な ID
//! - エッジケース：同じロールでの再接続

use std::sync::Arc;

use carelink_shared::time::get_jst_timestamp;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ChatRoomRepository, Connection, ConnectionHandle, ConnectionId, ConnectionIdFactory, Role,
        SessionRegistry, Timestamp, UserId,
    },
    infrastructure::dto::websocket::{MessageType, PeerJoinedMessage},
};

use super::{error::ConnectError, presence::announce};

/// 接続が Open になった時点の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedSession {
    /// 相手ロールの接続が登録済みか
    pub peer_online: bool,
    /// 置き換えられた以前の接続（同じルーム・同じロール）
    pub replaced: Option<ConnectionId>,
}

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    directory: Arc<dyn ChatRoomRepository>,
    registry: Arc<dyn SessionRegistry>,
}

impl ConnectParticipantUseCase {
    pub fn new(directory: Arc<dyn ChatRoomRepository>, registry: Arc<dyn SessionRegistry>) -> Self {
        Self {
            directory,
            registry,
        }
    }

    /// Connecting: 接続メタデータからルームと ID を解決する
    ///
    /// 失敗した接続はレジストリに一切触れずに Closed となる。
    ///
    /// # Arguments
    ///
    /// * `patient_id` - クエリパラメータの患者 ID（未検証）
    /// * `role` - 接続パスから決まるロール
    pub async fn resolve(&self, patient_id: &str, role: Role) -> Result<Connection, ConnectError> {
        let patient_id = UserId::new(patient_id.to_string())?;
        let room = match self.directory.resolve_or_create(&patient_id).await {
            Ok(room) => room,
            Err(e) => {
                tracing::warn!(
                    patient_id = %patient_id,
                    role = %role,
                    "Rejecting connection: {}",
                    e
                );
                return Err(e.into());
            }
        };

        let connection = Connection::new(
            ConnectionIdFactory::generate(),
            role,
            room,
            Timestamp::new(get_jst_timestamp()),
        );
        tracing::debug!(
            connection_id = %connection.id,
            room_key = %connection.room_key(),
            role = %role,
            "Connection resolved"
        );
        Ok(connection)
    }

    /// Open: 接続をレジストリに登録し、相手に参加を通知する
    ///
    /// # Arguments
    ///
    /// * `connection` - resolve() 済みの接続
    /// * `outbound` - この接続の送信キュー
    pub async fn execute(
        &self,
        connection: &mut Connection,
        outbound: mpsc::Sender<String>,
    ) -> Result<OpenedSession, ConnectError> {
        connection.open()?;

        let room_key = connection.room_key().clone();
        let handle = ConnectionHandle::new(connection.id, outbound);
        let replaced = self
            .registry
            .register(&room_key, connection.role, handle)
            .await
            .map(|previous| previous.id());

        if let Some(previous) = replaced {
            tracing::info!(
                room_key = %room_key,
                role = %connection.role,
                previous_connection_id = %previous,
                "Replaced stale connection"
            );
        }

        let peers = self.registry.peers(&room_key, connection.role).await;
        let joined = PeerJoinedMessage {
            r#type: MessageType::PeerJoined,
            room_key: room_key.as_str().to_string(),
            role: connection.role,
            connected_at: connection.connected_at.value(),
        };
        announce(&peers, &joined);

        tracing::info!(
            connection_id = %connection.id,
            room_key = %room_key,
            role = %connection.role,
            "Connection open"
        );

        Ok(OpenedSession {
            peer_online: !peers.is_empty(),
            replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatRoomKey, ConnectionState, ValueObjectError},
        infrastructure::repository::{InMemoryChatRoomRepository, InMemorySessionRegistry},
    };

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn create_test_usecase() -> (ConnectParticipantUseCase, Arc<InMemorySessionRegistry>) {
        let directory = Arc::new(InMemoryChatRoomRepository::new([(user("42"), user("7"))]));
        let registry = Arc::new(InMemorySessionRegistry::new());
        (
            ConnectParticipantUseCase::new(directory, registry.clone()),
            registry,
        )
    }

    fn room_key() -> ChatRoomKey {
        ChatRoomKey::new("7_42".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_success() {
        // テスト項目: 既知の患者 ID でルームが解決される
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();

        // when (操作):
        let connection = usecase.resolve("42", Role::Staff).await.unwrap();

        // then (期待する結果): 解決だけではレジストリに登録されない
        assert_eq!(connection.room_key(), &room_key());
        assert_eq!(connection.state(), ConnectionState::Connecting);
        assert_eq!(connection.sender_id(), &user("7"));
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_resolve_unknown_patient_rejected() {
        // テスト項目: 存在しない患者の接続は PatientNotFound で拒否される
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();

        // when (操作):
        let result = usecase.resolve("999", Role::Patient).await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ConnectError::PatientNotFound("999".to_string())
        );
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_resolve_invalid_identity_rejected() {
        // テスト項目: 空の患者 ID は InvalidIdentity で拒否される
        // given (前提条件):
        let (usecase, _registry) = create_test_usecase();

        // when (操作):
        let result = usecase.resolve("", Role::Patient).await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ConnectError::InvalidIdentity(ValueObjectError::UserIdEmpty)
        );
    }

    #[tokio::test]
    async fn test_resolve_separator_in_patient_id_rejected() {
        // テスト項目: `_` を含む患者 ID は別ルームのキーと衝突しうるため拒否される
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();

        // when (操作):
        let result = usecase.resolve("4_2", Role::Patient).await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ConnectError::InvalidIdentity(ValueObjectError::UserIdInvalidCharacter('_'))
        );
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_execute_registers_and_notifies_peer() {
        // テスト項目: Open で登録され、相手に peer-joined が届く
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();
        let (staff_tx, mut staff_rx) = mpsc::channel(8);
        let (patient_tx, _patient_rx) = mpsc::channel(8);

        let mut staff = usecase.resolve("42", Role::Staff).await.unwrap();
        let opened_staff = usecase.execute(&mut staff, staff_tx).await.unwrap();

        // when (操作):
        let mut patient = usecase.resolve("42", Role::Patient).await.unwrap();
        let opened_patient = usecase.execute(&mut patient, patient_tx).await.unwrap();

        // then (期待する結果):
        assert!(!opened_staff.peer_online);
        assert!(opened_patient.peer_online);
        assert_eq!(patient.state(), ConnectionState::Open);

        let snapshot = registry.snapshot(&room_key()).await.unwrap();
        assert_eq!(snapshot.staff, Some(staff.id));
        assert_eq!(snapshot.patient, Some(patient.id));

        let frame: serde_json::Value =
            serde_json::from_str(&staff_rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["type"], "peer-joined");
        assert_eq!(frame["role"], "patient");
        assert_eq!(frame["room_key"], "7_42");
    }

    #[tokio::test]
    async fn test_execute_same_role_replaces_previous() {
        // テスト項目: 同じロールでの再接続は以前の接続を置き換える
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();
        let (tx1, _rx1) = mpsc::channel(8);
        let (tx2, _rx2) = mpsc::channel(8);
        let mut first = usecase.resolve("42", Role::Patient).await.unwrap();
        usecase.execute(&mut first, tx1).await.unwrap();

        // when (操作):
        let mut second = usecase.resolve("42", Role::Patient).await.unwrap();
        let opened = usecase.execute(&mut second, tx2).await.unwrap();

        // then (期待する結果):
        assert_eq!(opened.replaced, Some(first.id));
        let snapshot = registry.snapshot(&room_key()).await.unwrap();
        assert_eq!(snapshot.patient, Some(second.id));
    }

    #[tokio::test]
    async fn test_execute_twice_is_invalid_transition() {
        // テスト項目: 既に Open の接続を再度 Open にはできない
        // given (前提条件):
        let (usecase, _registry) = create_test_usecase();
        let (tx, _rx) = mpsc::channel(8);
        let mut connection = usecase.resolve("42", Role::Patient).await.unwrap();
        usecase.execute(&mut connection, tx.clone()).await.unwrap();

        // when (操作):
        let result = usecase.execute(&mut connection, tx).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ConnectError::Lifecycle(_))));
    }
}
