//! UseCase: 参加者切断処理（-> Closed）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - スロットを所有している場合のみ解除されること（古い close のガード）
//!
//! ### なぜこのテストが必要か
//! - 置き換えられた古い接続の close が、新しい接続を追い出してはならない
//! - 両者が切断したらルームがレジストリから削除される
//!
//! ### どのような状況を想定しているか
//! - 正常系：切断と相手への peer-left 通知
//! - エッジケース：古い接続の遅れた close、2 回目の close、Open 前の close

use std::sync::Arc;

use carelink_shared::time::get_jst_timestamp;

use crate::{
    domain::{Connection, ConnectionState, SessionRegistry},
    infrastructure::dto::websocket::{MessageType, PeerLeftMessage},
};

use super::presence::announce;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<dyn SessionRegistry>,
}

impl DisconnectParticipantUseCase {
    pub fn new(registry: Arc<dyn SessionRegistry>) -> Self {
        Self { registry }
    }

    /// 切断を実行
    ///
    /// 何度呼んでも安全。Open にならなかった接続はレジストリに触れない。
    ///
    /// # Returns
    ///
    /// この接続がスロットを解放したかどうか
    pub async fn execute(&self, connection: &mut Connection) -> bool {
        let previous = connection.close();
        if previous == ConnectionState::Connecting {
            tracing::debug!(
                connection_id = %connection.id,
                "Connection closed before open; nothing to release"
            );
            return false;
        }

        let room_key = connection.room_key().clone();
        let released = self
            .registry
            .unregister(&room_key, connection.role, connection.id)
            .await;

        if !released {
            tracing::debug!(
                connection_id = %connection.id,
                room_key = %room_key,
                role = %connection.role,
                "Connection closed; slot not owned"
            );
            return false;
        }

        let peers = self.registry.peers(&room_key, connection.role).await;
        let left = PeerLeftMessage {
            r#type: MessageType::PeerLeft,
            room_key: room_key.as_str().to_string(),
            role: connection.role,
            disconnected_at: get_jst_timestamp(),
        };
        announce(&peers, &left);

        tracing::info!(
            connection_id = %connection.id,
            room_key = %room_key,
            role = %connection.role,
            "Connection closed"
        );
        true
    }

    /// 現在アクティブなルーム数
    pub async fn count_active_rooms(&self) -> usize {
        self.registry.room_count().await
    }
}
