//! UseCase: メッセージ中継処理（Message Router）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - デコード、相手接続への中継、コラボレーターへの転送
//!
//! ### なぜこのテストが必要か
//! - 両ロールが接続中なら相手にちょうど 1 回届く
//! - 相手が不在でも永続化には渡される
//! - 不正なペイロードは中継も永続化もされない
//! - 遅い相手が送信者をブロックし続けない
//!
//! ### どのような状況を想定しているか
//! - 正常系：患者 -> スタッフ、スタッフ -> 患者の中継
//! - 異常系：不正な JSON、空の本文、Open でない接続
//! - エッジケース：相手不在、相手のキューが満杯、相手が閉じている、送信順序

use std::{sync::Arc, time::Duration};

use carelink_shared::time::get_jst_timestamp;
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::{
    domain::{
        Connection, ConnectionHandle, ConnectionState, InboundMessage, MessageBody,
        SessionRegistry, Timestamp,
    },
    infrastructure::dto::websocket::{ChatMessage, InboundEnvelope, MessageType},
};

use super::{dispatch::CollaboratorDispatcher, error::SendMessageError};

/// Default bound on a single send to a peer
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(2);

/// 中継結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOutcome {
    /// 中継対象（相手ロール）の接続数
    pub peers: usize,
    /// 実際に送信キューへ入った数
    pub delivered: usize,
}

/// メッセージ中継のユースケース
pub struct SendMessageUseCase {
    registry: Arc<dyn SessionRegistry>,
    dispatcher: CollaboratorDispatcher,
    relay_timeout: Duration,
}

impl SendMessageUseCase {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        dispatcher: CollaboratorDispatcher,
        relay_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            relay_timeout,
        }
    }

    /// メッセージ中継を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信元の接続（ID とロールはここから取る）
    /// * `payload` - 受信したテキストフレーム
    ///
    /// # Returns
    ///
    /// * `Ok(RelayOutcome)` - 中継結果（相手不在はエラーではない）
    /// * `Err(SendMessageError)` - このメッセージは破棄された
    pub async fn execute(
        &self,
        sender: &Connection,
        payload: &str,
    ) -> Result<RelayOutcome, SendMessageError> {
        if sender.state() != ConnectionState::Open {
            return Err(SendMessageError::ConnectionNotOpen);
        }

        // 1. デコード（ID は接続から）
        let message = decode(sender, payload, Timestamp::new(get_jst_timestamp()))?;
        let frame = serde_json::to_string(&ChatMessage::from(&message))
            .map_err(|e| SendMessageError::MalformedPayload(e.to_string()))?;

        // 2. 永続化・分類・通知はキューに積むだけ（中継を待たせない）
        self.dispatcher.dispatch(message.clone());

        // 3. 相手接続へ中継
        let peers = self
            .registry
            .peers(&message.room_key, message.sender_role)
            .await;
        if peers.is_empty() {
            tracing::debug!(
                room_key = %message.room_key,
                role = %message.sender_role,
                "No peer online; message not relayed"
            );
        }

        let mut delivered = 0;
        for peer in &peers {
            if self.relay_to(peer, frame.clone(), &message).await {
                delivered += 1;
            }
        }

        Ok(RelayOutcome {
            peers: peers.len(),
            delivered,
        })
    }

    /// 1 つの相手へ送信する。失敗はログのみで、相手のスロットは解放しない。
    async fn relay_to(
        &self,
        peer: &ConnectionHandle,
        frame: String,
        message: &InboundMessage,
    ) -> bool {
        if peer.is_closed() {
            tracing::debug!(
                connection_id = %peer.id(),
                room_key = %message.room_key,
                "Peer already closed; skipping relay"
            );
            return false;
        }

        match peer.outbound().send_timeout(frame, self.relay_timeout).await {
            Ok(()) => {
                tracing::debug!(
                    connection_id = %peer.id(),
                    room_key = %message.room_key,
                    "Relayed message"
                );
                true
            }
            Err(SendTimeoutError::Timeout(_)) => {
                tracing::warn!(
                    connection_id = %peer.id(),
                    room_key = %message.room_key,
                    timeout_ms = self.relay_timeout.as_millis() as u64,
                    "Relay send timed out"
                );
                false
            }
            Err(SendTimeoutError::Closed(_)) => {
                tracing::warn!(
                    connection_id = %peer.id(),
                    room_key = %message.room_key,
                    "Relay send failed: peer closed"
                );
                false
            }
        }
    }
}

/// ペイロードを InboundMessage に変換する
///
/// エンベロープ内の ID・ロール・ルームキーは参考情報としてのみ扱う。
fn decode(
    sender: &Connection,
    payload: &str,
    received_at: Timestamp,
) -> Result<InboundMessage, SendMessageError> {
    let envelope: InboundEnvelope = serde_json::from_str(payload)
        .map_err(|e| SendMessageError::MalformedPayload(e.to_string()))?;

    if envelope.r#type != MessageType::Chat {
        return Err(SendMessageError::MalformedPayload(format!(
            "unsupported message type: {:?}",
            envelope.r#type
        )));
    }

    let advisory_mismatch = envelope
        .room_key
        .as_deref()
        .is_some_and(|k| k != sender.room_key().as_str())
        || envelope
            .sender_role
            .as_deref()
            .is_some_and(|r| r != sender.role.as_str())
        || envelope
            .sender_id
            .as_deref()
            .is_some_and(|id| id != sender.sender_id().as_str());
    if advisory_mismatch {
        tracing::debug!(
            connection_id = %sender.id,
            room_key = %sender.room_key(),
            "Envelope identity differs from connection; using connection identity"
        );
    }

    let body = MessageBody::new(envelope.content)
        .map_err(|e| SendMessageError::MalformedPayload(e.to_string()))?;

    Ok(InboundMessage::from_connection(sender, body, received_at))
}
