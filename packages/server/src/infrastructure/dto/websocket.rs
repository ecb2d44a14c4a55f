//! WebSocket message DTOs for the chat bridge.

use serde::{Deserialize, Serialize};

use crate::domain::{InboundMessage, Role};

/// Message type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    RoomConnected,
    PeerJoined,
    PeerLeft,
    Chat,
}

/// Envelope received from a client.
///
/// Only `type` and `content` are required. The identity fields are advisory:
/// the router always uses the identity registered for the connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEnvelope {
    pub r#type: MessageType,
    pub content: String,
    #[serde(default)]
    pub room_key: Option<String>,
    #[serde(default)]
    pub sender_role: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
}

/// First frame sent to a connection once it is open
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConnectedMessage {
    pub r#type: MessageType,
    pub room_key: String,
    pub role: Role,
    pub peer_online: bool,
}

/// Peer joined notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerJoinedMessage {
    pub r#type: MessageType,
    pub room_key: String,
    pub role: Role,
    pub connected_at: i64,
}

/// Peer left notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerLeftMessage {
    pub r#type: MessageType,
    pub room_key: String,
    pub role: Role,
    pub disconnected_at: i64,
}

/// Chat message relayed to the peer (canonical form)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub r#type: MessageType,
    pub room_key: String,
    pub sender_role: Role,
    pub sender_id: String,
    pub content: String,
    pub timestamp: i64,
}

impl From<&InboundMessage> for ChatMessage {
    fn from(message: &InboundMessage) -> Self {
        Self {
            r#type: MessageType::Chat,
            room_key: message.room_key.as_str().to_string(),
            sender_role: message.sender_role,
            sender_id: message.sender_id.as_str().to_string(),
            content: message.body.as_str().to_string(),
            timestamp: message.received_at.value(),
        }
    }
}
