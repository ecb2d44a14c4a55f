//! InMemory MessageStore 実装
//!
//! 永続化コラボレーターの単一インスタンス向け代替。プロセス終了で履歴は失われます。
//! 容量を超えると最も古いメッセージから破棄されます（リングバッファ）。

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatRoomKey, CollaboratorError, InboundMessage, MessageId, MessageStore};

/// Default maximum number of messages kept in memory
pub const DEFAULT_MESSAGE_CAPACITY: usize = 10_000;

/// A message as recorded by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: MessageId,
    pub message: InboundMessage,
}

pub struct InMemoryMessageStore {
    next_id: AtomicU64,
    messages: Mutex<VecDeque<StoredMessage>>,
    capacity: usize,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MESSAGE_CAPACITY)
    }

    /// `capacity` is clamped to at least one message.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            messages: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// History of one room, oldest first.
    pub async fn list_by_room(&self, room_key: &ChatRoomKey) -> Vec<StoredMessage> {
        let messages = self.messages.lock().await;
        messages
            .iter()
            .filter(|m| &m.message.room_key == room_key)
            .cloned()
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.messages.lock().await.len()
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save_message(
        &self,
        message: &InboundMessage,
    ) -> Result<MessageId, CollaboratorError> {
        let mut messages = self.messages.lock().await;
        while messages.len() >= self.capacity {
            if let Some(evicted) = messages.pop_front() {
                tracing::debug!(
                    room_key = %evicted.message.room_key,
                    message_id = evicted.id.value(),
                    "Evicted oldest message"
                );
            }
        }
        let id = MessageId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        messages.push_back(StoredMessage {
            id,
            message: message.clone(),
        });
        Ok(id)
    }
}
