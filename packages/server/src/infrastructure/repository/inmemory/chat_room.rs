//! InMemory ChatRoom Repository 実装
//!
//! 患者ごとの担当スタッフ（起動時に与えられる割り当て）をもとに、
//! 初回解決時にチャットルームを作成します。

use std::collections::HashMap;

use async_trait::async_trait;
use carelink_shared::time::get_jst_timestamp;
use tokio::sync::Mutex;

use crate::domain::{
    ChatRoom, ChatRoomKeyFactory, ChatRoomRepository, DirectoryError, Timestamp, UserId,
};

/// インメモリ ChatRoom Repository 実装
pub struct InMemoryChatRoomRepository {
    /// 患者 ID -> 担当スタッフ ID（起動後は不変）
    assignments: HashMap<UserId, UserId>,
    /// 患者 ID -> 作成済みチャットルーム
    rooms: Mutex<HashMap<UserId, ChatRoom>>,
}

impl InMemoryChatRoomRepository {
    pub fn new(assignments: impl IntoIterator<Item = (UserId, UserId)>) -> Self {
        Self {
            assignments: assignments.into_iter().collect(),
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// 作成済みのチャットルーム数
    pub async fn count_rooms(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

#[async_trait]
impl ChatRoomRepository for InMemoryChatRoomRepository {
    async fn resolve_or_create(&self, patient_id: &UserId) -> Result<ChatRoom, DirectoryError> {
        let staff_id = self
            .assignments
            .get(patient_id)
            .ok_or_else(|| DirectoryError::PatientNotFound(patient_id.to_string()))?;

        let mut rooms = self.rooms.lock().await;
        let room = rooms.entry(patient_id.clone()).or_insert_with(|| {
            tracing::info!(
                patient_id = %patient_id,
                staff_id = %staff_id,
                "Creating chat room"
            );
            ChatRoom::new(
                ChatRoomKeyFactory::for_pair(staff_id, patient_id),
                patient_id.clone(),
                staff_id.clone(),
                Timestamp::new(get_jst_timestamp()),
            )
        });
        Ok(room.clone())
    }
}
