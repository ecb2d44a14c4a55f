//! インメモリ実装
//!
//! 単一インスタンス構成向け。複数インスタンス構成では共有 KVS などの実装に差し替える。

pub mod chat_room;
pub mod message_store;
pub mod session_registry;

pub use chat_room::InMemoryChatRoomRepository;
pub use message_store::{InMemoryMessageStore, StoredMessage};
pub use session_registry::InMemorySessionRegistry;
