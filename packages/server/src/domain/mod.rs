//! Domain layer for the chat bridge.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod collaborator;
pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use collaborator::{Classifier, MessageStore, Notifier};
#[cfg(test)]
pub use collaborator::{MockClassifier, MockMessageStore, MockNotifier};
pub use entity::{
    ChatRoom, Connection, ConnectionHandle, ConnectionState, InboundMessage, SessionSlotPair,
    SessionSnapshot,
};
pub use error::{CollaboratorError, DirectoryError, LifecycleError, ValueObjectError};
pub use factory::{ChatRoomKeyFactory, ConnectionIdFactory};
pub use repository::{ChatRoomRepository, SessionRegistry};
pub use value_object::{
    Category, ChatRoomKey, ConnectionId, MessageBody, MessageId, Role, Timestamp, UserId,
};
