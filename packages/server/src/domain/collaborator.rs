//! Contracts of the external collaborators the message router feeds.
//!
//! All three are advisory from the router's point of view: they run off the
//! relay path and their failures are logged, never surfaced to the sender.

use async_trait::async_trait;

use super::{Category, CollaboratorError, InboundMessage, MessageBody, MessageId, UserId};

/// Durable storage of chat history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn save_message(&self, message: &InboundMessage) -> Result<MessageId, CollaboratorError>;
}

/// "What kind of request is this" classification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, body: &MessageBody) -> Result<Category, CollaboratorError>;
}

/// Push-notification delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient_id: &UserId, summary: &str) -> Result<(), CollaboratorError>;
}
