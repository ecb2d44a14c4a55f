//! Background dispatch of relayed messages to the external collaborators.
//!
//! The router only enqueues; a single worker drains the queue in arrival
//! order and runs save -> classify -> notify for each message. A failure in
//! one collaborator is logged and does not stop the others. The queue is
//! bounded: when it is full the message is logged and not forwarded.

use std::sync::Arc;

use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use crate::domain::{Category, Classifier, InboundMessage, MessageStore, Notifier};

/// Number of body characters included in a notification summary.
pub const SUMMARY_PREVIEW_CHARS: usize = 80;

/// Default number of messages waiting for the collaborator worker.
pub const DEFAULT_DISPATCH_CAPACITY: usize = 1024;

/// The three collaborators fed by the router.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn MessageStore>,
    pub classifier: Arc<dyn Classifier>,
    pub notifier: Arc<dyn Notifier>,
}

/// Producer side of the dispatch queue. Cheap to clone.
#[derive(Clone)]
pub struct CollaboratorDispatcher {
    queue: mpsc::Sender<InboundMessage>,
}

impl CollaboratorDispatcher {
    /// Start the worker with a queue of `capacity` messages (at least one).
    /// It stops once every dispatcher clone is dropped and the queue is drained.
    pub fn spawn(collaborators: Collaborators, capacity: usize) -> (Self, JoinHandle<()>) {
        let (queue, mut rx) = mpsc::channel::<InboundMessage>(capacity.max(1));
        let worker = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                process(&collaborators, message).await;
            }
            tracing::debug!("Collaborator dispatch queue closed");
        });
        (Self { queue }, worker)
    }

    /// Enqueue without waiting. Returns `false` if the queue is full or the
    /// worker is gone.
    pub fn dispatch(&self, message: InboundMessage) -> bool {
        match self.queue.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                tracing::warn!(
                    room_key = %message.room_key,
                    capacity = self.queue.max_capacity(),
                    "Collaborator queue full; message not forwarded"
                );
                false
            }
            Err(TrySendError::Closed(message)) => {
                tracing::error!(
                    room_key = %message.room_key,
                    "Collaborator worker is not running; message not forwarded"
                );
                false
            }
        }
    }
}

async fn process(collaborators: &Collaborators, message: InboundMessage) {
    match collaborators.store.save_message(&message).await {
        Ok(id) => tracing::debug!(
            room_key = %message.room_key,
            message_id = id.value(),
            "Message saved"
        ),
        Err(e) => tracing::warn!(room_key = %message.room_key, "Failed to save message: {}", e),
    }

    let category = match collaborators.classifier.classify(&message.body).await {
        Ok(category) => category,
        Err(e) => {
            tracing::warn!(room_key = %message.room_key, "Failed to classify message: {}", e);
            Category::General
        }
    };

    let summary = format!(
        "[{}] {}",
        category,
        message.body.preview(SUMMARY_PREVIEW_CHARS)
    );
    if let Err(e) = collaborators
        .notifier
        .notify(&message.recipient_id, &summary)
        .await
    {
        tracing::warn!(
            room_key = %message.room_key,
            recipient_id = %message.recipient_id,
            "Failed to notify recipient: {}",
            e
        );
    }
}
