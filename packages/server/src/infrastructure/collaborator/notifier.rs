//! Notifier that only records notifications in the log.
//!
//! Mobile push delivery lives outside this service; this keeps the call
//! contract exercised when no push gateway is configured.

use async_trait::async_trait;

use crate::domain::{CollaboratorError, Notifier, UserId};

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, recipient_id: &UserId, summary: &str) -> Result<(), CollaboratorError> {
        tracing::info!(recipient_id = %recipient_id, summary, "Notification queued");
        Ok(())
    }
}
