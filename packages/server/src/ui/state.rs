//! Server state shared by every handler.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::{
    config::ServerConfig,
    domain::{ChatRoomRepository, SessionRegistry},
    infrastructure::{
        collaborator::{KeywordClassifier, LoggingNotifier},
        repository::{InMemoryChatRoomRepository, InMemoryMessageStore, InMemorySessionRegistry},
    },
    usecase::{CollaboratorDispatcher, Collaborators},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub patient_id: String,
}

/// Shared application state
pub struct AppState {
    /// Chat room directory
    pub directory: Arc<dyn ChatRoomRepository>,
    /// Live connections per chat room
    pub registry: Arc<dyn SessionRegistry>,
    /// Chat history kept by the in-memory persistence collaborator
    pub history: Arc<InMemoryMessageStore>,
    /// Producer side of the collaborator queue
    pub dispatcher: CollaboratorDispatcher,
    /// Bound on a single relay send
    pub relay_timeout: Duration,
    /// Capacity of each connection's outbound queue
    pub outbound_buffer: usize,
}

impl AppState {
    /// Wire the in-memory backends and start the collaborator worker.
    pub fn from_config(config: &ServerConfig) -> (Arc<Self>, JoinHandle<()>) {
        let directory = Arc::new(InMemoryChatRoomRepository::new(
            config
                .assignments
                .iter()
                .map(|a| (a.patient_id.clone(), a.staff_id.clone())),
        ));
        let history = Arc::new(InMemoryMessageStore::new());
        let (dispatcher, worker) = CollaboratorDispatcher::spawn(
            Collaborators {
                store: history.clone(),
                classifier: Arc::new(KeywordClassifier::new()),
                notifier: Arc::new(LoggingNotifier::new()),
            },
            config.dispatch_queue,
        );

        let state = Arc::new(Self {
            directory,
            registry: Arc::new(InMemorySessionRegistry::new()),
            history,
            dispatcher,
            relay_timeout: config.relay_timeout(),
            outbound_buffer: config.outbound_buffer.max(1),
        });
        (state, worker)
    }
}
