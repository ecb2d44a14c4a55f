//! Real-time patient/staff chat bridge.
//!
//! Keeps track of which patient and staff connections are live for each chat
//! room and relays messages between them, forwarding a copy of every message
//! to persistence, classification and notification collaborators.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use ui::{build_router, run_server};
