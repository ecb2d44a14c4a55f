//! WebSocket / HTTP surface of the chat bridge.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{build_router, run_server};
