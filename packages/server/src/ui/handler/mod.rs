//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{get_room_messages, get_session, health_check, list_sessions};

// Re-export WebSocket handlers
pub use websocket::{patient_websocket_handler, staff_websocket_handler};
