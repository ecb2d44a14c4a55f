//! Router construction and server loop.

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{config::ServerConfig, error::ServerError};

use super::{
    handler::{
        get_room_messages, get_session, health_check, list_sessions, patient_websocket_handler,
        staff_websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Time allowed for queued messages to reach the collaborators after shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws/patient", get(patient_websocket_handler))
        .route("/ws/staff", get(staff_websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/{room_key}", get(get_session))
        .route("/api/rooms/{room_key}/messages", get(get_room_messages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind, serve until a shutdown signal, then drain the collaborator queue.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let (state, worker) = AppState::from_config(&config);
    tracing::info!(
        addr = %listener.local_addr()?,
        assignments = config.assignments.len(),
        relay_timeout_ms = config.relay_timeout_ms,
        "Listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if tokio::time::timeout(DRAIN_TIMEOUT, worker).await.is_err() {
        tracing::warn!("Collaborator queue not drained before shutdown");
    }
    tracing::info!("Server stopped");
    Ok(())
}
