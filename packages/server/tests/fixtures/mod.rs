//! Test fixtures for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use carelink_server::{
    ServerConfig, build_router,
    config::StaffAssignment,
    domain::UserId,
    ui::state::AppState,
};
use tokio::{net::TcpListener, task::JoinHandle};

/// Server running in-process on an ephemeral port.
///
/// Aborted when dropped.
pub struct TestServer {
    addr: std::net::SocketAddr,
    server: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the given `(patient_id, staff_id)` assignments.
    pub async fn start(assignments: &[(&str, &str)]) -> Self {
        Self::start_with(assignments, |_| {}).await
    }

    /// Start a server after adjusting the configuration.
    pub async fn start_with(
        assignments: &[(&str, &str)],
        configure: impl FnOnce(&mut ServerConfig),
    ) -> Self {
        let mut config = ServerConfig {
            port: 0,
            assignments: assignments
                .iter()
                .map(|(patient, staff)| StaffAssignment {
                    patient_id: UserId::new(patient.to_string()).unwrap(),
                    staff_id: UserId::new(staff.to_string()).unwrap(),
                })
                .collect(),
            ..ServerConfig::default()
        };
        configure(&mut config);

        let listener = TcpListener::bind(config.bind_address())
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let (state, worker) = AppState::from_config(&config);
        let server = tokio::spawn(async move {
            axum::serve(listener, build_router(state))
                .await
                .expect("Test server failed");
        });

        Self {
            addr,
            server,
            worker,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, path: &str, patient_id: &str) -> String {
        format!("ws://{}{}?patient_id={}", self.addr, path, patient_id)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
        self.worker.abort();
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
