//! Server configuration, parsed from the command line.

use std::time::Duration;

use clap::Parser;

use crate::{domain::UserId, usecase::DEFAULT_DISPATCH_CAPACITY};

/// A patient and the staff member responsible for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffAssignment {
    pub patient_id: UserId,
    pub staff_id: UserId,
}

/// Parse `PATIENT=STAFF`.
pub fn parse_assignment(value: &str) -> Result<StaffAssignment, String> {
    let (patient, staff) = value
        .split_once('=')
        .ok_or_else(|| format!("expected PATIENT=STAFF, got '{value}'"))?;
    let patient_id = UserId::new(patient.to_string()).map_err(|e| e.to_string())?;
    let staff_id = UserId::new(staff.to_string()).map_err(|e| e.to_string())?;
    Ok(StaffAssignment {
        patient_id,
        staff_id,
    })
}

#[derive(Debug, Clone, Parser)]
#[command(name = "carelink-server", about = "Real-time patient/staff chat bridge")]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Upper bound on a single relay send to a slow peer, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub relay_timeout_ms: u64,

    /// Capacity of each connection's outbound queue.
    #[arg(long, default_value_t = 64)]
    pub outbound_buffer: usize,

    /// Capacity of the queue feeding persistence, classification and notification.
    #[arg(long, default_value_t = DEFAULT_DISPATCH_CAPACITY)]
    pub dispatch_queue: usize,

    /// Patient-to-staff assignment, `PATIENT=STAFF`. Repeatable.
    #[arg(long = "assign", value_name = "PATIENT=STAFF", value_parser = parse_assignment)]
    pub assignments: Vec<StaffAssignment>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            relay_timeout_ms: 2000,
            outbound_buffer: 64,
            dispatch_queue: DEFAULT_DISPATCH_CAPACITY,
            assignments: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}
