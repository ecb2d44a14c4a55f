//! Patient/staff chat bridge server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin carelink-server -- --assign 42=7
//! ```

use carelink_server::ServerConfig;
use carelink_shared::logger::setup_logger;
use clap::Parser;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = carelink_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
