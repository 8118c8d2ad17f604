//! RAX File Server - Entry Point
//!
//! An authenticated HTTP file store with sandboxed paths, atomic uploads and
//! on-the-fly directory archiving.

use log::{error, info};
use std::process::ExitCode;

use rax_file_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching file server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match server.start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server stopped with an error: {}", e);
            ExitCode::FAILURE
        }
    }
}
