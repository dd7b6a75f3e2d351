use std::process::ExitCode;
use std::sync::Arc;

use orderpulse::config::{load_config, print_schema};
use orderpulse::startup;
use orderpulse::utils::logger::init_logging;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    if std::env::args().any(|arg| arg == "--schema") {
        return match print_schema() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Failed to print config schema: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging, &config.service) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = startup::run(config).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
