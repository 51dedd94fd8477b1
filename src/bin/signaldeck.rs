//! Signaldeck CLI Binary
//!
//! Command-line interface for sending signals through the configured providers.

use clap::Parser;
use signaldeck::cli::{build_logging_config, execute, load_config, Cli};
use signaldeck::logging::init_logging;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Initialize logging early
    let logging_config = build_logging_config(&cli, &config);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Signaldeck CLI starting");

    match execute(&cli, &config) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
