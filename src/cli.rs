//! CLI: clap types and command execution for the `signaldeck` binary.

use crate::client::TelemetryClient;
use crate::config::{ClientConfig, ConfigLoader};
use crate::error::TelemetryError;
use crate::host::HostContext;
use crate::logging::LoggingConfig;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Signaldeck CLI - send telemetry signals through the configured providers
#[derive(Parser)]
#[command(name = "signaldeck")]
#[command(about = "Send telemetry signals through the configured providers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding signaldeck.toml
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dispatch one signal to every configured provider, then stop
    Emit {
        /// Signal type, e.g. app.launched
        signal_type: String,
        /// Payload entry as key=value; values are parsed as JSON when possible
        #[arg(long = "payload", value_parser = parse_key_value)]
        payload: Vec<(String, String)>,
        /// User identifier for this signal
        #[arg(long)]
        user: Option<String>,
    },
    /// Register the configured providers and show their lifecycle state
    Providers {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Validate the configuration
    Validate,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

fn payload_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Load configuration from `--config` or from `--dir` plus the usual sources
pub fn load_config(cli: &Cli) -> Result<ClientConfig, TelemetryError> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load(&cli.dir)?,
    };
    Ok(config)
}

/// Build logging configuration from CLI args and the loaded config.
/// Precedence: CLI flags override config file override defaults.
pub fn build_logging_config(cli: &Cli, client_config: &ClientConfig) -> LoggingConfig {
    let mut config = client_config.logging.clone();

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}

fn ensure_valid(config: &ClientConfig) -> Result<(), TelemetryError> {
    config.validate().map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        TelemetryError::ConfigError(format!(
            "Configuration validation failed:\n{}",
            error_msgs.join("\n")
        ))
    })
}

/// Execute a command and return its printable output
pub fn execute(cli: &Cli, config: &ClientConfig) -> Result<String, TelemetryError> {
    ensure_valid(config)?;

    match &cli.command {
        Commands::Validate => Ok(format!(
            "Configuration valid: {} provider(s) for app '{}'",
            config.providers.len(),
            config.app_id
        )),
        Commands::Emit {
            signal_type,
            payload,
            user,
        } => {
            let context = Arc::new(HostContext::new(config.app_id.clone()));
            let client = TelemetryClient::from_config(&context, config)?;

            let mut signal = client.signal(signal_type.clone());
            for (key, value) in payload {
                signal = signal.with_payload(key.clone(), payload_value(value));
            }
            if let Some(user) = user {
                signal = signal.with_user(user.clone());
            }

            let report = client.dispatch(&signal)?;
            let stop = client.stop();
            Ok(format!(
                "Dispatched '{}': {} deliveries, {} failed, {} provider signal(s); {} provider(s) stopped",
                signal.signal_type,
                report.delivered,
                report.failed,
                report.drained + stop.flushed,
                stop.stopped
            ))
        }
        Commands::Providers { format } => {
            let context = Arc::new(HostContext::new(config.app_id.clone()));
            let client = TelemetryClient::from_config(&context, config)?;
            let statuses = client.providers();
            client.stop();

            if format == "json" {
                serde_json::to_string_pretty(&statuses).map_err(|e| {
                    TelemetryError::ConfigError(format!("Failed to render providers: {}", e))
                })
            } else if statuses.is_empty() {
                Ok("No providers configured".to_string())
            } else {
                let lines: Vec<String> = statuses
                    .iter()
                    .map(|s| format!("{:<4} {:<20} {}", s.id.index(), s.name, s.state))
                    .collect();
                Ok(lines.join("\n"))
            }
        }
    }
}
