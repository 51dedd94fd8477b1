//! Configuration System
//!
//! Layered client configuration: defaults, a global file, per-application files and
//! `SIGNALDECK_*` environment overrides, merged with the `config` crate. Providers are
//! an ordered `[[providers]]` array because registration order is dispatch order.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

mod facade;
mod merge;
mod sources;

pub use crate::builtin::{ProviderKind, ProviderSpec};
pub use facade::{ConfigLoader, ENV_PREFIX};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Application identifier stamped on every signal
    #[serde(default)]
    pub app_id: String,

    /// Mark every signal as a test signal
    #[serde(default)]
    pub test_mode: bool,

    /// User identifier used when a signal carries none
    #[serde(default)]
    pub default_user: Option<String>,

    /// Providers, registered in the listed order
    #[serde(default)]
    pub providers: Vec<ProviderSpec>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    App(String),
    Provider(String, String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::App(msg) => write!(f, "App: {}", msg),
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ClientConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.app_id.trim().is_empty() {
            errors.push(ValidationError::App("app_id cannot be empty".to_string()));
        }

        let mut names = HashSet::new();
        for provider in &self.providers {
            if let Err(e) = provider.validate() {
                errors.push(ValidationError::Provider(provider.name.clone(), e));
            }
            if !names.insert(provider.name.as_str()) {
                errors.push(ValidationError::Provider(
                    provider.name.clone(),
                    "Duplicate provider name".to_string(),
                ));
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
