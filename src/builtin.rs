//! Bundled providers
//!
//! Local-only providers shipped with the crate, and the factory that builds them from
//! `[[providers]]` entries in the configuration.

use crate::error::TelemetryError;
use crate::provider::TelemetryProvider;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod log_sink;
pub mod memory;
pub mod session;

pub use log_sink::LogProvider;
pub use memory::{MemoryProvider, SignalBuffer};
pub use session::SessionProvider;

/// Kind of bundled provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Session,
    Log,
    Memory,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Session => "session",
            ProviderKind::Log => "log",
            ProviderKind::Memory => "memory",
        }
    }
}

/// One configured provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub kind: ProviderKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Output file for `log` providers. Without one, signals go to `tracing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Maximum buffered signals for `memory` providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl ProviderSpec {
    pub fn new(name: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
            file: None,
            capacity: None,
        }
    }

    /// Validate provider specification
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Provider name cannot be empty".to_string());
        }
        if let Some(file) = &self.file {
            if self.kind != ProviderKind::Log {
                return Err(format!(
                    "'file' is only supported by log providers, not {}",
                    self.kind.as_str()
                ));
            }
            if file.as_os_str().is_empty() {
                return Err("Log file path cannot be empty".to_string());
            }
        }
        if let Some(capacity) = self.capacity {
            if self.kind != ProviderKind::Memory {
                return Err(format!(
                    "'capacity' is only supported by memory providers, not {}",
                    self.kind.as_str()
                ));
            }
            if capacity == 0 {
                return Err("Memory capacity must be greater than zero".to_string());
            }
        }
        Ok(())
    }
}

/// Capacity of `memory` providers built from configuration without one
pub const DEFAULT_MEMORY_CAPACITY: usize = 1024;

/// A provider built from configuration
pub struct BuiltProvider {
    pub name: String,
    pub provider: Box<dyn TelemetryProvider>,
    /// Readable view of what a `memory` provider received
    pub buffer: Option<SignalBuffer>,
}

/// Provider factory for creating bundled providers from configuration
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(spec: &ProviderSpec) -> Result<BuiltProvider, TelemetryError> {
        spec.validate().map_err(|e| {
            TelemetryError::ConfigError(format!("Provider '{}': {}", spec.name, e))
        })?;

        let mut buffer = None;
        let provider: Box<dyn TelemetryProvider> = match spec.kind {
            ProviderKind::Session => Box::new(SessionProvider::new(spec.name.clone())),
            ProviderKind::Log => Box::new(match &spec.file {
                Some(path) => LogProvider::to_file(spec.name.clone(), path.clone()),
                None => LogProvider::new(spec.name.clone()),
            }),
            ProviderKind::Memory => {
                let (provider, signals) = MemoryProvider::named(spec.name.clone());
                buffer = Some(signals);
                Box::new(provider.with_capacity(spec.capacity.unwrap_or(DEFAULT_MEMORY_CAPACITY)))
            }
        };

        Ok(BuiltProvider {
            name: spec.name.clone(),
            provider,
            buffer,
        })
    }

    /// Build every enabled provider, preserving configuration order
    pub fn build_all(specs: &[ProviderSpec]) -> Result<Vec<BuiltProvider>, TelemetryError> {
        specs
            .iter()
            .filter(|spec| spec.enabled)
            .map(Self::create)
            .collect()
    }
}
