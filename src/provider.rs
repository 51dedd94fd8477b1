//! Telemetry Provider Abstraction
//!
//! The capability contract every backend (analytics service, crash reporter, logging
//! sink) implements to take part in the client lifecycle. The client only depends on
//! this trait; it never inspects provider internals.

use crate::client::ClientHandle;
use crate::error::ProviderError;
use crate::host::HostContext;
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod registry;

pub use registry::{ProviderRegistry, RegistryEntry};

/// Registration index of a provider within one client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(usize);

impl ProviderId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider#{}", self.0)
    }
}

/// Lifecycle state of a registry entry
///
/// `Unregistered -> Registered -> Stopped`. An entry whose registration failed stays
/// `Unregistered` and is skipped by dispatch and shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    Unregistered,
    Registered,
    Stopped,
}

impl ProviderState {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderState::Unregistered => "unregistered",
            ProviderState::Registered => "registered",
            ProviderState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Telemetry provider trait
///
/// `register` and `stop` run while the client holds its registry exclusively, so they
/// receive `&mut self`. `ingest` runs under shared access and may be called from
/// several threads at once.
///
/// Implementations must not call back into the owning `TelemetryClient` from inside
/// these methods; use [`ClientHandle::submit`] to emit signals instead.
pub trait TelemetryProvider: Send + Sync {
    /// Human-readable provider name used in logs and failure reports
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Initialize the provider. Called exactly once per registry entry.
    fn register(
        &mut self,
        context: Option<&HostContext>,
        client: ClientHandle,
    ) -> Result<(), ProviderError>;

    /// Receive one signal. Only called while the provider is registered.
    fn ingest(&self, _signal: &Signal) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Release provider resources. Called at most once, after a successful `register`.
    fn stop(&mut self) -> Result<(), ProviderError>;
}

/// Snapshot of one registry entry, for hosts and diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub id: ProviderId,
    pub name: String,
    pub state: ProviderState,
}
