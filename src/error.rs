//! Error types for the signaldeck telemetry client.

use crate::provider::ProviderId;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised by provider implementations
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider rejected the call: {0}")]
    Rejected(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provider panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Lifecycle phase in which a provider call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Registration,
    Dispatch,
    Stop,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Registration => "registration",
            FailureKind::Dispatch => "dispatch",
            FailureKind::Stop => "stop",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-scoped failure, contained by the client and handed to the failure sink.
#[derive(Debug, Error)]
#[error("{kind} failed for provider '{provider_name}' ({provider_id}): {error}")]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub provider_id: ProviderId,
    pub provider_name: String,
    #[source]
    pub error: ProviderError,
}

/// Client-level errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Telemetry client already stopped")]
    ClientAlreadyStopped,

    #[error("Registration failure: {0}")]
    RegistrationFailure(ProviderFailure),

    #[error("Dispatch failure: {0}")]
    DispatchFailure(ProviderFailure),

    #[error("Stop failure: {0}")]
    StopFailure(ProviderFailure),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProviderFailure> for TelemetryError {
    fn from(failure: ProviderFailure) -> Self {
        match failure.kind {
            FailureKind::Registration => TelemetryError::RegistrationFailure(failure),
            FailureKind::Dispatch => TelemetryError::DispatchFailure(failure),
            FailureKind::Stop => TelemetryError::StopFailure(failure),
        }
    }
}

impl From<config::ConfigError> for TelemetryError {
    fn from(err: config::ConfigError) -> Self {
        TelemetryError::ConfigError(err.to_string())
    }
}
