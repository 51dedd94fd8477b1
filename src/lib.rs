//! Signaldeck: Telemetry Client
//!
//! Collects application signals and forwards them to pluggable providers (analytics
//! services, crash reporters, logging sinks). The client owns an ordered provider
//! registry, drives each provider through `register -> stop`, and isolates provider
//! failures so one misbehaving backend cannot disturb the others or the host.

pub mod builtin;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod provider;
pub mod report;
pub mod signal;

pub use client::{
    ClientBuilder, ClientHandle, ClientState, DispatchReport, StopReport, TelemetryClient,
};
pub use error::{FailureKind, ProviderError, ProviderFailure, TelemetryError};
pub use host::HostContext;
pub use provider::{ProviderId, ProviderState, ProviderStatus, TelemetryProvider};
pub use report::{CallbackSink, CollectingSink, FailureSink, TracingSink};
pub use signal::Signal;
