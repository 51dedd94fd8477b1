//! Failure reporting: where isolated provider failures end up.
//!
//! The client never returns provider failures to its caller. Each one is handed to a
//! [`FailureSink`] so the host can still observe it as a log line, a callback, or a
//! collected record.

use crate::error::{FailureKind, ProviderFailure};
use crate::provider::ProviderId;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

/// Receiver of isolated provider failures
pub trait FailureSink: Send + Sync {
    fn report(&self, failure: &ProviderFailure);
}

/// Default sink: one structured `warn!` event per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, failure: &ProviderFailure) {
        warn!(
            provider_id = %failure.provider_id,
            provider = %failure.provider_name,
            kind = %failure.kind,
            error = %failure.error,
            "telemetry provider call failed"
        );
    }
}

/// Forwards every failure to a host-supplied closure.
pub struct CallbackSink<F> {
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: Fn(&ProviderFailure) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> FailureSink for CallbackSink<F>
where
    F: Fn(&ProviderFailure) + Send + Sync,
{
    fn report(&self, failure: &ProviderFailure) {
        (self.callback)(failure);
    }
}

/// Owned summary of a reported failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub message: String,
}

impl From<&ProviderFailure> for FailureRecord {
    fn from(failure: &ProviderFailure) -> Self {
        Self {
            kind: failure.kind,
            provider_id: failure.provider_id,
            provider_name: failure.provider_name.clone(),
            message: failure.error.to_string(),
        }
    }
}

/// Keeps failures in memory and also logs them through [`TracingSink`].
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<FailureRecord>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().clone()
    }

    pub fn count(&self, kind: FailureKind) -> usize {
        self.records.lock().iter().filter(|r| r.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl FailureSink for CollectingSink {
    fn report(&self, failure: &ProviderFailure) {
        TracingSink.report(failure);
        self.records.lock().push(FailureRecord::from(failure));
    }
}
