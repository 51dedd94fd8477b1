//! Non-owning back-reference from a provider to the client that registered it.

use std::sync::{Arc, Weak};

use crate::client::ClientInner;
use crate::error::TelemetryError;
use crate::host::HostContext;
use crate::signal::Signal;

/// Weak handle to a `TelemetryClient`
///
/// Holding a handle never keeps the client alive. Submissions go through the client's
/// signal bus and are delivered on the next `dispatch` or `flush`, so a provider may
/// submit from inside any of its own callbacks.
#[derive(Clone)]
pub struct ClientHandle {
    inner: Weak<ClientInner>,
}

impl ClientHandle {
    pub(crate) fn new(inner: Weak<ClientInner>) -> Self {
        Self { inner }
    }

    /// A handle not attached to any client. Every submission fails.
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    pub fn is_active(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.is_active())
            .unwrap_or(false)
    }

    /// Queue a signal for delivery to every registered provider
    ///
    /// A signal queued while the client is stopping is dropped, not delivered. That
    /// includes a `stop` that completes between the activity check and the enqueue:
    /// the queue is cleared again here so nothing lingers after shutdown.
    pub fn submit(&self, signal: Signal) -> Result<(), TelemetryError> {
        let inner = self
            .inner
            .upgrade()
            .ok_or(TelemetryError::ClientAlreadyStopped)?;
        if !inner.is_active() {
            return Err(TelemetryError::ClientAlreadyStopped);
        }
        inner.bus.emit(signal)?;
        if !inner.is_active() {
            inner.discard_pending();
        }
        Ok(())
    }

    /// Build a signal stamped with the client's app, session, user and test mode
    pub fn signal(&self, signal_type: impl Into<String>) -> Option<Signal> {
        self.inner
            .upgrade()
            .map(|inner| inner.stamp(Signal::new(signal_type)))
    }

    /// Host context, if both the client and the host's context are still alive
    pub fn context(&self) -> Option<Arc<HostContext>> {
        self.inner.upgrade().and_then(|inner| inner.context.upgrade())
    }
}
