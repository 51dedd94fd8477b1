//! In-memory provider: keeps received signals in a buffer the host can read.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::client::ClientHandle;
use crate::error::ProviderError;
use crate::host::HostContext;
use crate::provider::TelemetryProvider;
use crate::signal::Signal;

/// Shared view of a [`MemoryProvider`]'s received signals
#[derive(Debug, Clone, Default)]
pub struct SignalBuffer {
    signals: Arc<Mutex<VecDeque<Signal>>>,
}

impl SignalBuffer {
    pub fn snapshot(&self) -> Vec<Signal> {
        self.signals.lock().iter().cloned().collect()
    }

    pub fn signal_types(&self) -> Vec<String> {
        self.signals
            .lock()
            .iter()
            .map(|s| s.signal_type.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.signals.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.lock().is_empty()
    }

    pub fn clear(&self) {
        self.signals.lock().clear();
    }

    fn push(&self, signal: Signal, capacity: Option<usize>) {
        let mut signals = self.signals.lock();
        signals.push_back(signal);
        if let Some(capacity) = capacity {
            while signals.len() > capacity {
                signals.pop_front();
            }
        }
    }
}

pub struct MemoryProvider {
    name: String,
    buffer: SignalBuffer,
    capacity: Option<usize>,
    registered: bool,
}

impl MemoryProvider {
    pub fn new() -> (Self, SignalBuffer) {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> (Self, SignalBuffer) {
        let buffer = SignalBuffer::default();
        let provider = Self {
            name: name.into(),
            buffer: buffer.clone(),
            capacity: None,
            registered: false,
        };
        (provider, buffer)
    }

    /// Keep at most `capacity` signals, dropping the oldest first
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

impl TelemetryProvider for MemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn register(
        &mut self,
        _context: Option<&HostContext>,
        _client: ClientHandle,
    ) -> Result<(), ProviderError> {
        self.registered = true;
        Ok(())
    }

    fn ingest(&self, signal: &Signal) -> Result<(), ProviderError> {
        if !self.registered {
            return Err(ProviderError::Rejected(format!(
                "memory provider '{}' is not registered",
                self.name
            )));
        }
        self.buffer.push(signal.clone(), self.capacity);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ProviderError> {
        self.registered = false;
        Ok(())
    }
}
