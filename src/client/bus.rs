//! In-process bus for signals that providers submit on their own initiative.

use std::sync::mpsc::{channel, Receiver, Sender};

use parking_lot::Mutex;

use crate::error::TelemetryError;
use crate::signal::Signal;

pub(crate) struct SignalBus {
    sender: Sender<Signal>,
    receiver: Mutex<Receiver<Signal>>,
}

impl SignalBus {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Queue a signal. Never touches the registry lock.
    pub(crate) fn emit(&self, signal: Signal) -> Result<(), TelemetryError> {
        self.sender
            .send(signal)
            .map_err(|_| TelemetryError::ClientAlreadyStopped)
    }

    /// Take every signal queued so far. Signals emitted while the caller handles the
    /// returned batch stay queued for the next drain.
    pub(crate) fn drain(&self) -> Vec<Signal> {
        let receiver = self.receiver.lock();
        receiver.try_iter().collect()
    }
}
