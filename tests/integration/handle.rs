//! Integration tests for provider-submitted signals
//!
//! Tests cover:
//! - A provider can submit signals from register and ingest without deadlocking
//! - Submitted signals reach every registered provider after the current dispatch
//! - Stop flushes pending submissions and drops those made while stopping
//! - A handle never keeps the client alive

use crate::integration::test_utils::{
    context, ingests_for, new_log, Call, CallLog, ScriptedProvider,
};
use signaldeck::builtin::MemoryProvider;
use signaldeck::{
    ClientHandle, HostContext, ProviderError, Signal, TelemetryClient, TelemetryError,
    TelemetryProvider,
};
use std::sync::{Arc, Mutex};

/// Answers every `ping` with a `pong` through its handle
struct Responder {
    log: CallLog,
    handle: Option<ClientHandle>,
    announce: bool,
    farewell: bool,
}

impl Responder {
    fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            handle: None,
            announce: false,
            farewell: false,
        }
    }
}

impl TelemetryProvider for Responder {
    fn name(&self) -> &str {
        "responder"
    }

    fn register(
        &mut self,
        _context: Option<&HostContext>,
        client: ClientHandle,
    ) -> Result<(), ProviderError> {
        if self.announce {
            client
                .submit(Signal::new("hello"))
                .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        }
        self.handle = Some(client);
        Ok(())
    }

    fn ingest(&self, signal: &Signal) -> Result<(), ProviderError> {
        self.log.lock().unwrap().push(Call::Ingest(
            "responder".into(),
            signal.signal_type.clone(),
        ));
        if signal.signal_type == "ping" {
            if let Some(handle) = &self.handle {
                handle
                    .submit(Signal::new("pong"))
                    .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ProviderError> {
        if self.farewell {
            if let Some(handle) = &self.handle {
                let _ = handle.submit(Signal::new("goodbye"));
            }
        }
        Ok(())
    }
}

#[test]
fn test_submission_from_ingest_is_delivered_after_dispatch() {
    let ctx = context();
    let log = new_log();
    let client = TelemetryClient::new(&ctx);
    client.register(Responder::new(&log)).unwrap();
    client.register(ScriptedProvider::new("observer", &log)).unwrap();

    let report = client.dispatch(&Signal::new("ping")).unwrap();
    assert_eq!(report.drained, 1);
    assert_eq!(report.delivered, 4);

    assert_eq!(ingests_for(&log, "responder"), vec!["ping", "pong"]);
    assert_eq!(ingests_for(&log, "observer"), vec!["ping", "pong"]);
}

#[test]
fn test_submission_from_register_waits_for_flush() {
    let ctx = context();
    let log = new_log();
    let client = TelemetryClient::new(&ctx);
    let (memory, buffer) = MemoryProvider::new();
    client.register(memory).unwrap();
    let mut responder = Responder::new(&log);
    responder.announce = true;
    client.register(responder).unwrap();

    assert!(buffer.is_empty());
    let report = client.flush().unwrap();
    assert_eq!(report.drained, 1);
    assert_eq!(buffer.signal_types(), vec!["hello"]);
    assert_eq!(client.flush().unwrap().drained, 0);
}

#[test]
fn test_stop_flushes_pending_and_drops_late_submissions() {
    let ctx = context();
    let log = new_log();
    let client = TelemetryClient::new(&ctx);
    let (memory, buffer) = MemoryProvider::new();
    client.register(memory).unwrap();
    let mut responder = Responder::new(&log);
    responder.announce = true;
    responder.farewell = true;
    client.register(responder).unwrap();

    let report = client.stop();
    assert_eq!(report.flushed, 1);
    assert_eq!(report.stopped, 2);
    assert_eq!(buffer.signal_types(), vec!["hello"]);
    assert_eq!(ingests_for(&log, "responder"), vec!["hello"]);
}

#[test]
fn test_handle_does_not_keep_client_alive() {
    let ctx = context();
    let client = TelemetryClient::new(&ctx);
    let handle = client.handle();
    assert!(handle.is_active());
    assert_eq!(
        handle.context().map(|c| c.app_id.clone()),
        Some("com.example.tests".to_string())
    );

    drop(client);
    assert!(!handle.is_active());
    assert!(handle.context().is_none());
    assert!(matches!(
        handle.submit(Signal::new("orphan")),
        Err(TelemetryError::ClientAlreadyStopped)
    ));
}

#[test]
fn test_handle_rejects_submissions_after_stop() {
    let ctx = context();
    let client = TelemetryClient::new(&ctx);
    let handle = client.handle();
    client.stop();

    assert!(!handle.is_active());
    assert!(matches!(
        handle.submit(Signal::new("late")),
        Err(TelemetryError::ClientAlreadyStopped)
    ));
}

#[test]
fn test_handle_signals_are_stamped() {
    let ctx = context();
    let client = TelemetryClient::builder(&ctx)
        .session_id("sess-handle")
        .build();
    let seen = Arc::new(Mutex::new(None));

    struct Stamper(Arc<Mutex<Option<Signal>>>);

    impl TelemetryProvider for Stamper {
        fn register(
            &mut self,
            _context: Option<&HostContext>,
            client: ClientHandle,
        ) -> Result<(), ProviderError> {
            *self.0.lock().unwrap() = client.signal("stamped");
            Ok(())
        }

        fn stop(&mut self) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    client.register(Stamper(seen.clone())).unwrap();
    let signal = seen.lock().unwrap().clone().expect("signal built");
    assert_eq!(signal.app_id.as_deref(), Some("com.example.tests"));
    assert_eq!(signal.session_id.as_deref(), Some("sess-handle"));
}
