//! Integration tests for provider failure isolation
//!
//! Tests cover:
//! - Errors and panics in register, ingest and stop never reach the caller
//! - Healthy providers keep receiving signals next to a failing one
//! - Every contained failure is reported to the sink with its phase and provider
//! - A provider whose `name()` panics is still registered under its id

use crate::integration::test_utils::{
    calls, context, ingests_for, new_log, Behavior, Call, ScriptedProvider,
};
use signaldeck::{
    CallbackSink, ClientHandle, ClientState, CollectingSink, FailureKind, HostContext,
    ProviderError, ProviderFailure, ProviderState, Signal, TelemetryClient, TelemetryProvider,
};
use std::sync::{Arc, Mutex};

#[test]
fn test_panicking_registration_is_contained() {
    let ctx = context();
    let log = new_log();
    let sink = Arc::new(CollectingSink::new());
    let client = TelemetryClient::with_sink(&ctx, sink.clone());

    let bad = client
        .register(ScriptedProvider::new("bad", &log).on_register(Behavior::Panic))
        .unwrap();
    let good = client.register(ScriptedProvider::new("good", &log)).unwrap();

    assert_eq!(client.provider_state(bad), Some(ProviderState::Unregistered));
    assert_eq!(client.provider_state(good), Some(ProviderState::Registered));
    assert_eq!(client.state(), ClientState::Active);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, FailureKind::Registration);
    assert_eq!(records[0].provider_id, bad);
    assert!(records[0].message.contains("bad panicked during register"));
}

#[test]
fn test_failing_ingest_does_not_block_later_providers() {
    let ctx = context();
    let log = new_log();
    let sink = Arc::new(CollectingSink::new());
    let client = TelemetryClient::with_sink(&ctx, sink.clone());

    client
        .register(ScriptedProvider::new("first", &log).on_ingest(Behavior::Fail))
        .unwrap();
    client
        .register(ScriptedProvider::new("second", &log).on_ingest(Behavior::Panic))
        .unwrap();
    client.register(ScriptedProvider::new("third", &log)).unwrap();

    let report = client.dispatch(&Signal::new("e1")).unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 2);

    let report = client.dispatch(&Signal::new("e2")).unwrap();
    assert_eq!(report.delivered, 1);

    assert_eq!(ingests_for(&log, "first"), vec!["e1", "e2"]);
    assert_eq!(ingests_for(&log, "second"), vec!["e1", "e2"]);
    assert_eq!(ingests_for(&log, "third"), vec!["e1", "e2"]);
    assert_eq!(sink.count(FailureKind::Dispatch), 4);
}

#[test]
fn test_failing_stop_still_stops_the_rest() {
    let ctx = context();
    let log = new_log();
    let sink = Arc::new(CollectingSink::new());
    let client = TelemetryClient::with_sink(&ctx, sink.clone());

    let a = client
        .register(ScriptedProvider::new("a", &log).on_stop(Behavior::Panic))
        .unwrap();
    let b = client
        .register(ScriptedProvider::new("b", &log).on_stop(Behavior::Fail))
        .unwrap();
    let c = client.register(ScriptedProvider::new("c", &log)).unwrap();

    let report = client.stop();
    assert_eq!(report.stopped, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(client.state(), ClientState::Stopped);

    for id in [a, b, c] {
        assert_eq!(client.provider_state(id), Some(ProviderState::Stopped));
    }
    let stops: Vec<Call> = calls(&log)
        .into_iter()
        .filter(|call| matches!(call, Call::Stop(_)))
        .collect();
    assert_eq!(
        stops,
        vec![
            Call::Stop("a".into()),
            Call::Stop("b".into()),
            Call::Stop("c".into())
        ]
    );
    assert_eq!(sink.count(FailureKind::Stop), 2);

    // a second stop must not retry the failed providers
    client.stop();
    assert_eq!(sink.count(FailureKind::Stop), 2);
}

#[test]
fn test_callback_sink_sees_typed_failures() {
    let ctx = context();
    let log = new_log();
    let seen: Arc<Mutex<Vec<(FailureKind, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let sink = CallbackSink::new(move |failure: &ProviderFailure| {
        let panicked = matches!(failure.error, ProviderError::Panicked(_));
        recorder.lock().unwrap().push((failure.kind, panicked));
    });
    let client = TelemetryClient::with_sink(&ctx, Arc::new(sink));

    client
        .register(ScriptedProvider::new("flaky", &log).on_ingest(Behavior::Panic))
        .unwrap();
    client
        .register(ScriptedProvider::new("broken", &log).on_register(Behavior::Fail))
        .unwrap();
    client.dispatch(&Signal::new("e1")).unwrap();
    client.stop();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (FailureKind::Registration, false),
            (FailureKind::Dispatch, true)
        ]
    );
}

#[test]
fn test_failure_message_names_provider_and_phase() {
    let ctx = context();
    let log = new_log();
    let messages = Arc::new(Mutex::new(Vec::new()));
    let recorder = messages.clone();
    let sink = CallbackSink::new(move |failure: &ProviderFailure| {
        recorder.lock().unwrap().push(failure.to_string());
    });
    let client = TelemetryClient::with_sink(&ctx, Arc::new(sink));

    client
        .register(ScriptedProvider::new("crashy", &log).on_register(Behavior::Fail))
        .unwrap();

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("registration failed for provider 'crashy' (provider#0)"));
}

/// Panics whenever asked for its name and refuses every signal
struct Nameless;

impl TelemetryProvider for Nameless {
    fn name(&self) -> &str {
        panic!("name unavailable")
    }

    fn register(
        &mut self,
        _context: Option<&HostContext>,
        _client: ClientHandle,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    fn ingest(&self, _signal: &Signal) -> Result<(), ProviderError> {
        Err(ProviderError::Rejected("no thanks".to_string()))
    }

    fn stop(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[test]
fn test_panicking_name_never_reaches_caller() {
    let ctx = context();
    let log = new_log();
    let sink = Arc::new(CollectingSink::new());
    let client = TelemetryClient::with_sink(&ctx, sink.clone());

    let nameless = client.register(Nameless).unwrap();
    client.register(ScriptedProvider::new("steady", &log)).unwrap();

    assert_eq!(client.provider_state(nameless), Some(ProviderState::Registered));
    assert_eq!(client.providers()[0].name, "provider#0");

    let report = client.dispatch(&Signal::new("e1")).unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(ingests_for(&log, "steady"), vec!["e1"]);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].provider_name, "provider#0");

    assert_eq!(client.stop().stopped, 2);
    assert_eq!(client.provider_state(nameless), Some(ProviderState::Stopped));
}
