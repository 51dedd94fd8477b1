//! Integration tests for building a client from configuration
//!
//! Tests cover:
//! - `[[providers]]` order becomes registration order
//! - Signals submitted during registration arrive before the first dispatch
//! - Memory providers from configuration can be read back
//! - Disabled providers are skipped
//! - A log provider that cannot open its file stays unregistered without failing the client
//! - Invalid provider entries are rejected before any provider is created

use signaldeck::config::{ClientConfig, ConfigLoader, ProviderKind, ProviderSpec};
use signaldeck::{ProviderState, Signal, TelemetryClient, TelemetryError};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn context() -> Arc<signaldeck::HostContext> {
    Arc::new(signaldeck::HostContext::new("com.example.configured"))
}

fn config_with(providers: Vec<ProviderSpec>) -> ClientConfig {
    ClientConfig {
        app_id: "com.example.configured".to_string(),
        providers,
        ..ClientConfig::default()
    }
}

#[test]
fn test_from_config_registers_in_listed_order() {
    let temp = TempDir::new().unwrap();
    let mut audit = ProviderSpec::new("audit", ProviderKind::Log);
    audit.file = Some(temp.path().join("audit.jsonl"));
    let mut disabled = ProviderSpec::new("muted", ProviderKind::Memory);
    disabled.enabled = false;

    let config = config_with(vec![
        ProviderSpec::new("session", ProviderKind::Session),
        disabled,
        audit,
    ]);
    let ctx = context();
    let client = TelemetryClient::from_config(&ctx, &config).unwrap();

    let statuses = client.providers();
    let names: Vec<&str> = statuses.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["session", "audit"]);
    assert!(statuses
        .iter()
        .all(|s| s.state == ProviderState::Registered));

    client
        .dispatch(&client.signal("app.launched").with_payload("plan", "pro"))
        .unwrap();
    client.stop();

    let contents = fs::read_to_string(temp.path().join("audit.jsonl")).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let types: Vec<&str> = lines.iter().map(|l| l["type"].as_str().unwrap()).collect();
    assert_eq!(types, vec!["session.started", "app.launched"]);
    assert_eq!(lines[0]["payload"]["provider"], "session");
    assert_eq!(lines[1]["app_id"], "com.example.configured");
    assert_eq!(lines[1]["payload"]["plan"], "pro");
}

#[test]
fn test_unopenable_log_file_leaves_provider_unregistered() {
    let temp = TempDir::new().unwrap();
    let mut broken = ProviderSpec::new("broken", ProviderKind::Log);
    // a directory cannot be opened for appending
    broken.file = Some(temp.path().to_path_buf());

    let config = config_with(vec![broken, ProviderSpec::new("buffer", ProviderKind::Memory)]);
    let ctx = context();
    let client = TelemetryClient::from_config(&ctx, &config).unwrap();

    let statuses = client.providers();
    assert_eq!(statuses[0].state, ProviderState::Unregistered);
    assert_eq!(statuses[1].state, ProviderState::Registered);

    let report = client.dispatch(&Signal::new("e1")).unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 0);
}

#[test]
fn test_invalid_provider_spec_is_rejected() {
    let mut spec = ProviderSpec::new("buffer", ProviderKind::Memory);
    spec.capacity = Some(0);
    let ctx = context();

    let result = TelemetryClient::from_config(&ctx, &config_with(vec![spec]));
    assert!(matches!(result, Err(TelemetryError::ConfigError(ref m)) if m.contains("buffer")));
}

#[test]
fn test_loaded_file_drives_client() {
    let temp = TempDir::new().unwrap();
    let signals = temp.path().join("signals.jsonl");
    let config_path = temp.path().join("signaldeck.toml");
    fs::write(
        &config_path,
        format!(
            r#"
app_id = "com.example.loaded"
test_mode = true

[[providers]]
name = "audit"
kind = "log"
file = "{}"

[[providers]]
name = "recent"
kind = "memory"
capacity = 10
"#,
            signals.display().to_string().replace('\\', "\\\\")
        ),
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.providers.len(), 2);
    assert_eq!(config.providers[1].capacity, Some(10));

    let ctx = Arc::new(signaldeck::HostContext::new(config.app_id.clone()));
    let client = TelemetryClient::from_config(&ctx, &config).unwrap();
    client.dispatch(&client.signal("app.launched")).unwrap();
    client.stop();

    let line = fs::read_to_string(&signals).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(value["type"], "app.launched");
    assert_eq!(value["app_id"], "com.example.loaded");
    assert_eq!(value["is_test_mode"], true);
}

#[test]
fn test_configured_memory_provider_is_readable() {
    let mut bounded = ProviderSpec::new("recent", ProviderKind::Memory);
    bounded.capacity = Some(2);
    let config = config_with(vec![
        ProviderSpec::new("session", ProviderKind::Session),
        bounded,
    ]);
    let ctx = context();
    let client = TelemetryClient::from_config(&ctx, &config).unwrap();

    let buffer = client.buffer("recent").expect("memory buffer");
    assert_eq!(buffer.signal_types(), vec!["session.started"]);
    assert!(client.buffer("session").is_none());

    client.dispatch(&client.signal("app.launched")).unwrap();
    client.dispatch(&client.signal("app.backgrounded")).unwrap();
    client.stop();

    // capacity 2 keeps the two most recent signals
    assert_eq!(buffer.signal_types(), vec!["app.launched", "app.backgrounded"]);
    assert_eq!(
        buffer.snapshot()[0].app_id.as_deref(),
        Some("com.example.configured")
    );
}

#[test]
fn test_capacity_on_non_memory_provider_is_rejected() {
    let mut spec = ProviderSpec::new("audit", ProviderKind::Log);
    spec.capacity = Some(10);
    let ctx = context();

    let result = TelemetryClient::from_config(&ctx, &config_with(vec![spec]));
    assert!(matches!(result, Err(TelemetryError::ConfigError(ref m)) if m.contains("capacity")));
}
