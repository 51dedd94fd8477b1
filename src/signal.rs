//! Signal envelope and shared helpers: timestamps and session id generation.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// One telemetry event as delivered to providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub signal_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_user: Option<String>,
    pub received_at: String,
    #[serde(default)]
    pub is_test_mode: bool,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl Signal {
    pub fn new(signal_type: impl Into<String>) -> Self {
        Self {
            signal_type: signal_type.into(),
            app_id: None,
            session_id: None,
            client_user: None,
            received_at: now_rfc3339(),
            is_test_mode: false,
            payload: Map::new(),
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn with_app(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.client_user = Some(user.into());
        self
    }

    pub fn test_mode(mut self, enabled: bool) -> Self {
        self.is_test_mode = enabled;
        self
    }
}

/// Current UTC time as RFC 3339 with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time as milliseconds since Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a unique session id.
pub fn new_session_id() -> String {
    let ts = now_millis();
    let pid = std::process::id();
    let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("sess-{ts}-{pid}-{seq}")
}
