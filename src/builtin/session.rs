//! Session provider: announces the session when registered and logs its length on stop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::info;

use crate::client::ClientHandle;
use crate::error::ProviderError;
use crate::host::HostContext;
use crate::provider::TelemetryProvider;
use crate::signal::Signal;

pub const SESSION_STARTED: &str = "session.started";

pub struct SessionProvider {
    name: String,
    started: Option<Instant>,
    app_id: Option<String>,
    seen: AtomicU64,
}

impl SessionProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started: None,
            app_id: None,
            seen: AtomicU64::new(0),
        }
    }
}

impl TelemetryProvider for SessionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn register(
        &mut self,
        context: Option<&HostContext>,
        client: ClientHandle,
    ) -> Result<(), ProviderError> {
        self.app_id = context.map(|ctx| ctx.app_id.clone());
        let signal = client
            .signal(SESSION_STARTED)
            .unwrap_or_else(|| Signal::new(SESSION_STARTED))
            .with_payload("provider", self.name.clone());
        client
            .submit(signal)
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        self.started = Some(Instant::now());
        Ok(())
    }

    fn ingest(&self, _signal: &Signal) -> Result<(), ProviderError> {
        self.seen.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ProviderError> {
        let duration_ms = self
            .started
            .take()
            .map(|started| started.elapsed().as_millis())
            .unwrap_or(0);
        info!(
            provider = %self.name,
            app_id = self.app_id.as_deref().unwrap_or("unknown"),
            duration_ms,
            signals = self.seen.load(Ordering::Relaxed),
            "session ended"
        );
        Ok(())
    }
}
