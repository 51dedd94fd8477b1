//! Telemetry client: the facade applications use.
//!
//! Owns the provider registry and the client lifecycle state behind a single
//! `parking_lot::RwLock`. `register` and `stop` take the lock exclusively; `dispatch`
//! and `flush` share it. Because `stop` needs exclusive access it waits for every
//! in-flight dispatch to finish before any provider is stopped, and a dispatch that
//! arrives afterwards fails with [`TelemetryError::ClientAlreadyStopped`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builtin::{ProviderFactory, SignalBuffer};
use crate::config::ClientConfig;
use crate::error::{FailureKind, TelemetryError};
use crate::host::HostContext;
use crate::provider::{
    ProviderId, ProviderRegistry, ProviderState, ProviderStatus, TelemetryProvider,
};
use crate::report::{FailureSink, TracingSink};
use crate::signal::{new_session_id, Signal};

mod bus;
pub mod handle;
mod isolation;

use bus::SignalBus;
pub use handle::ClientHandle;

/// Client lifecycle state. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientState {
    Active,
    Stopped,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Active => f.write_str("active"),
            ClientState::Stopped => f.write_str("stopped"),
        }
    }
}

/// Outcome of one `dispatch` or `flush` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Successful ingestion calls
    pub delivered: usize,
    /// Ingestion calls that failed and were reported
    pub failed: usize,
    /// Provider-submitted signals delivered alongside this call
    pub drained: usize,
}

impl DispatchReport {
    fn absorb(&mut self, other: DispatchReport) {
        self.delivered += other.delivered;
        self.failed += other.failed;
        self.drained += other.drained;
    }
}

/// Outcome of a `stop` call. All zeros when the client was already stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopReport {
    pub stopped: usize,
    pub failed: usize,
    /// Pending provider-submitted signals delivered before shutdown
    pub flushed: usize,
}

struct ClientSettings {
    session_id: String,
    default_user: Option<String>,
    test_mode: bool,
}

struct ClientCore {
    state: ClientState,
    registry: ProviderRegistry,
}

pub(crate) struct ClientInner {
    pub(crate) context: Weak<HostContext>,
    pub(crate) bus: SignalBus,
    core: RwLock<ClientCore>,
    sink: Arc<dyn FailureSink>,
    active: AtomicBool,
    settings: ClientSettings,
}

impl ClientInner {
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn stamp(&self, mut signal: Signal) -> Signal {
        if signal.app_id.is_none() {
            signal.app_id = self.context.upgrade().map(|ctx| ctx.app_id.clone());
        }
        if signal.session_id.is_none() {
            signal.session_id = Some(self.settings.session_id.clone());
        }
        if signal.client_user.is_none() {
            signal.client_user = self.settings.default_user.clone();
        }
        signal.is_test_mode |= self.settings.test_mode;
        signal
    }

    fn deliver(&self, registry: &ProviderRegistry, signal: &Signal) -> DispatchReport {
        let mut report = DispatchReport::default();
        for entry in registry.registered() {
            let delivered = isolation::isolate(
                self.sink.as_ref(),
                FailureKind::Dispatch,
                entry.id(),
                entry.name(),
                || entry.provider().ingest(signal),
            );
            if delivered {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }

    /// Drop every queued signal. Only valid once the client is no longer active.
    pub(crate) fn discard_pending(&self) -> usize {
        let discarded = self.bus.drain().len();
        if discarded > 0 {
            debug!(discarded, "dropping signals submitted during shutdown");
        }
        discarded
    }

    fn deliver_pending(&self, registry: &ProviderRegistry) -> DispatchReport {
        let mut report = DispatchReport::default();
        for signal in self.bus.drain() {
            report.absorb(self.deliver(registry, &signal));
            report.drained += 1;
        }
        report
    }
}

/// Builder for [`TelemetryClient`]
pub struct ClientBuilder {
    context: Weak<HostContext>,
    sink: Arc<dyn FailureSink>,
    session_id: Option<String>,
    default_user: Option<String>,
    test_mode: bool,
}

impl ClientBuilder {
    pub fn sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn default_user(mut self, user: Option<String>) -> Self {
        self.default_user = user;
        self
    }

    pub fn test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    pub fn build(self) -> TelemetryClient {
        let settings = ClientSettings {
            session_id: self.session_id.unwrap_or_else(new_session_id),
            default_user: self.default_user,
            test_mode: self.test_mode,
        };
        debug!(session_id = %settings.session_id, "telemetry client created");
        TelemetryClient {
            inner: Arc::new(ClientInner {
                context: self.context,
                bus: SignalBus::new(),
                core: RwLock::new(ClientCore {
                    state: ClientState::Active,
                    registry: ProviderRegistry::new(),
                }),
                sink: self.sink,
                active: AtomicBool::new(true),
                settings,
            }),
            buffers: BTreeMap::new(),
        }
    }
}

/// Telemetry client
///
/// Forwards signals to every registered provider and manages their lifecycle.
/// Provider failures are isolated and reported to the configured [`FailureSink`];
/// they never reach the caller. Dropping an active client stops it.
pub struct TelemetryClient {
    inner: Arc<ClientInner>,
    buffers: BTreeMap<String, SignalBuffer>,
}

impl TelemetryClient {
    /// Create a client reporting failures through `tracing`
    pub fn new(context: &Arc<HostContext>) -> Self {
        Self::builder(context).build()
    }

    pub fn with_sink(context: &Arc<HostContext>, sink: Arc<dyn FailureSink>) -> Self {
        Self::builder(context).sink(sink).build()
    }

    pub fn builder(context: &Arc<HostContext>) -> ClientBuilder {
        ClientBuilder {
            context: Arc::downgrade(context),
            sink: Arc::new(TracingSink),
            session_id: None,
            default_user: None,
            test_mode: false,
        }
    }

    /// Create a client and register every enabled provider from the configuration,
    /// in the order they are listed.
    ///
    /// Signals the providers submitted while registering are delivered before this
    /// returns. Buffers of `memory` providers are available through [`Self::buffer`].
    pub fn from_config(
        context: &Arc<HostContext>,
        config: &ClientConfig,
    ) -> Result<Self, TelemetryError> {
        let built = ProviderFactory::build_all(&config.providers)?;
        let mut client = Self::builder(context)
            .test_mode(config.test_mode)
            .default_user(config.default_user.clone())
            .build();
        for entry in built {
            if let Some(buffer) = entry.buffer {
                client.buffers.entry(entry.name).or_insert(buffer);
            }
            client.register_boxed(entry.provider)?;
        }
        client.flush()?;
        Ok(client)
    }

    pub fn register<P>(&self, provider: P) -> Result<ProviderId, TelemetryError>
    where
        P: TelemetryProvider + 'static,
    {
        self.register_boxed(Box::new(provider))
    }

    /// Append a provider and run its `register` call
    ///
    /// A failing provider stays `Unregistered`; the failure goes to the sink and the
    /// entry's id is still returned. Only a stopped client yields an error.
    pub fn register_boxed(
        &self,
        provider: Box<dyn TelemetryProvider>,
    ) -> Result<ProviderId, TelemetryError> {
        let mut core = self.inner.core.write();
        if core.state == ClientState::Stopped {
            return Err(TelemetryError::ClientAlreadyStopped);
        }

        let name = isolation::provider_name(provider.as_ref(), core.registry.next_id());
        let id = core.registry.add(name.clone(), provider);
        let context = self.inner.context.upgrade();
        let handle = self.handle();
        if let Some(entry) = core.registry.get_mut(id) {
            let registered = isolation::isolate(
                self.inner.sink.as_ref(),
                FailureKind::Registration,
                id,
                &name,
                || entry.provider_mut().register(context.as_deref(), handle),
            );
            if registered {
                entry.mark_registered();
                debug!(provider_id = %id, provider = %name, "provider registered");
            }
        }
        Ok(id)
    }

    /// Deliver a signal to every registered provider in registration order
    ///
    /// Signals that providers submitted through their [`ClientHandle`] are delivered
    /// right after it.
    pub fn dispatch(&self, signal: &Signal) -> Result<DispatchReport, TelemetryError> {
        let core = self.inner.core.read();
        if core.state == ClientState::Stopped {
            return Err(TelemetryError::ClientAlreadyStopped);
        }
        let mut report = self.inner.deliver(&core.registry, signal);
        report.absorb(self.inner.deliver_pending(&core.registry));
        Ok(report)
    }

    /// Deliver pending provider-submitted signals without a new signal
    pub fn flush(&self) -> Result<DispatchReport, TelemetryError> {
        let core = self.inner.core.read();
        if core.state == ClientState::Stopped {
            return Err(TelemetryError::ClientAlreadyStopped);
        }
        Ok(self.inner.deliver_pending(&core.registry))
    }

    /// Stop every registered provider and move the client to `Stopped`
    ///
    /// Idempotent: once stopped, further calls do nothing. Pending provider-submitted
    /// signals are delivered first; signals submitted while providers stop are dropped.
    pub fn stop(&self) -> StopReport {
        let mut core = self.inner.core.write();
        if core.state == ClientState::Stopped {
            return StopReport::default();
        }

        let flushed = self.inner.deliver_pending(&core.registry);
        let mut report = StopReport {
            flushed: flushed.drained,
            ..StopReport::default()
        };

        for entry in core.registry.iter_mut() {
            if !entry.is_registered() {
                continue;
            }
            let id = entry.id();
            let name = entry.name().to_string();
            let stopped = isolation::isolate(
                self.inner.sink.as_ref(),
                FailureKind::Stop,
                id,
                &name,
                || entry.provider_mut().stop(),
            );
            entry.mark_stopped();
            if stopped {
                report.stopped += 1;
            } else {
                report.failed += 1;
            }
        }

        core.state = ClientState::Stopped;
        self.inner.active.store(false, Ordering::SeqCst);

        self.inner.discard_pending();
        info!(
            stopped = report.stopped,
            failed = report.failed,
            "telemetry client stopped"
        );
        report
    }

    pub fn state(&self) -> ClientState {
        self.inner.core.read().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == ClientState::Active
    }

    pub fn provider_state(&self, id: ProviderId) -> Option<ProviderState> {
        self.inner.core.read().registry.state(id)
    }

    pub fn provider_count(&self) -> usize {
        self.inner.core.read().registry.len()
    }

    pub fn providers(&self) -> Vec<ProviderStatus> {
        self.inner.core.read().registry.statuses()
    }

    /// Signals received by the configured `memory` provider called `name`
    pub fn buffer(&self, name: &str) -> Option<SignalBuffer> {
        self.buffers.get(name).cloned()
    }

    pub fn session_id(&self) -> &str {
        &self.inner.settings.session_id
    }

    /// Build a signal stamped with this client's app, session, user and test mode
    pub fn signal(&self, signal_type: impl Into<String>) -> Signal {
        self.inner.stamp(Signal::new(signal_type))
    }

    /// Non-owning handle to this client
    pub fn handle(&self) -> ClientHandle {
        ClientHandle::new(Arc::downgrade(&self.inner))
    }
}

impl Drop for TelemetryClient {
    fn drop(&mut self) {
        if self.is_active() {
            self.stop();
        }
    }
}
