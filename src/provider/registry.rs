//! Provider registry: ordered, append-only collection of provider entries.

use crate::provider::{ProviderId, ProviderState, ProviderStatus, TelemetryProvider};

/// One registered provider together with its registration index and lifecycle state
pub struct RegistryEntry {
    id: ProviderId,
    name: String,
    state: ProviderState,
    provider: Box<dyn TelemetryProvider>,
}

impl RegistryEntry {
    pub fn id(&self) -> ProviderId {
        self.id
    }

    pub fn state(&self) -> ProviderState {
        self.state
    }

    /// Name captured when the entry was added
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_registered(&self) -> bool {
        self.state == ProviderState::Registered
    }

    pub fn status(&self) -> ProviderStatus {
        ProviderStatus {
            id: self.id,
            name: self.name.clone(),
            state: self.state,
        }
    }

    pub(crate) fn provider(&self) -> &dyn TelemetryProvider {
        self.provider.as_ref()
    }

    pub(crate) fn provider_mut(&mut self) -> &mut dyn TelemetryProvider {
        self.provider.as_mut()
    }

    /// `Unregistered -> Registered`. Returns false (and changes nothing) from any other state.
    pub(crate) fn mark_registered(&mut self) -> bool {
        if self.state == ProviderState::Unregistered {
            self.state = ProviderState::Registered;
            true
        } else {
            false
        }
    }

    /// `Registered -> Stopped`. A no-op for unregistered or already stopped entries.
    pub(crate) fn mark_stopped(&mut self) -> bool {
        if self.state == ProviderState::Registered {
            self.state = ProviderState::Stopped;
            true
        } else {
            false
        }
    }
}

/// Provider registry
///
/// Entries are kept in registration order and never removed. Duplicate providers are
/// legal and become independent entries.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<RegistryEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next added entry will receive
    pub fn next_id(&self) -> ProviderId {
        ProviderId::new(self.entries.len())
    }

    /// Append a provider in the `Unregistered` state
    pub fn add(
        &mut self,
        name: impl Into<String>,
        provider: Box<dyn TelemetryProvider>,
    ) -> ProviderId {
        let id = self.next_id();
        self.entries.push(RegistryEntry {
            id,
            name: name.into(),
            state: ProviderState::Unregistered,
            provider,
        });
        id
    }

    pub fn get(&self, id: ProviderId) -> Option<&RegistryEntry> {
        self.entries.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: ProviderId) -> Option<&mut RegistryEntry> {
        self.entries.get_mut(id.index())
    }

    pub fn state(&self, id: ProviderId) -> Option<ProviderState> {
        self.get(id).map(RegistryEntry::state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Traverse entries in registration order. Restartable: each call starts from the first entry.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut RegistryEntry> {
        self.entries.iter_mut()
    }

    /// Entries currently in the `Registered` state, in registration order
    pub fn registered(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter().filter(|entry| entry.is_registered())
    }

    pub fn for_each<F>(&self, action: F)
    where
        F: FnMut(&RegistryEntry),
    {
        self.entries.iter().for_each(action);
    }

    pub fn statuses(&self) -> Vec<ProviderStatus> {
        self.entries.iter().map(RegistryEntry::status).collect()
    }
}
