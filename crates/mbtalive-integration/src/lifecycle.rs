//! Per-entry lifecycle: forwarding config entries to the sensor platform.
//!
//! Each entry moves through
//! `Unconfigured -> Configuring -> Active -> Unconfiguring -> Unconfigured`.
//! The intermediate states only exist while the host call is in flight; a
//! failed transition puts the entry back where it was.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mbtalive_core::{ConfigEntry, EntryState, Host, HostError, Platform, PLATFORMS};
use parking_lot::RwLock;
use serde::Serialize;

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Lifecycle error types.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The host failed to set up the downstream platform.
    #[error("Forwarding entry {entry_id} to {platforms} failed: {source}")]
    Forward {
        entry_id: String,
        platforms: String,
        source: HostError,
    },

    /// The host reported that the platforms could not be unloaded.
    #[error("Host refused to unload platforms for entry {0}")]
    UnloadRejected(String),

    /// The host failed while unloading.
    #[error("Unloading entry {entry_id} failed: {source}")]
    Unload { entry_id: String, source: HostError },

    /// Another setup or unload of the same entry is still running.
    #[error("Entry {entry_id} is {state}")]
    TransitionInProgress { entry_id: String, state: EntryState },
}

/// Bookkeeping for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// Current state
    pub state: EntryState,
    /// When the state last changed
    pub updated_at: DateTime<Utc>,
    /// Error of the last failed transition, cleared on success
    pub last_error: Option<String>,
}

impl EntryInfo {
    fn new(state: EntryState) -> Self {
        Self {
            state,
            updated_at: Utc::now(),
            last_error: None,
        }
    }
}

/// Drives setup and unload of configuration entries.
#[derive(Debug)]
pub struct EntryLifecycleController {
    platforms: Vec<Platform>,
    entries: RwLock<HashMap<String, EntryInfo>>,
}

impl EntryLifecycleController {
    /// Controller forwarding to this integration's platforms.
    pub fn new() -> Self {
        Self::with_platforms(PLATFORMS)
    }

    pub fn with_platforms(platforms: &[Platform]) -> Self {
        Self {
            platforms: platforms.to_vec(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Set up an entry. Never fails; errors are logged and yield `false`.
    pub async fn setup_entry(&self, host: &dyn Host, entry: &ConfigEntry) -> bool {
        tracing::debug!("Setting up entry: {}", entry.entry_id);

        match self.try_setup_entry(host, entry).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    entry_id = %entry.entry_id,
                    "Error setting up entry {}: {}",
                    entry.entry_id,
                    e
                );
                false
            }
        }
    }

    /// Set up an entry, propagating failures.
    pub async fn try_setup_entry(&self, host: &dyn Host, entry: &ConfigEntry) -> Result<()> {
        let transition = self.begin(&entry.entry_id, EntryState::Configuring)?;

        tracing::debug!(
            "Forwarding setup to {} platform for entry {}",
            self.platform_names(),
            entry.entry_id
        );

        match host
            .config_entries()
            .forward_entry_setups(entry, &self.platforms)
            .await
        {
            Ok(()) => {
                transition.complete(EntryState::Active, None);
                Ok(())
            }
            Err(source) => {
                let err = LifecycleError::Forward {
                    entry_id: entry.entry_id.clone(),
                    platforms: self.platform_names(),
                    source,
                };
                transition.revert(err.to_string());
                Err(err)
            }
        }
    }

    /// Unload an entry. Returns `true` only if the host unloaded every
    /// platform; never fails.
    pub async fn unload_entry(&self, host: &dyn Host, entry: &ConfigEntry) -> bool {
        tracing::info!("Unloading MBTALive config entry: {}", entry.entry_id);

        match self.try_unload_entry(host, entry).await {
            Ok(()) => {
                tracing::debug!("Successfully unloaded platforms for entry {}", entry.entry_id);
                true
            }
            Err(LifecycleError::UnloadRejected(_)) => {
                tracing::warn!("Failed to unload platforms for entry {}", entry.entry_id);
                false
            }
            Err(e) => {
                tracing::error!(
                    entry_id = %entry.entry_id,
                    "Error during unloading entry {}: {}",
                    entry.entry_id,
                    e
                );
                false
            }
        }
    }

    /// Unload an entry, propagating failures.
    pub async fn try_unload_entry(&self, host: &dyn Host, entry: &ConfigEntry) -> Result<()> {
        let transition = self.begin(&entry.entry_id, EntryState::Unconfiguring)?;

        match host
            .config_entries()
            .unload_platforms(entry, &self.platforms)
            .await
        {
            Ok(true) => {
                transition.complete(EntryState::Unconfigured, None);
                Ok(())
            }
            Ok(false) => {
                let err = LifecycleError::UnloadRejected(entry.entry_id.clone());
                transition.revert(err.to_string());
                Err(err)
            }
            Err(source) => {
                let err = LifecycleError::Unload {
                    entry_id: entry.entry_id.clone(),
                    source,
                };
                transition.revert(err.to_string());
                Err(err)
            }
        }
    }

    /// Current state of an entry; unknown entries are unconfigured.
    pub fn state(&self, entry_id: &str) -> EntryState {
        self.entries
            .read()
            .get(entry_id)
            .map(|info| info.state)
            .unwrap_or_default()
    }

    pub fn info(&self, entry_id: &str) -> Option<EntryInfo> {
        self.entries.read().get(entry_id).cloned()
    }

    /// Ids of entries whose platforms are running, sorted.
    pub fn active_entries(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, info)| info.state.is_active())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Move an entry into a transitional state.
    ///
    /// Check and update happen under one lock so two transitions of the same
    /// entry can never overlap. The returned guard puts the entry back into
    /// its previous state if it is dropped before being settled, which is
    /// what happens when the host cancels the call.
    fn begin(&self, entry_id: &str, transitional: EntryState) -> Result<Transition<'_>> {
        let mut entries = self.entries.write();
        let info = entries
            .entry(entry_id.to_string())
            .or_insert_with(|| EntryInfo::new(EntryState::Unconfigured));

        if info.state.is_transitioning() {
            return Err(LifecycleError::TransitionInProgress {
                entry_id: entry_id.to_string(),
                state: info.state,
            });
        }

        let previous = info.state;
        info.state = transitional;
        info.updated_at = Utc::now();

        Ok(Transition {
            entries: &self.entries,
            entry_id: entry_id.to_string(),
            transitional,
            previous,
            settled: false,
        })
    }

    fn platform_names(&self) -> String {
        self.platforms
            .iter()
            .map(Platform::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// An in-flight setup or unload of one entry.
#[derive(Debug)]
struct Transition<'a> {
    entries: &'a RwLock<HashMap<String, EntryInfo>>,
    entry_id: String,
    transitional: EntryState,
    previous: EntryState,
    settled: bool,
}

impl Transition<'_> {
    #[cfg(test)]
    fn previous(&self) -> EntryState {
        self.previous
    }

    /// The host call finished; record the resulting state.
    fn complete(mut self, state: EntryState, error: Option<String>) {
        self.settle(state, error);
    }

    /// The host call failed; go back to the state the entry had before.
    fn revert(mut self, error: String) {
        let previous = self.previous;
        self.settle(previous, Some(error));
    }

    fn settle(&mut self, state: EntryState, error: Option<String>) {
        self.settled = true;

        let mut entries = self.entries.write();
        // Unconfigured entries are only remembered for a failed setup
        let forget = state == EntryState::Unconfigured
            && (error.is_none() || self.transitional == EntryState::Unconfiguring);
        if forget {
            entries.remove(&self.entry_id);
            return;
        }

        let info = entries
            .entry(self.entry_id.clone())
            .or_insert_with(|| EntryInfo::new(state));
        info.state = state;
        info.updated_at = Utc::now();
        info.last_error = error;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!(
            entry_id = %self.entry_id,
            "Entry {} cancelled while {}",
            self.entry_id,
            self.transitional
        );
        let previous = self.previous;
        let error = format!("Cancelled while {}", self.transitional);
        self.settle(previous, Some(error));
    }
}

impl Default for EntryLifecycleController {
    fn default() -> Self {
        Self::new()
    }
}
