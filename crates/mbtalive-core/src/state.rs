//! Process-wide host data and the domain-scoped state built on top of it.
//!
//! `HostData` is the host's shared key-value store, one value per key, any
//! type. `DomainStateStore` is the narrow view the integration uses: it only
//! ever touches the value stored under its own domain key.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StateError;

type AnyValue = Arc<dyn Any + Send + Sync>;

/// Shared key-value store owned by the host for the life of the process.
#[derive(Default)]
pub struct HostData {
    values: RwLock<HashMap<String, AnyValue>>,
}

impl HostData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value under `key`, creating it with `init` if absent.
    ///
    /// Check and insert happen under one write lock, so concurrent callers
    /// always observe the same value. An existing value of another type is
    /// reported as `StateError::TypeMismatch` and left untouched.
    pub fn get_or_insert_with<T, F>(&self, key: &str, init: F) -> Result<Arc<T>, StateError>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let mut values = self.values.write();
        if let Some(existing) = values.get(key) {
            return downcast(key, existing.clone());
        }

        let value = Arc::new(init());
        values.insert(key.to_string(), value.clone());
        Ok(value)
    }

    /// Get the value under `key`, if any.
    pub fn get<T>(&self, key: &str) -> Result<Option<Arc<T>>, StateError>
    where
        T: Any + Send + Sync,
    {
        match self.values.read().get(key) {
            Some(existing) => downcast(key, existing.clone()).map(Some),
            None => Ok(None),
        }
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn insert<T>(&self, key: &str, value: T)
    where
        T: Any + Send + Sync,
    {
        self.values.write().insert(key.to_string(), Arc::new(value));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl std::fmt::Debug for HostData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self.values.read().keys().cloned().collect();
        keys.sort();
        f.debug_struct("HostData").field("keys", &keys).finish()
    }
}

fn downcast<T>(key: &str, value: AnyValue) -> Result<Arc<T>, StateError>
where
    T: Any + Send + Sync,
{
    value.downcast::<T>().map_err(|_| StateError::TypeMismatch {
        key: key.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

/// Runtime objects of one integration, keyed by config entry id.
///
/// Nothing is stored per entry yet; the map is reserved for entry handlers.
#[derive(Default)]
pub struct DomainState {
    entries: RwLock<HashMap<String, AnyValue>>,
}

impl DomainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a runtime object to an entry, replacing any previous one.
    pub fn insert_entry<T>(&self, entry_id: &str, value: T)
    where
        T: Any + Send + Sync,
    {
        self.entries
            .write()
            .insert(entry_id.to_string(), Arc::new(value));
    }

    /// Get the runtime object of an entry if it has the expected type.
    pub fn entry<T>(&self, entry_id: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.entries
            .read()
            .get(entry_id)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Detach an entry's runtime object. Returns whether one was present.
    pub fn remove_entry(&self, entry_id: &str) -> bool {
        self.entries.write().remove(entry_id).is_some()
    }

    pub fn contains_entry(&self, entry_id: &str) -> bool {
        self.entries.read().contains_key(entry_id)
    }

    pub fn entry_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for DomainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainState")
            .field("entries", &self.entry_ids())
            .finish()
    }
}

/// Domain-scoped view over `HostData`.
#[derive(Debug, Clone, Copy)]
pub struct DomainStateStore<'a> {
    data: &'a HostData,
    domain: &'a str,
}

impl<'a> DomainStateStore<'a> {
    pub fn new(data: &'a HostData, domain: &'a str) -> Self {
        Self { data, domain }
    }

    pub fn domain(&self) -> &str {
        self.domain
    }

    /// Create the domain state if it does not exist yet and return it.
    ///
    /// Existing state is returned as is, never reset.
    pub fn init_if_absent(&self) -> Result<Arc<DomainState>, StateError> {
        let mut created = false;
        let state = self.data.get_or_insert_with(self.domain, || {
            created = true;
            DomainState::new()
        })?;

        if created {
            tracing::debug!(domain = %self.domain, "Domain state created");
        } else {
            tracing::debug!(
                domain = %self.domain,
                entries = state.len(),
                "Domain state already initialized"
            );
        }
        Ok(state)
    }

    /// Get the domain state without creating it.
    pub fn get(&self) -> Result<Option<Arc<DomainState>>, StateError> {
        self.data.get::<DomainState>(self.domain)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.get(), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_insert_with_runs_init_once() {
        let data = HostData::new();
        let mut calls = 0;

        let first = data
            .get_or_insert_with("counter", || {
                calls += 1;
                42u32
            })
            .unwrap();
        let second = data
            .get_or_insert_with("counter", || {
                calls += 1;
                7u32
            })
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(*first, 42);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_type_mismatch_leaves_value() {
        let data = HostData::new();
        data.insert("mbtalive", "not a domain state".to_string());

        let err = data
            .get_or_insert_with("mbtalive", DomainState::new)
            .unwrap_err();
        assert!(matches!(err, StateError::TypeMismatch { .. }));

        let kept = data.get::<String>("mbtalive").unwrap().unwrap();
        assert_eq!(kept.as_str(), "not a domain state");
    }

    #[test]
    fn test_domain_state_created_once() {
        let data = HostData::new();
        let store = DomainStateStore::new(&data, "mbtalive");
        assert!(!store.is_initialized());

        let state = store.init_if_absent().unwrap();
        state.insert_entry("E1", 1u8);

        let again = store.init_if_absent().unwrap();
        assert!(Arc::ptr_eq(&state, &again));
        assert_eq!(again.len(), 1);
        assert!(store.is_initialized());
    }

    #[test]
    fn test_domain_state_entries() {
        let state = DomainState::new();
        assert!(state.is_empty());

        state.insert_entry("b", "handler-b".to_string());
        state.insert_entry("a", "handler-a".to_string());
        assert_eq!(state.entry_ids(), vec!["a", "b"]);
        assert_eq!(
            state.entry::<String>("a").as_deref().map(String::as_str),
            Some("handler-a")
        );
        assert!(state.entry::<u32>("a").is_none());

        assert!(state.remove_entry("a"));
        assert!(!state.remove_entry("a"));
        assert!(!state.contains_entry("a"));
        assert_eq!(state.len(), 1);
    }
}
