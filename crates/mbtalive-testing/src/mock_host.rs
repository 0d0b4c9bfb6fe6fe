//! In-memory host with failure injection.
//!
//! Every facility records what it was asked to do so tests can assert on
//! side effects, and each one can be removed or made to fail.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mbtalive_core::config::constants;
use mbtalive_core::error::Result;
use mbtalive_core::{
    ConfigEntries, ConfigEntry, Frontend, Host, HostData, HostError, Platform, ResourceList,
    StaticPaths, UiResource,
};
use parking_lot::Mutex;

/// How the mock answers `unload_platforms`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnloadBehavior {
    /// `true` if the entry was loaded, `false` otherwise.
    #[default]
    Track,
    /// Always report that unloading failed.
    Refuse,
    /// Fail with a platform error.
    Fail(String),
}

/// One recorded `register_static_path` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPathRegistration {
    pub url_path: String,
    pub file_path: PathBuf,
    pub cache_headers: bool,
}

#[derive(Default)]
struct MockConfigEntries {
    forward_failure: Mutex<Option<String>>,
    forward_delay: Mutex<Option<Duration>>,
    unload_delay: Mutex<Option<Duration>>,
    unload_behavior: Mutex<UnloadBehavior>,
    loaded: Mutex<HashSet<String>>,
    forward_calls: AtomicUsize,
    unload_calls: AtomicUsize,
}

#[async_trait]
impl ConfigEntries for MockConfigEntries {
    async fn forward_entry_setups(
        &self,
        entry: &ConfigEntry,
        _platforms: &[Platform],
    ) -> Result<()> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.forward_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.forward_failure.lock().clone() {
            return Err(HostError::Platform(message));
        }
        self.loaded.lock().insert(entry.entry_id.clone());
        Ok(())
    }

    async fn unload_platforms(&self, entry: &ConfigEntry, _platforms: &[Platform]) -> Result<bool> {
        self.unload_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.unload_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let behavior = self.unload_behavior.lock().clone();
        match behavior {
            UnloadBehavior::Track => Ok(self.loaded.lock().remove(&entry.entry_id)),
            UnloadBehavior::Refuse => Ok(false),
            UnloadBehavior::Fail(message) => Err(HostError::Platform(message)),
        }
    }
}

#[derive(Default)]
struct MockStaticPaths {
    unsupported: bool,
    registrations: Mutex<Vec<StaticPathRegistration>>,
}

#[async_trait]
impl StaticPaths for MockStaticPaths {
    async fn register_static_path(
        &self,
        url_path: &str,
        file_path: &Path,
        cache_headers: bool,
    ) -> Result<()> {
        if self.unsupported {
            return Err(HostError::Unsupported("register_static_path".to_string()));
        }

        let mut registrations = self.registrations.lock();
        if let Some(existing) = registrations.iter().find(|r| r.url_path == url_path) {
            if existing.file_path == file_path {
                return Ok(());
            }
            return Err(HostError::Platform(format!(
                "{} is already served from {}",
                url_path,
                existing.file_path.display()
            )));
        }

        registrations.push(StaticPathRegistration {
            url_path: url_path.to_string(),
            file_path: file_path.to_path_buf(),
            cache_headers,
        });
        Ok(())
    }
}

#[derive(Default)]
struct MockFrontend {
    unsupported: bool,
    urls: Mutex<Vec<String>>,
}

impl Frontend for MockFrontend {
    fn add_extra_js_url(&self, url: &str) -> Result<()> {
        if self.unsupported {
            return Err(HostError::Unsupported("add_extra_js_url".to_string()));
        }
        let mut urls = self.urls.lock();
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
        Ok(())
    }
}

/// In-memory host.
pub struct MockHost {
    config_dir: PathBuf,
    data: HostData,
    entries: MockConfigEntries,
    http: Option<MockStaticPaths>,
    frontend: Option<MockFrontend>,
}

impl MockHost {
    /// Host with every facility available and working.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            data: HostData::new(),
            entries: MockConfigEntries::default(),
            http: Some(MockStaticPaths::default()),
            frontend: Some(MockFrontend::default()),
        }
    }

    /// Host version without static path serving.
    pub fn without_http(mut self) -> Self {
        self.http = None;
        self
    }

    /// Host version without frontend extension points.
    pub fn without_frontend(mut self) -> Self {
        self.frontend = None;
        self
    }

    /// Static path serving exists but reports itself unsupported.
    pub fn with_http_unsupported(mut self) -> Self {
        self.http = Some(MockStaticPaths {
            unsupported: true,
            ..Default::default()
        });
        self
    }

    /// Extra JS URLs exist but report themselves unsupported.
    pub fn with_frontend_unsupported(mut self) -> Self {
        self.frontend = Some(MockFrontend {
            unsupported: true,
            ..Default::default()
        });
        self
    }

    pub fn with_forward_failure(self, message: impl Into<String>) -> Self {
        self.set_forward_failure(Some(message.into()));
        self
    }

    pub fn with_unload_behavior(self, behavior: UnloadBehavior) -> Self {
        self.set_unload_behavior(behavior);
        self
    }

    /// Make every setup take `delay` before the host answers.
    pub fn with_forward_delay(self, delay: Duration) -> Self {
        self.set_forward_delay(Some(delay));
        self
    }

    pub fn set_forward_delay(&self, delay: Option<Duration>) {
        *self.entries.forward_delay.lock() = delay;
    }

    /// Make every unload take `delay` before the host answers.
    pub fn set_unload_delay(&self, delay: Option<Duration>) {
        *self.entries.unload_delay.lock() = delay;
    }

    pub fn set_forward_failure(&self, message: Option<String>) {
        *self.entries.forward_failure.lock() = message;
    }

    pub fn set_unload_behavior(&self, behavior: UnloadBehavior) {
        *self.entries.unload_behavior.lock() = behavior;
    }

    /// Static paths registered so far.
    pub fn static_paths(&self) -> Vec<StaticPathRegistration> {
        self.http
            .as_ref()
            .map(|http| http.registrations.lock().clone())
            .unwrap_or_default()
    }

    /// Extra JS URLs added so far.
    pub fn extra_js_urls(&self) -> Vec<String> {
        self.frontend
            .as_ref()
            .map(|frontend| frontend.urls.lock().clone())
            .unwrap_or_default()
    }

    /// Declared UI resources.
    pub fn resources(&self) -> Vec<UiResource> {
        match self.data.get::<ResourceList>(constants::RESOURCE_STORE_KEY) {
            Ok(Some(resources)) => resources.list(),
            _ => Vec::new(),
        }
    }

    pub fn forward_calls(&self) -> usize {
        self.entries.forward_calls.load(Ordering::SeqCst)
    }

    pub fn unload_calls(&self) -> usize {
        self.entries.unload_calls.load(Ordering::SeqCst)
    }

    /// Whether the sensor platform currently holds the entry.
    pub fn is_loaded(&self, entry_id: &str) -> bool {
        self.entries.loaded.lock().contains(entry_id)
    }
}

impl Host for MockHost {
    fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn data(&self) -> &HostData {
        &self.data
    }

    fn config_entries(&self) -> &dyn ConfigEntries {
        &self.entries
    }

    fn http(&self) -> Option<&dyn StaticPaths> {
        self.http.as_ref().map(|http| http as &dyn StaticPaths)
    }

    fn frontend(&self) -> Option<&dyn Frontend> {
        self.frontend.as_ref().map(|frontend| frontend as &dyn Frontend)
    }
}
