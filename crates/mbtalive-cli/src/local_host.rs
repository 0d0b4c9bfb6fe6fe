//! A minimal host rooted at a real configuration directory.
//!
//! Used to try the integration without a full automation platform: every
//! facility is implemented in memory and its effects can be inspected or
//! served over HTTP.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mbtalive_core::config::constants;
use mbtalive_core::error::Result;
use mbtalive_core::{
    ConfigEntries, ConfigEntry, DomainStateStore, Frontend, Host, HostData, HostError, Platform,
    ResourceList, StaticPaths, UiResource,
};
use parking_lot::RwLock;
use serde::Serialize;

/// A file served at a fixed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticRoute {
    pub url_path: String,
    pub file_path: PathBuf,
    pub cache_headers: bool,
}

#[derive(Default)]
struct LocalConfigEntries {
    loaded: RwLock<BTreeMap<String, Vec<Platform>>>,
}

#[async_trait]
impl ConfigEntries for LocalConfigEntries {
    async fn forward_entry_setups(&self, entry: &ConfigEntry, platforms: &[Platform]) -> Result<()> {
        let mut loaded = self.loaded.write();
        if loaded.contains_key(&entry.entry_id) {
            return Err(HostError::Platform(format!(
                "entry {} is already set up",
                entry.entry_id
            )));
        }
        for platform in platforms {
            tracing::info!(entry_id = %entry.entry_id, "Setting up {} platform", platform);
        }
        loaded.insert(entry.entry_id.clone(), platforms.to_vec());
        Ok(())
    }

    async fn unload_platforms(&self, entry: &ConfigEntry, platforms: &[Platform]) -> Result<bool> {
        let mut loaded = self.loaded.write();
        let Some(running) = loaded.get(&entry.entry_id) else {
            return Ok(false);
        };
        if !platforms.iter().all(|p| running.contains(p)) {
            return Ok(false);
        }
        loaded.remove(&entry.entry_id);
        Ok(true)
    }
}

#[derive(Default)]
struct LocalStaticPaths {
    routes: RwLock<BTreeMap<String, StaticRoute>>,
}

#[async_trait]
impl StaticPaths for LocalStaticPaths {
    async fn register_static_path(
        &self,
        url_path: &str,
        file_path: &Path,
        cache_headers: bool,
    ) -> Result<()> {
        if !url_path.starts_with('/') {
            return Err(HostError::Platform(format!("invalid URL path: {}", url_path)));
        }

        let mut routes = self.routes.write();
        if let Some(existing) = routes.get(url_path) {
            if existing.file_path == file_path {
                return Ok(());
            }
            return Err(HostError::Platform(format!(
                "{} is already served from {}",
                url_path,
                existing.file_path.display()
            )));
        }

        routes.insert(
            url_path.to_string(),
            StaticRoute {
                url_path: url_path.to_string(),
                file_path: file_path.to_path_buf(),
                cache_headers,
            },
        );
        Ok(())
    }
}

#[derive(Default)]
struct LocalFrontend {
    extra_js_urls: RwLock<BTreeSet<String>>,
}

impl Frontend for LocalFrontend {
    fn add_extra_js_url(&self, url: &str) -> Result<()> {
        self.extra_js_urls.write().insert(url.to_string());
        Ok(())
    }
}

/// What the host looks like after running hooks.
#[derive(Debug, Clone, Serialize)]
pub struct HostSnapshot {
    pub config_dir: PathBuf,
    pub domain_state: bool,
    pub static_paths: Vec<StaticRoute>,
    pub resources: Vec<UiResource>,
    pub extra_js_urls: Vec<String>,
    pub loaded_entries: Vec<String>,
}

/// In-process host rooted at a configuration directory.
pub struct LocalHost {
    config_dir: PathBuf,
    data: HostData,
    entries: LocalConfigEntries,
    http: LocalStaticPaths,
    frontend: LocalFrontend,
}

impl LocalHost {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            data: HostData::new(),
            entries: LocalConfigEntries::default(),
            http: LocalStaticPaths::default(),
            frontend: LocalFrontend::default(),
        }
    }

    pub fn static_routes(&self) -> Vec<StaticRoute> {
        self.http.routes.read().values().cloned().collect()
    }

    pub fn resources(&self) -> Vec<UiResource> {
        match self.data.get::<ResourceList>(constants::RESOURCE_STORE_KEY) {
            Ok(Some(resources)) => resources.list(),
            _ => Vec::new(),
        }
    }

    pub fn extra_js_urls(&self) -> Vec<String> {
        self.frontend.extra_js_urls.read().iter().cloned().collect()
    }

    pub fn snapshot(&self) -> HostSnapshot {
        HostSnapshot {
            config_dir: self.config_dir.clone(),
            domain_state: DomainStateStore::new(&self.data, constants::DOMAIN).is_initialized(),
            static_paths: self.static_routes(),
            resources: self.resources(),
            extra_js_urls: self.extra_js_urls(),
            loaded_entries: self.entries.loaded.read().keys().cloned().collect(),
        }
    }
}

impl Host for LocalHost {
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
        Some(&self.http)
    }

    fn frontend(&self) -> Option<&dyn Frontend> {
        Some(&self.frontend)
    }
}
