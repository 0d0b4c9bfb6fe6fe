//! Host platform facilities the integration calls into.
//!
//! The host owns configuration entries, static file serving, the frontend
//! and the shared data store. Facilities that are not present in every host
//! version are exposed as `Option`s so callers can probe for them.

use std::path::Path;

use async_trait::async_trait;

use crate::entry::{ConfigEntry, Platform};
use crate::error::Result;
use crate::state::HostData;

/// Host platform handle passed to every lifecycle hook.
pub trait Host: Send + Sync {
    /// Root configuration directory of the host.
    fn config_dir(&self) -> &Path;

    /// Process-wide data store shared by all integrations.
    fn data(&self) -> &HostData;

    /// Config entry manager.
    fn config_entries(&self) -> &dyn ConfigEntries;

    /// Static file serving, if this host version has it.
    fn http(&self) -> Option<&dyn StaticPaths>;

    /// Frontend extension points, if this host version has them.
    fn frontend(&self) -> Option<&dyn Frontend>;
}

/// Config entry manager: forwards entries to downstream platforms.
#[async_trait]
pub trait ConfigEntries: Send + Sync {
    /// Set up `entry` on each of `platforms`.
    async fn forward_entry_setups(&self, entry: &ConfigEntry, platforms: &[Platform])
        -> Result<()>;

    /// Unload `entry` from each of `platforms`.
    ///
    /// Returns `false` when the host could not unload every platform.
    async fn unload_platforms(&self, entry: &ConfigEntry, platforms: &[Platform]) -> Result<bool>;
}

/// Static file serving.
#[async_trait]
pub trait StaticPaths: Send + Sync {
    /// Serve `file_path` at `url_path`.
    ///
    /// With `cache_headers` false the host must not let clients cache the file.
    async fn register_static_path(
        &self,
        url_path: &str,
        file_path: &Path,
        cache_headers: bool,
    ) -> Result<()>;
}

/// Frontend extension points.
pub trait Frontend: Send + Sync {
    /// Load an extra JS module in the frontend.
    ///
    /// URLs form a set: adding a URL that is already present is a no-op.
    fn add_extra_js_url(&self, url: &str) -> Result<()>;
}
