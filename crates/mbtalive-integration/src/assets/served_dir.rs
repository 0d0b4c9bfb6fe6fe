//! Copy the bundle into the host's served directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mbtalive_core::config::constants;
use mbtalive_core::{AssetStrategy, Host};

use super::{AssetError, AssetPublisher, Publication, Result, StaticAsset};

/// Copies the bundle to `<config_dir>/www/<file_name>` and loads it as an
/// extra JS URL under `/local`.
///
/// The copy is overwritten on every run, so the served file always matches
/// the installed integration.
#[derive(Debug, Clone)]
pub struct ServedDirectoryPublisher {
    served_dir: String,
    url_prefix: String,
}

impl ServedDirectoryPublisher {
    pub fn new(served_dir: impl Into<String>, url_prefix: impl Into<String>) -> Self {
        Self {
            served_dir: served_dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    /// Destination of the copy for `asset` under `config_dir`.
    pub fn destination(&self, config_dir: &Path, asset: &StaticAsset) -> PathBuf {
        config_dir.join(&self.served_dir).join(&asset.file_name)
    }
}

impl Default for ServedDirectoryPublisher {
    fn default() -> Self {
        Self::new(constants::SERVED_DIR, constants::LOCAL_URL_PREFIX)
    }
}

#[async_trait]
impl AssetPublisher for ServedDirectoryPublisher {
    fn strategy(&self) -> AssetStrategy {
        AssetStrategy::ServedDirectory
    }

    fn url_for(&self, asset: &StaticAsset) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), asset.file_name)
    }

    async fn publish(&self, host: &dyn Host, asset: &StaticAsset) -> Result<Publication> {
        let frontend = host
            .frontend()
            .ok_or_else(|| AssetError::CapabilityUnavailable("extra JS URLs".into()))?;

        let dir = host.config_dir().join(&self.served_dir);
        tokio::fs::create_dir_all(&dir).await?;

        let destination = self.destination(host.config_dir(), asset);
        if same_file(&asset.source, &destination).await {
            tracing::debug!(path = %destination.display(), "Bundle already lives in served directory");
        } else {
            tokio::fs::copy(&asset.source, &destination).await?;
            tracing::info!("Copied MBTALive card to {}", destination.display());
        }

        let url = self.url_for(asset);
        frontend.add_extra_js_url(&url)?;
        tracing::info!("Registered MBTALive card at {}", url);

        Ok(Publication::ServedDirectory { url, destination })
    }
}

/// Copying a file onto itself truncates it.
async fn same_file(a: &Path, b: &Path) -> bool {
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
