//! Serve the bundle in place and declare it as a UI resource.

use async_trait::async_trait;
use mbtalive_core::config::constants;
use mbtalive_core::{AssetStrategy, Host, ResourceList, UiResource};

use super::{AssetError, AssetPublisher, Declaration, Publication, Result, StaticAsset};

/// Publishes the bundle at `/<domain>/<file_name>` with caching disabled.
///
/// The bundle changes with every integration upgrade, so clients must never
/// keep a stale copy.
#[derive(Debug, Clone)]
pub struct StaticPathPublisher {
    domain: String,
}

impl StaticPathPublisher {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    fn declare(&self, host: &dyn Host, url: &str) -> Result<bool> {
        let resources = host
            .data()
            .get_or_insert_with(constants::RESOURCE_STORE_KEY, ResourceList::new)?;
        Ok(resources.append_if_absent(UiResource::module(url)))
    }
}

impl Default for StaticPathPublisher {
    fn default() -> Self {
        Self::new(constants::DOMAIN)
    }
}

#[async_trait]
impl AssetPublisher for StaticPathPublisher {
    fn strategy(&self) -> AssetStrategy {
        AssetStrategy::StaticPath
    }

    fn url_for(&self, asset: &StaticAsset) -> String {
        format!("/{}/{}", self.domain, asset.file_name)
    }

    async fn publish(&self, host: &dyn Host, asset: &StaticAsset) -> Result<Publication> {
        let http = host
            .http()
            .ok_or_else(|| AssetError::CapabilityUnavailable("static path registration".into()))?;

        let url = self.url_for(asset);
        http.register_static_path(&url, &asset.source, false).await?;
        tracing::info!("Registered MBTALive card at {}", url);

        // The card is served either way; a missing resource entry only means
        // the user has to add it by hand.
        let declaration = match self.declare(host, &url) {
            Ok(true) => {
                tracing::info!("Added MBTALive card as UI resource");
                Declaration::Added
            }
            Ok(false) => {
                tracing::debug!(url = %url, "UI resource already declared");
                Declaration::AlreadyPresent
            }
            Err(e) => {
                tracing::warn!("Could not auto-register UI resource: {}", e);
                Declaration::Skipped
            }
        };

        Ok(Publication::StaticPath { url, declaration })
    }
}
