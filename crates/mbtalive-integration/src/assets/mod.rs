//! Frontend card publication.
//!
//! The card bundle ships with the integration and has to become reachable by
//! the host's frontend. Two publication strategies exist, both behind the
//! `AssetPublisher` trait:
//!
//! ```text
//!                      ┌──────────────────────┐
//!  bundle file ───────▶│    AssetRegistrar    │
//!                      └──────────┬───────────┘
//!                 ┌───────────────┴───────────────┐
//!                 ▼                               ▼
//!     ┌──────────────────────┐        ┌────────────────────────┐
//!     │ StaticPathPublisher  │        │ServedDirectoryPublisher│
//!     │ /<domain>/<file>     │        │ <config>/www/<file>    │
//!     │ + UI resource entry  │        │ + extra JS URL         │
//!     └──────────────────────┘        └────────────────────────┘
//! ```
//!
//! Registration is best effort: `AssetRegistrar::register_asset` never
//! fails, it reports what happened and logs.

pub mod served_dir;
pub mod static_path;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mbtalive_core::{AssetStrategy, Host, HostError, StateError};
use serde::Serialize;

pub use served_dir::ServedDirectoryPublisher;
pub use static_path::StaticPathPublisher;

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Asset registration errors.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The bundle is not where it was expected.
    #[error("Bundle not found at {0}")]
    BundleMissing(PathBuf),

    /// The bundle path has no usable file name.
    #[error("Invalid bundle path: {0}")]
    InvalidBundle(PathBuf),

    /// The host lacks a facility the strategy needs.
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A host facility failed.
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// The UI resource store is unusable.
    #[error("Resource store error: {0}")]
    ResourceStore(#[from] StateError),
}

impl AssetError {
    /// Whether the failure means "this host cannot do that", as opposed to
    /// something going wrong while doing it.
    pub fn is_capability_unavailable(&self) -> bool {
        match self {
            Self::CapabilityUnavailable(_) => true,
            Self::Host(e) => e.is_unsupported(),
            _ => false,
        }
    }
}

/// A bundled file to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    /// Where the bundle lives on disk.
    pub source: PathBuf,
    /// File name, reused for URLs and copies.
    pub file_name: String,
}

impl StaticAsset {
    pub fn new(source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| AssetError::InvalidBundle(source.clone()))?;
        Ok(Self { source, file_name })
    }
}

/// Whether a UI resource declaration was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Declaration {
    /// Appended to the resource list.
    Added,
    /// An identical declaration was already present.
    AlreadyPresent,
    /// Declaring failed; the asset is still served.
    Skipped,
}

/// What a publisher did with the asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Publication {
    StaticPath {
        url: String,
        declaration: Declaration,
    },
    ServedDirectory {
        url: String,
        destination: PathBuf,
    },
}

impl Publication {
    /// URL the frontend loads the card from.
    pub fn url(&self) -> &str {
        match self {
            Self::StaticPath { url, .. } | Self::ServedDirectory { url, .. } => url,
        }
    }
}

/// A way of making a bundled asset reachable by the frontend.
#[async_trait]
pub trait AssetPublisher: Send + Sync {
    /// Strategy this publisher implements.
    fn strategy(&self) -> AssetStrategy;

    /// URL the asset will be reachable at.
    fn url_for(&self, asset: &StaticAsset) -> String;

    /// Publish the asset. Must be safe to call repeatedly.
    async fn publish(&self, host: &dyn Host, asset: &StaticAsset) -> Result<Publication>;
}

/// Outcome of a best-effort registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    Published { publication: Publication },
    BundleMissing { path: PathBuf },
    CapabilityUnavailable { reason: String },
    Failed { reason: String },
}

impl RegistrationOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// Runs a publisher against the bundle, containing every failure.
pub struct AssetRegistrar {
    publisher: Box<dyn AssetPublisher>,
}

impl AssetRegistrar {
    pub fn new(publisher: Box<dyn AssetPublisher>) -> Self {
        Self { publisher }
    }

    /// Registrar using the default publisher for `strategy`.
    pub fn for_strategy(strategy: AssetStrategy) -> Self {
        match strategy {
            AssetStrategy::StaticPath => Self::new(Box::new(StaticPathPublisher::default())),
            AssetStrategy::ServedDirectory => {
                Self::new(Box::new(ServedDirectoryPublisher::default()))
            }
        }
    }

    pub fn strategy(&self) -> AssetStrategy {
        self.publisher.strategy()
    }

    /// Publish the bundle at `bundle_path`, propagating every failure.
    pub async fn try_register(&self, host: &dyn Host, bundle_path: &Path) -> Result<Publication> {
        if !tokio::fs::try_exists(bundle_path).await? {
            return Err(AssetError::BundleMissing(bundle_path.to_path_buf()));
        }

        let asset = StaticAsset::new(bundle_path)?;
        self.publisher.publish(host, &asset).await
    }

    /// Publish the bundle at `bundle_path`. Never fails; failures are logged
    /// as warnings and reported in the outcome.
    pub async fn register_asset(&self, host: &dyn Host, bundle_path: &Path) -> RegistrationOutcome {
        match self.try_register(host, bundle_path).await {
            Ok(publication) => {
                tracing::info!(
                    strategy = %self.strategy(),
                    url = %publication.url(),
                    "MBTALive card registered"
                );
                RegistrationOutcome::Published { publication }
            }
            Err(AssetError::BundleMissing(path)) => {
                tracing::warn!("MBTALive card bundle not found at {}", path.display());
                RegistrationOutcome::BundleMissing { path }
            }
            Err(e) if e.is_capability_unavailable() => {
                tracing::warn!(
                    strategy = %self.strategy(),
                    "Host cannot publish the MBTALive card, skipping: {}",
                    e
                );
                RegistrationOutcome::CapabilityUnavailable {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    strategy = %self.strategy(),
                    "Could not register the MBTALive card: {}",
                    e
                );
                RegistrationOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for AssetRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistrar")
            .field("strategy", &self.strategy())
            .finish()
    }
}
