//! MBTALive integration lifecycle.
//!
//! ## Architecture
//!
//! ```text
//! Host startup ──▶ bootstrap ──┬──▶ DomainStateStore::init_if_absent
//!                              └──▶ AssetRegistrar (best effort)
//!
//! Per config entry ──▶ setup_entry / unload_entry ──▶ sensor platform
//! ```
//!
//! Every hook resolves to a `bool`. Internal steps return `Result`s and the
//! hooks turn them into log lines.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mbtalive_integration::MbtaLiveIntegration;
//!
//! let integration = MbtaLiveIntegration::new();
//! assert!(integration.bootstrap(&host, &serde_json::json!({})).await);
//!
//! if integration.setup_entry(&host, &entry).await {
//!     // entry is active
//! }
//! ```

pub mod assets;
pub mod bootstrap;
pub mod lifecycle;

pub use assets::{
    AssetError, AssetPublisher, AssetRegistrar, Declaration, Publication, RegistrationOutcome,
    ServedDirectoryPublisher, StaticAsset, StaticPathPublisher,
};
pub use bootstrap::{BootstrapError, BootstrapReport, MbtaLiveIntegration};
pub use lifecycle::{EntryInfo, EntryLifecycleController, LifecycleError};

pub use mbtalive_core::{ConfigEntry, EntryState, Host, IntegrationConfig};
