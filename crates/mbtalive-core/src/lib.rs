//! Core traits and types for the MBTALive integration.
//!
//! This crate defines the seams between the integration and the host
//! automation platform that loads it:
//!
//! ```text
//! Host platform                      mbtalive-core
//! ┌──────────────────┐               ┌──────────────────────────┐
//! │ config entries   │◀──────────────│ ConfigEntries            │
//! │ static files     │◀──────────────│ StaticPaths              │
//! │ frontend (JS)    │◀──────────────│ Frontend                 │
//! │ shared data      │◀──────────────│ HostData / DomainState   │
//! └──────────────────┘               └──────────────────────────┘
//! ```
//!
//! The lifecycle logic itself lives in `mbtalive-integration`.

pub mod config;
pub mod entry;
pub mod error;
pub mod host;
pub mod resource;
pub mod state;

pub use config::{AssetStrategy, FrontendConfig, IntegrationConfig};
pub use entry::{ConfigEntry, EntryState, Platform, PLATFORMS};
pub use error::{ConfigError, HostError, StateError};
pub use host::{ConfigEntries, Frontend, Host, StaticPaths};
pub use resource::{ResourceList, ResourceType, UiResource};
pub use state::{DomainState, DomainStateStore, HostData};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::config::{
        AssetStrategy, FrontendConfig, IntegrationConfig, constants, env_vars,
    };
    pub use crate::entry::{ConfigEntry, EntryState, Platform, PLATFORMS};
    pub use crate::error::{ConfigError, HostError, StateError};
    pub use crate::host::{ConfigEntries, Frontend, Host, StaticPaths};
    pub use crate::resource::{ResourceList, ResourceType, UiResource};
    pub use crate::state::{DomainState, DomainStateStore, HostData};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
