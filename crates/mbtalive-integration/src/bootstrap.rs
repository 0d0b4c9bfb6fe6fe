//! Integration entry point: the hooks the host calls.

use mbtalive_core::config::constants;
use mbtalive_core::{
    AssetStrategy, ConfigEntry, ConfigError, DomainStateStore, Host, IntegrationConfig, StateError,
};
use serde::Serialize;

use crate::assets::{AssetRegistrar, RegistrationOutcome};
use crate::lifecycle::EntryLifecycleController;

/// Result type for bootstrap.
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Failures that make bootstrap report failure to the host.
///
/// Asset registration problems are never among them.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The integration's configuration section is unusable.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The shared domain state could not be initialized.
    #[error("Domain state error: {0}")]
    State(#[from] StateError),
}

/// What bootstrap did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    /// Strategy used for the frontend card.
    pub strategy: AssetStrategy,
    /// Card registration outcome, `None` when registration is disabled.
    pub registration: Option<RegistrationOutcome>,
}

/// The MBTALive integration as the host sees it.
#[derive(Debug, Default)]
pub struct MbtaLiveIntegration {
    controller: EntryLifecycleController,
}

impl MbtaLiveIntegration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain(&self) -> &'static str {
        constants::DOMAIN
    }

    pub fn controller(&self) -> &EntryLifecycleController {
        &self.controller
    }

    /// Bootstrap hook, called once at host startup.
    ///
    /// Returns `false` only if configuration or domain state is unusable.
    pub async fn bootstrap(&self, host: &dyn Host, config: &serde_json::Value) -> bool {
        tracing::info!("Setting up MBTALive integration.");

        match self.try_bootstrap(host, config).await {
            Ok(report) => {
                tracing::debug!(?report, "MBTALive integration set up");
                true
            }
            Err(e) => {
                tracing::error!("Error during bootstrap: {}", e);
                false
            }
        }
    }

    /// Bootstrap, propagating failures outside the best-effort region.
    pub async fn try_bootstrap(
        &self,
        host: &dyn Host,
        config: &serde_json::Value,
    ) -> Result<BootstrapReport> {
        let config = IntegrationConfig::from_host_config(config)?;

        let store = DomainStateStore::new(host.data(), self.domain());
        let state = store.init_if_absent()?;

        let strategy = config.frontend.strategy;
        let registration = if config.frontend.enabled {
            let bundle_path = config.bundle_path(host.config_dir());
            let registrar = AssetRegistrar::for_strategy(strategy);
            Some(registrar.register_asset(host, &bundle_path).await)
        } else {
            tracing::info!("MBTALive card registration disabled");
            None
        };

        tracing::debug!("{} data initialized: {:?}", self.domain(), state);
        Ok(BootstrapReport {
            strategy,
            registration,
        })
    }

    /// Entry setup hook.
    pub async fn setup_entry(&self, host: &dyn Host, entry: &ConfigEntry) -> bool {
        self.controller.setup_entry(host, entry).await
    }

    /// Entry unload hook.
    pub async fn unload_entry(&self, host: &dyn Host, entry: &ConfigEntry) -> bool {
        self.controller.unload_entry(host, entry).await
    }
}
