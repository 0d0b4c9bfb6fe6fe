//! Configuration entries, downstream platforms and the entry state machine.

use serde::{Deserialize, Serialize};

/// Downstream platform an entry can be forwarded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Arrival prediction sensors.
    Sensor,
}

impl Platform {
    /// Get the platform name as the host knows it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Platforms this integration drives.
pub const PLATFORMS: &[Platform] = &[Platform::Sensor];

/// One user-configured instance of the integration.
///
/// Owned by the host. The integration only reads `entry_id` and hands the
/// entry back to the host when forwarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Opaque identifier assigned by the host.
    pub entry_id: String,

    /// Domain the entry belongs to.
    pub domain: String,

    /// Human-readable title.
    #[serde(default)]
    pub title: String,

    /// Entry data (stops, routes, ...), opaque to the lifecycle.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ConfigEntry {
    /// Create an entry with a freshly generated id.
    pub fn new(
        domain: impl Into<String>,
        title: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().simple().to_string(),
            domain: domain.into(),
            title: title.into(),
            data,
        }
    }

    /// Set the entry id.
    pub fn with_id(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = entry_id.into();
        self
    }
}

/// Lifecycle state of a configuration entry.
///
/// `Unconfigured -> Configuring -> Active -> Unconfiguring -> Unconfigured`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    #[default]
    Unconfigured,
    Configuring,
    Active,
    Unconfiguring,
}

impl EntryState {
    /// True while a setup or unload is awaiting the host.
    pub const fn is_transitioning(self) -> bool {
        matches!(self, Self::Configuring | Self::Unconfiguring)
    }

    /// True once the downstream platform is running for the entry.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Stable, human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Configuring => "configuring",
            Self::Active => "active",
            Self::Unconfiguring => "unconfiguring",
        }
    }
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
