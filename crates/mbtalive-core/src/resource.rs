//! Frontend UI resource declarations.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// How the frontend loads a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Module,
    Js,
    Css,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Js => "js",
            Self::Css => "css",
        }
    }
}

/// One declared frontend resource, `{"url": ..., "type": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UiResource {
    pub url: String,

    #[serde(rename = "type")]
    pub resource_type: ResourceType,
}

impl UiResource {
    /// A resource loaded as an ES module.
    pub fn module(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            resource_type: ResourceType::Module,
        }
    }
}

/// Declared frontend resources, kept in the host data store.
///
/// Declarations are unique: appending an equal declaration is a no-op.
#[derive(Debug, Default)]
pub struct ResourceList {
    resources: RwLock<Vec<UiResource>>,
}

impl ResourceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `resource` unless an equal one is already declared.
    ///
    /// Returns `true` if the resource was added.
    pub fn append_if_absent(&self, resource: UiResource) -> bool {
        let mut resources = self.resources.write();
        if resources.contains(&resource) {
            return false;
        }
        resources.push(resource);
        true
    }

    pub fn contains(&self, resource: &UiResource) -> bool {
        self.resources.read().contains(resource)
    }

    /// Snapshot of the declared resources, in declaration order.
    pub fn list(&self) -> Vec<UiResource> {
        self.resources.read().clone()
    }

    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }
}
