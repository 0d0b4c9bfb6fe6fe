//! Scratch host directories.
//!
//! Each fixture owns its own temporary config directory, so tests can run
//! in parallel without sharing files. The directory is removed on drop.

use std::path::{Path, PathBuf};

use mbtalive_core::config::default_bundle_path;

use crate::mock_host::MockHost;

/// Contents written by `HostFixture::write_bundle`.
pub const TEST_BUNDLE: &str = "customElements.define('mbtalive-card', class extends HTMLElement {});\n";

/// Temporary host config directory.
pub struct HostFixture {
    dir: tempfile::TempDir,
}

impl HostFixture {
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("mbtalive_test_")
            .tempdir()
            .expect("failed to create temporary config dir");
        Self { dir }
    }

    pub fn config_dir(&self) -> &Path {
        self.dir.path()
    }

    /// A fully capable mock host rooted at this fixture.
    pub fn host(&self) -> MockHost {
        MockHost::new(self.config_dir())
    }

    /// Where the integration looks for its bundled card by default.
    pub fn bundle_path(&self) -> PathBuf {
        default_bundle_path(self.config_dir())
    }

    /// Install the card bundle at its default location.
    pub fn write_bundle(&self) -> PathBuf {
        self.write_file(&self.bundle_path(), TEST_BUNDLE)
    }

    /// Write `contents` at `path`, creating parent directories.
    pub fn write_file(&self, path: &Path, contents: &str) -> PathBuf {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(path, contents).expect("failed to write file");
        path.to_path_buf()
    }

    /// `<config_dir>/www/<file_name>`
    pub fn served_path(&self, file_name: &str) -> PathBuf {
        self.config_dir().join("www").join(file_name)
    }
}

impl Default for HostFixture {
    fn default() -> Self {
        Self::new()
    }
}
