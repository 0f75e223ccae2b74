//! Configuration for a crash-test run

use crate::error::{Error, Result};
use crate::layout::TestLayout;
use std::path::PathBuf;

/// Bytes in one GiB, the unit the artifact size is declared in
pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Default artifact size in GiB
pub const DEFAULT_SIZE_GB: u64 = 2;

/// Default name of the directory holding result reports
pub const DEFAULT_RESULTS_DIR: &str = "fs_test_results";

/// Main configuration for one crash-test session
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Filesystem label under test (e.g. "ext4", "NTFS")
    pub filesystem: String,

    /// Artifact size in GiB
    pub size_gb: u64,

    /// Directory holding `source_test/`, `destination_test/` and the results
    pub base_dir: PathBuf,

    /// Name of the results directory under `base_dir`
    pub results_dir: String,

    /// Whether the copy sleeps after each block
    pub use_delay: bool,
}

impl TestConfig {
    /// Create a config for the given filesystem label with defaults
    pub fn new(filesystem: impl Into<String>) -> Self {
        Self {
            filesystem: filesystem.into(),
            size_gb: DEFAULT_SIZE_GB,
            base_dir: PathBuf::from("."),
            results_dir: DEFAULT_RESULTS_DIR.to_string(),
            use_delay: true,
        }
    }

    /// Set artifact size in GiB
    pub fn size_gb(mut self, size_gb: u64) -> Self {
        self.size_gb = size_gb;
        self
    }

    /// Set the base working directory
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Set the results directory name
    pub fn results_dir(mut self, name: impl Into<String>) -> Self {
        self.results_dir = name.into();
        self
    }

    /// Enable or disable the per-block delay
    pub fn use_delay(mut self, use_delay: bool) -> Self {
        self.use_delay = use_delay;
        self
    }

    /// Artifact size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.size_gb.saturating_mul(BYTES_PER_GB)
    }

    /// Check that the config describes a runnable test
    pub fn validate(&self) -> Result<()> {
        if self.filesystem.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "Filesystem label must not be empty".to_string(),
            ));
        }
        if self.size_gb < 1 {
            return Err(Error::InvalidConfig(
                "File size must be at least 1GB".to_string(),
            ));
        }
        if self.results_dir.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "Results directory name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Paths of the test artifacts described by this config
    pub fn layout(&self) -> TestLayout {
        TestLayout::new(&self.base_dir, self.size_gb)
    }

    /// Directory where result reports are written
    pub fn results_path(&self) -> PathBuf {
        self.base_dir.join(&self.results_dir)
    }
}
