//! Error types for the Powercut core library

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Powercut operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during read/write/flush operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source artifact is missing when a copy was requested
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    /// Test artifacts could not be located during verification
    #[error("Test state not found: {0}")]
    StateNotFound(String),

    /// The baseline checksum side-file is missing
    #[error("Baseline checksum not found at {0}; run --create and --test first")]
    NoBaseline(PathBuf),

    /// The baseline side-file exists but holds no usable digest
    #[error("Baseline checksum at {path} is unusable: {reason}")]
    UnusableBaseline {
        /// Location of the side-file
        path: PathBuf,
        /// Why the contents were rejected
        reason: String,
    },

    /// An existing artifact has a different size than requested
    #[error("Size mismatch: expected {expected} bytes, found {actual} bytes")]
    SizeMismatch {
        /// Requested size in bytes
        expected: u64,
        /// Observed size in bytes
        actual: u64,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Platform durability primitive failed
    #[error("Durability barrier failed: {0}")]
    Platform(#[from] powercut_platform::PlatformError),

    /// Persistent settings hold an unusable value
    #[error("Settings error: {0}")]
    Settings(#[from] crate::settings::SettingsError),
}

/// Result type alias using the Powercut error type
pub type Result<T> = std::result::Result<T, Error>;
