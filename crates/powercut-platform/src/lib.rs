//! # Powercut Platform
//!
//! Platform-specific durability barriers and host identification.
//!
//! A crash test is only meaningful if every byte the harness claims to have
//! written is actually on the physical device. Each platform gets one explicit
//! barrier (`fsync` on Linux, `F_FULLFSYNC` on macOS, `FlushFileBuffers` on
//! Windows). On macOS a refused `F_FULLFSYNC` falls back to `fsync`.
//! [`sync_file`] and [`sync_directory`] are the entry points; [`barrier_name`]
//! reports which barrier is in use.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Platform-specific errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation not supported on this platform
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Command execution failed
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Identification of the host operating system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsInfo {
    /// Kernel or OS name (e.g. "Linux", "Darwin", "Windows")
    pub system: String,

    /// Kernel or OS release (e.g. "6.8.0-45-generic")
    pub release: String,
}

impl OsInfo {
    /// Create a new OS description
    pub fn new(system: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            release: release.into(),
        }
    }
}

impl std::fmt::Display for OsInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.system, self.release)
    }
}

/// Platform operations interface
pub trait PlatformOps {
    /// Flush a file's data and metadata all the way to the physical device
    fn sync_file(file: &File) -> Result<()>;

    /// Make directory entry changes (create, rename, unlink) durable
    fn sync_directory(path: &Path) -> Result<()>;

    /// Identify the running operating system
    fn os_info() -> OsInfo;

    /// Name of the primitive used by [`PlatformOps::sync_file`]
    fn barrier_name() -> &'static str;
}

#[cfg(unix)]
mod unix;

// Platform-specific implementations
cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod linux;
        pub use linux::LinuxPlatform as Platform;
    } else if #[cfg(target_os = "macos")] {
        mod macos;
        pub use macos::MacOSPlatform as Platform;
    } else if #[cfg(target_os = "windows")] {
        mod windows;
        pub use windows::WindowsPlatform as Platform;
    }
}

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))] {
        /// Durability barrier for a single file
        pub fn sync_file(file: &File) -> Result<()> {
            Platform::sync_file(file)
        }

        /// Durability barrier for directory entries
        pub fn sync_directory(path: &Path) -> Result<()> {
            Platform::sync_directory(path)
        }

        /// Identify the running operating system
        pub fn os_info() -> OsInfo {
            Platform::os_info()
        }

        /// Name of the file durability primitive on this platform
        pub fn barrier_name() -> &'static str {
            Platform::barrier_name()
        }
    } else {
        /// Durability barrier (unsupported platform, falls back to `sync_all`)
        pub fn sync_file(file: &File) -> Result<()> {
            file.sync_all().map_err(PlatformError::Io)
        }

        /// Directory sync (unsupported platform)
        pub fn sync_directory(_path: &Path) -> Result<()> {
            Err(PlatformError::NotSupported("Platform not supported".to_string()))
        }

        /// Identify the running operating system
        pub fn os_info() -> OsInfo {
            OsInfo::new(std::env::consts::OS, "unknown")
        }

        /// Name of the file durability primitive on this platform
        pub fn barrier_name() -> &'static str {
            "sync_all"
        }
    }
}

/// Sync the directory containing `path`
///
/// A bare file name is treated as living in the current directory.
pub fn sync_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => sync_directory(parent),
        _ => sync_directory(Path::new(".")),
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_os_info_display() {
        let info = OsInfo::new("Linux", "6.8.0");
        assert_eq!(info.to_string(), "Linux 6.8.0");
    }

    #[test]
    fn test_os_info_not_empty() {
        let info = os_info();
        assert!(!info.system.is_empty());
        assert!(!info.release.is_empty());
    }

    #[test]
    fn test_sync_file_after_write() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(&[0xA5u8; 8192]).unwrap();
        assert!(sync_file(temp.as_file()).is_ok());
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    #[test]
    fn test_sync_directory() {
        let dir = TempDir::new().unwrap();
        assert!(sync_directory(dir.path()).is_ok());
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    #[test]
    fn test_sync_parent_of_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("artifact.dat");
        std::fs::write(&file, b"data").unwrap();
        assert!(sync_parent(&file).is_ok());
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    #[test]
    fn test_sync_directory_missing() {
        let result = sync_directory(Path::new("/nonexistent/powercut/dir"));
        assert!(matches!(result, Err(PlatformError::Io(_))));
    }

    #[test]
    fn test_barrier_name() {
        assert!(!barrier_name().is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = PlatformError::NotSupported("directory sync".to_string());
        assert!(err.to_string().contains("Not supported"));
        assert!(err.to_string().contains("directory sync"));

        let err = PlatformError::CommandFailed("ver".to_string());
        assert!(err.to_string().contains("Command failed"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let platform_err: PlatformError = io_err.into();
        assert!(matches!(platform_err, PlatformError::Io(_)));
    }
}
