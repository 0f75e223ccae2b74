//! Linux platform implementation
//!
//! `fsync(2)` on Linux flushes the drive write cache as well, so it is a
//! complete durability barrier on its own.

use crate::unix::{fsync_directory, fsync_fd, uname};
use crate::{OsInfo, PlatformOps, Result};
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// Linux platform implementation
pub struct LinuxPlatform;

impl PlatformOps for LinuxPlatform {
    fn sync_file(file: &File) -> Result<()> {
        fsync_fd(file.as_raw_fd())
    }

    fn sync_directory(path: &Path) -> Result<()> {
        fsync_directory(path)
    }

    fn os_info() -> OsInfo {
        uname().unwrap_or_else(|| OsInfo::new("Linux", "unknown"))
    }

    fn barrier_name() -> &'static str {
        "fsync"
    }
}
