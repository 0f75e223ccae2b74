//! macOS platform implementation
//!
//! `fsync(2)` on macOS only hands data to the drive, which may keep it in its
//! volatile cache. `F_FULLFSYNC` asks the drive to flush that cache too.

use crate::unix::{fsync_directory, fsync_fd, uname};
use crate::{OsInfo, PlatformOps, Result};
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// macOS platform implementation
pub struct MacOSPlatform;

impl PlatformOps for MacOSPlatform {
    fn sync_file(file: &File) -> Result<()> {
        let fd = file.as_raw_fd();
        // SAFETY: fcntl() is called with a valid descriptor owned by `file`;
        // F_FULLFSYNC takes no argument pointer.
        #[allow(unsafe_code)]
        let result = unsafe { libc::fcntl(fd, libc::F_FULLFSYNC) };
        if result != -1 {
            return Ok(());
        }

        // Some filesystems (SMB, FAT on USB sticks) reject F_FULLFSYNC
        let err = std::io::Error::last_os_error();
        tracing::debug!("F_FULLFSYNC failed ({}), falling back to fsync", err);
        fsync_fd(fd)
    }

    fn sync_directory(path: &Path) -> Result<()> {
        fsync_directory(path)
    }

    fn os_info() -> OsInfo {
        uname().unwrap_or_else(|| OsInfo::new("Darwin", "unknown"))
    }

    fn barrier_name() -> &'static str {
        "F_FULLFSYNC"
    }
}
