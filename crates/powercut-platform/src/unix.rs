//! Shared POSIX helpers for the Linux and macOS backends

use crate::{OsInfo, PlatformError, Result};
use std::ffi::CStr;
use std::fs::File;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

/// Call `fsync(2)` on a raw descriptor
pub(crate) fn fsync_fd(fd: RawFd) -> Result<()> {
    // SAFETY: fsync() is called with a valid file descriptor obtained from as_raw_fd().
    // The caller keeps the owning File alive for the duration of the call.
    #[allow(unsafe_code)]
    let result = unsafe { libc::fsync(fd) };
    if result == 0 {
        Ok(())
    } else {
        Err(PlatformError::Io(std::io::Error::last_os_error()))
    }
}

/// Open a directory read-only and fsync it
pub(crate) fn fsync_directory(path: &Path) -> Result<()> {
    let dir = File::open(path)?;
    fsync_fd(dir.as_raw_fd())?;
    tracing::trace!("fsync'd directory {:?}", path);
    Ok(())
}

/// Query `uname(2)` for the kernel name and release
pub(crate) fn uname() -> Option<OsInfo> {
    // SAFETY: utsname is a plain C struct of fixed-size char arrays; all-zero is valid.
    #[allow(unsafe_code)]
    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };

    // SAFETY: uname() writes NUL-terminated strings into the struct we own.
    #[allow(unsafe_code)]
    let result = unsafe { libc::uname(&mut uts) };
    if result != 0 {
        return None;
    }

    // SAFETY: on success every field is NUL-terminated within its array.
    #[allow(unsafe_code)]
    let (system, release) = unsafe {
        (
            CStr::from_ptr(uts.sysname.as_ptr()),
            CStr::from_ptr(uts.release.as_ptr()),
        )
    };

    Some(OsInfo::new(
        system.to_string_lossy().into_owned(),
        release.to_string_lossy().into_owned(),
    ))
}
