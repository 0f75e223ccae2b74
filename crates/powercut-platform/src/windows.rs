//! Windows platform implementation
//!
//! `FlushFileBuffers` is the only barrier that reaches the device. NTFS
//! journals directory entries itself, so there is nothing to flush for a
//! directory.

use crate::{OsInfo, PlatformError, PlatformOps, Result};
use std::fs::File;
use std::os::windows::io::AsRawHandle;
use std::path::Path;
use std::process::Command;
use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::Storage::FileSystem::FlushFileBuffers;

/// Windows platform implementation
pub struct WindowsPlatform;

impl PlatformOps for WindowsPlatform {
    fn sync_file(file: &File) -> Result<()> {
        let handle = file.as_raw_handle() as HANDLE;
        // SAFETY: the handle is owned by `file` and stays open for the call.
        #[allow(unsafe_code)]
        let ok = unsafe { FlushFileBuffers(handle) };
        if ok != 0 {
            Ok(())
        } else {
            Err(PlatformError::Io(std::io::Error::last_os_error()))
        }
    }

    fn sync_directory(path: &Path) -> Result<()> {
        tracing::trace!("Directory sync is a no-op on Windows: {:?}", path);
        Ok(())
    }

    fn os_info() -> OsInfo {
        match windows_version() {
            Ok(release) => OsInfo::new("Windows", release),
            Err(e) => {
                tracing::debug!("Could not determine Windows version: {}", e);
                OsInfo::new("Windows", "unknown")
            }
        }
    }

    fn barrier_name() -> &'static str {
        "FlushFileBuffers"
    }
}

/// Run `ver` and extract the version number
fn windows_version() -> Result<String> {
    let output = Command::new("cmd")
        .args(["/C", "ver"])
        .output()
        .map_err(|e| PlatformError::CommandFailed(format!("ver failed: {}", e)))?;

    if !output.status.success() {
        return Err(PlatformError::CommandFailed(format!(
            "ver failed with code {:?}",
            output.status.code()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_ver_output(&stdout)
        .ok_or_else(|| PlatformError::CommandFailed(format!("unexpected ver output: {}", stdout)))
}

/// Parse "Microsoft Windows [Version 10.0.19045.3803]"
fn parse_ver_output(output: &str) -> Option<String> {
    let start = output.find("[Version ")? + "[Version ".len();
    let rest = &output[start..];
    let end = rest.find(']')?;
    let version = rest[..end].trim();
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}
