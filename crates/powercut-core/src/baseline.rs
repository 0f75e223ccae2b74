//! Durable baseline checksum record
//!
//! The record is the only "before" witness that survives the crash: a plain
//! text side-file holding exactly the lower-case hex digest of the source
//! artifact. It is written to a temporary file, flushed to the device, renamed
//! into place and the directory entry synced, all before the copy starts.

use crate::checksum::Checksum;
use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Baseline digest of the source artifact
#[derive(Debug, Clone, PartialEq)]
pub struct ChecksumRecord {
    /// Digest of the source at the time the record was written
    pub checksum: Checksum,
}

impl ChecksumRecord {
    /// Wrap a freshly computed checksum
    pub fn new(checksum: Checksum) -> Self {
        Self { checksum }
    }

    /// Hex digest as stored in the side-file
    pub fn digest(&self) -> String {
        self.checksum.to_hex()
    }

    /// Persist the record and make it durable before returning
    pub fn write_durable(&self, path: &Path) -> Result<()> {
        let temp_path = path.with_extension("tmp");

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(self.digest().as_bytes())?;
            file.flush()?;
            powercut_platform::sync_file(&file)?;
        }

        fs::rename(&temp_path, path)?;
        powercut_platform::sync_parent(path)?;

        tracing::debug!("Saved baseline {} to {:?}", self.digest(), path);
        Ok(())
    }

    /// Load the record written by an earlier session
    ///
    /// A missing side-file is [`Error::NoBaseline`]; an empty file or one that
    /// does not hold a recognizable hex digest is [`Error::UnusableBaseline`].
    pub fn read(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NoBaseline(path.to_path_buf()));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        if contents.trim().is_empty() {
            return Err(Error::UnusableBaseline {
                path: path.to_path_buf(),
                reason: "empty file".to_string(),
            });
        }

        let checksum = Checksum::parse_hex(&contents).map_err(|e| Error::UnusableBaseline {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!("Loaded {} baseline from {:?}", checksum.algorithm, path);
        Ok(Self { checksum })
    }
}
