//! On-disk layout of a crash test
//!
//! Both sessions of a test (create/copy before the crash, verify after the
//! restart) agree on file locations only through this layout:
//!
//! ```text
//! <base>/source_test/large_file_<N>gb.dat
//! <base>/source_test/original_checksum.txt
//! <base>/destination_test/large_file_<N>gb.dat
//! ```
//!
//! When the verify session is started with a size that does not match the
//! artifacts on disk, [`TestLayout::recover`] re-derives the size from the
//! artifact file names.

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Directory holding the source artifact and its checksum record
pub const SOURCE_DIR_NAME: &str = "source_test";

/// Directory receiving the copy
pub const DESTINATION_DIR_NAME: &str = "destination_test";

/// Name of the checksum side-file
pub const RECORD_FILE_NAME: &str = "original_checksum.txt";

const ARTIFACT_PREFIX: &str = "large_file_";
const ARTIFACT_SUFFIX: &str = "gb.dat";

/// Paths of every file taking part in a test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestLayout {
    /// Artifact size in GiB encoded in the file names
    pub size_gb: u64,

    /// `<base>/source_test`
    pub source_dir: PathBuf,

    /// `<base>/destination_test`
    pub destination_dir: PathBuf,

    /// Source artifact
    pub source_file: PathBuf,

    /// Copy target
    pub destination_file: PathBuf,

    /// Checksum side-file next to the source artifact
    pub record_file: PathBuf,
}

/// A layout after path recovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedLayout {
    /// The layout to verify
    pub layout: TestLayout,

    /// Whether the size was re-derived from file names on disk
    pub recovered: bool,
}

impl TestLayout {
    /// Layout for an artifact of `size_gb` GiB under `base_dir`
    pub fn new(base_dir: impl AsRef<Path>, size_gb: u64) -> Self {
        let base_dir = base_dir.as_ref();
        let source_dir = base_dir.join(SOURCE_DIR_NAME);
        let destination_dir = base_dir.join(DESTINATION_DIR_NAME);
        let name = artifact_name(size_gb);

        Self {
            size_gb,
            source_file: source_dir.join(&name),
            destination_file: destination_dir.join(&name),
            record_file: source_dir.join(RECORD_FILE_NAME),
            source_dir,
            destination_dir,
        }
    }

    /// Create the source and destination directories if missing
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.source_dir)?;
        std::fs::create_dir_all(&self.destination_dir)?;
        Ok(())
    }

    /// Base directory both test directories live in
    pub fn base_dir(&self) -> &Path {
        self.source_dir.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Locate the artifacts, falling back to file-name based size detection
    ///
    /// If either artifact exists at the configured paths the layout is used
    /// as is. Otherwise both directories are scanned for
    /// `large_file_<N>gb.dat`. Exactly one distinct `N` must be found;
    /// none or several distinct sizes fail with [`Error::StateNotFound`].
    pub fn recover(&self) -> Result<LocatedLayout> {
        if self.source_file.exists() || self.destination_file.exists() {
            return Ok(LocatedLayout {
                layout: self.clone(),
                recovered: false,
            });
        }

        tracing::warn!(
            "Neither {:?} nor {:?} exists, scanning for test artifacts",
            self.source_file,
            self.destination_file
        );

        let mut sizes = BTreeSet::new();
        let mut names = Vec::new();
        for dir in [&self.source_dir, &self.destination_dir] {
            for (name, size) in scan_artifacts(dir)? {
                tracing::debug!("Found candidate artifact {} in {:?}", name, dir);
                sizes.insert(size);
                names.push(name);
            }
        }

        let mut iter = sizes.iter();
        match (iter.next(), iter.next()) {
            (None, _) => Err(Error::StateNotFound(format!(
                "no {}<N>{} in {} or {}",
                ARTIFACT_PREFIX,
                ARTIFACT_SUFFIX,
                self.source_dir.display(),
                self.destination_dir.display()
            ))),
            (Some(&size_gb), None) => {
                tracing::info!("Auto-detected file size: {}GB", size_gb);
                Ok(LocatedLayout {
                    layout: TestLayout::new(self.base_dir(), size_gb),
                    recovered: true,
                })
            }
            (Some(_), Some(_)) => {
                names.sort();
                names.dedup();
                Err(Error::StateNotFound(format!(
                    "ambiguous artifacts with different sizes: {}",
                    names.join(", ")
                )))
            }
        }
    }
}

/// File name of an artifact of `size_gb` GiB
pub fn artifact_name(size_gb: u64) -> String {
    format!("{}{}{}", ARTIFACT_PREFIX, size_gb, ARTIFACT_SUFFIX)
}

/// Parse the size encoded in an artifact file name
///
/// Accepts exactly `large_file_<digits>gb.dat` with a non-zero size.
pub fn parse_artifact_size(name: &str) -> Option<u64> {
    let digits = name
        .strip_prefix(ARTIFACT_PREFIX)?
        .strip_suffix(ARTIFACT_SUFFIX)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse::<u64>().ok().filter(|&size| size > 0)
}

/// List `(file name, size)` of every artifact in `dir`
///
/// A missing directory yields no candidates.
fn scan_artifacts(dir: &Path) -> Result<Vec<(String, u64)>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::Io(e)),
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(size) = parse_artifact_size(&name) {
            found.push((name, size));
        }
    }
    found.sort();
    Ok(found)
}
