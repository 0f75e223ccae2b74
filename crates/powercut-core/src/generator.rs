//! Test artifact generator
//!
//! Materializes a file of an exact byte size filled with random data. An
//! artifact that already has the requested size is left untouched, so a
//! multi-step test can be resumed without rewriting gigabytes.

use crate::error::{Error, Result};
use rand::RngCore;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Default generation chunk (10 MB)
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Minimum chunk size (4 KB)
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Maximum chunk size (64 MB)
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// What [`FileGenerator::ensure`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// A fresh artifact was written and synced
    Created {
        /// Bytes written
        bytes: u64,
        /// Time spent writing and syncing
        elapsed: Duration,
    },
    /// The artifact already had the requested size; nothing was written
    AlreadyPresent,
}

/// Observed state of an artifact on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// No file at the path
    Missing,
    /// File exists with exactly the expected size
    Ready,
    /// File exists with another size
    WrongSize {
        /// Observed size in bytes
        actual: u64,
    },
}

impl ArtifactStatus {
    /// Inspect `path` against the expected size
    pub fn probe(path: &Path, expected: u64) -> Result<Self> {
        match fs::metadata(path) {
            Ok(meta) if meta.len() == expected => Ok(ArtifactStatus::Ready),
            Ok(meta) => Ok(ArtifactStatus::WrongSize { actual: meta.len() }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ArtifactStatus::Missing),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Generation progress
#[derive(Debug, Clone)]
pub struct GenerateProgress {
    /// Bytes written so far
    pub bytes_written: u64,
    /// Target size
    pub total_bytes: u64,
    /// Current speed in bytes per second
    pub speed_bps: u64,
    /// Elapsed time
    pub elapsed: Duration,
}

impl GenerateProgress {
    /// Completion percentage (0.0 to 100.0)
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            100.0
        } else {
            (self.bytes_written as f64 / self.total_bytes as f64) * 100.0
        }
    }
}

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(&GenerateProgress) + Send + Sync>;

/// Generator configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Size of each random chunk appended to the artifact
    pub chunk_size: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl GeneratorConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set chunk size (clamped to valid range)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);
        self
    }
}

/// Writes test artifacts
pub struct FileGenerator {
    config: GeneratorConfig,
    progress_callback: Option<ProgressCallback>,
}

impl FileGenerator {
    /// Create a generator with default configuration
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    /// Create a generator with custom configuration
    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            progress_callback: None,
        }
    }

    /// Set a progress callback
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&GenerateProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Make sure `path` holds exactly `size_bytes` bytes
    ///
    /// An artifact of another size is deleted and regenerated. The new file
    /// and its directory entry are synced to the device before returning.
    pub fn ensure(&self, path: &Path, size_bytes: u64) -> Result<GenerateOutcome> {
        match ArtifactStatus::probe(path, size_bytes)? {
            ArtifactStatus::Ready => {
                tracing::info!("File already exists with correct size: {:?}", path);
                return Ok(GenerateOutcome::AlreadyPresent);
            }
            ArtifactStatus::WrongSize { actual } => {
                let mismatch = Error::SizeMismatch {
                    expected: size_bytes,
                    actual,
                };
                tracing::warn!("{}: recreating {:?}", mismatch, path);
                fs::remove_file(path)?;
            }
            ArtifactStatus::Missing => {}
        }

        let start = Instant::now();
        self.write_random(path, size_bytes, start)?;
        let elapsed = start.elapsed();

        tracing::info!("Created {:?} ({} bytes) in {:?}", path, size_bytes, elapsed);
        Ok(GenerateOutcome::Created {
            bytes: size_bytes,
            elapsed,
        })
    }

    fn write_random(&self, path: &Path, size_bytes: u64, start: Instant) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::with_capacity(self.config.chunk_size, file);
        let mut rng = rand::rng();
        let mut chunk = vec![0u8; self.config.chunk_size];
        let mut written = 0u64;

        while written < size_bytes {
            let to_write = (size_bytes - written).min(chunk.len() as u64) as usize;
            rng.fill_bytes(&mut chunk[..to_write]);
            writer.write_all(&chunk[..to_write])?;
            written += to_write as u64;

            if let Some(ref callback) = self.progress_callback {
                let elapsed = start.elapsed();
                let speed_bps = if elapsed.as_secs_f64() > 0.0 {
                    (written as f64 / elapsed.as_secs_f64()) as u64
                } else {
                    0
                };
                callback(&GenerateProgress {
                    bytes_written: written,
                    total_bytes: size_bytes,
                    speed_bps,
                    elapsed,
                });
            }
        }

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        powercut_platform::sync_file(&file)?;
        powercut_platform::sync_parent(path)?;
        Ok(())
    }
}

impl Default for FileGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn small_generator() -> FileGenerator {
        FileGenerator::with_config(GeneratorConfig::new().chunk_size(MIN_CHUNK_SIZE))
    }

    #[test]
    fn test_creates_exact_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("large_file_1gb.dat");
        let size = 3 * MIN_CHUNK_SIZE as u64 + 123;

        let outcome = small_generator().ensure(&path, size).unwrap();

        assert!(matches!(outcome, GenerateOutcome::Created { bytes, .. } if bytes == size));
        assert_eq!(fs::metadata(&path).unwrap().len(), size);
    }

    #[test]
    fn test_zero_size_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.dat");

        small_generator().ensure(&path, 0).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_existing_correct_size_is_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact.dat");
        let content = vec![0x42u8; 8192];
        fs::write(&path, &content).unwrap();

        let outcome = small_generator().ensure(&path, 8192).unwrap();

        assert_eq!(outcome, GenerateOutcome::AlreadyPresent);
        assert_eq!(fs::read(&path).unwrap(), content);
    }

    #[test]
    fn test_wrong_size_is_regenerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact.dat");
        fs::write(&path, vec![0x42u8; 100]).unwrap();

        let outcome = small_generator().ensure(&path, 10_000).unwrap();

        assert!(matches!(outcome, GenerateOutcome::Created { .. }));
        let data = fs::read(&path).unwrap();
        assert_eq!(data.len(), 10_000);
        assert!(data.iter().any(|&b| b != 0x42));
    }

    #[test]
    fn test_content_is_random() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.dat");
        let b = dir.path().join("b.dat");

        small_generator().ensure(&a, 16_384).unwrap();
        small_generator().ensure(&b, 16_384).unwrap();

        assert_ne!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
    }

    #[test]
    fn test_missing_parent_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("artifact.dat");

        assert!(matches!(
            small_generator().ensure(&path, 10),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_progress_reaches_total() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact.dat");
        let last = Arc::new(AtomicU64::new(0));
        let last_clone = Arc::clone(&last);

        let generator = small_generator().on_progress(move |p| {
            assert!(p.percentage() <= 100.0);
            last_clone.store(p.bytes_written, Ordering::SeqCst);
        });
        generator.ensure(&path, 20_000).unwrap();

        assert_eq!(last.load(Ordering::SeqCst), 20_000);
    }

    #[test]
    fn test_artifact_status() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact.dat");

        assert_eq!(ArtifactStatus::probe(&path, 5).unwrap(), ArtifactStatus::Missing);
        fs::write(&path, b"12345").unwrap();
        assert_eq!(ArtifactStatus::probe(&path, 5).unwrap(), ArtifactStatus::Ready);
        assert_eq!(
            ArtifactStatus::probe(&path, 6).unwrap(),
            ArtifactStatus::WrongSize { actual: 5 }
        );
    }

    #[test]
    fn test_config_clamping() {
        assert_eq!(GeneratorConfig::new().chunk_size(1).chunk_size, MIN_CHUNK_SIZE);
        assert_eq!(
            GeneratorConfig::new().chunk_size(usize::MAX).chunk_size,
            MAX_CHUNK_SIZE
        );
        assert_eq!(GeneratorConfig::default().chunk_size, 10 * 1024 * 1024);
    }
}
