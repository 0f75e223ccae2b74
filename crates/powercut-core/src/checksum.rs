//! Checksum engine for test artifacts
//!
//! This module provides:
//! - Streaming checksum calculation (MD5, SHA-256, SHA-512, CRC32)
//! - Hex encoding/decoding of digests
//! - Progress tracking while hashing multi-gigabyte files
//!
//! Files are read in fixed-size blocks, so memory use does not depend on the
//! size of the artifact being hashed.
//!
//! ## Example
//!
//! ```no_run
//! use powercut_core::checksum::{ChecksumAlgorithm, ChecksumEngine};
//!
//! let mut engine = ChecksumEngine::new()
//!     .on_progress(|p| println!("{:.1}%", p.percentage()));
//!
//! let checksum = engine.calculate_file("source_test/large_file_2gb.dat", ChecksumAlgorithm::Md5)?;
//! println!("MD5: {}", checksum);
//! # Ok::<(), powercut_core::Error>(())
//! ```

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

// ============================================================================
// Constants
// ============================================================================

/// Default block size for hashing (4 MB)
pub const DEFAULT_CHECKSUM_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Minimum block size (4 KB)
pub const MIN_CHECKSUM_BLOCK_SIZE: usize = 4 * 1024;

/// Maximum block size (64 MB)
pub const MAX_CHECKSUM_BLOCK_SIZE: usize = 64 * 1024 * 1024;

// ============================================================================
// Checksum Algorithm
// ============================================================================

/// Supported checksum algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChecksumAlgorithm {
    /// MD5 (128-bit, the default baseline digest)
    #[default]
    Md5,
    /// SHA-256
    Sha256,
    /// SHA-512
    Sha512,
    /// CRC32 (fast, not collision resistant)
    Crc32,
}

impl ChecksumAlgorithm {
    /// Get the expected output length in bytes
    pub fn byte_length(&self) -> usize {
        match self {
            ChecksumAlgorithm::Md5 => 16,
            ChecksumAlgorithm::Sha256 => 32,
            ChecksumAlgorithm::Sha512 => 64,
            ChecksumAlgorithm::Crc32 => 4,
        }
    }

    /// Get the expected output length in hex characters
    pub fn hex_length(&self) -> usize {
        self.byte_length() * 2
    }

    /// Get algorithm name
    pub fn name(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "MD5",
            ChecksumAlgorithm::Sha256 => "SHA-256",
            ChecksumAlgorithm::Sha512 => "SHA-512",
            ChecksumAlgorithm::Crc32 => "CRC32",
        }
    }

    /// Detect the algorithm that produced a hex digest of this length
    pub fn from_hex_length(len: usize) -> Option<Self> {
        match len {
            32 => Some(ChecksumAlgorithm::Md5),
            64 => Some(ChecksumAlgorithm::Sha256),
            128 => Some(ChecksumAlgorithm::Sha512),
            8 => Some(ChecksumAlgorithm::Crc32),
            _ => None,
        }
    }

    /// List all supported algorithms
    pub fn all() -> &'static [ChecksumAlgorithm] {
        &[
            ChecksumAlgorithm::Md5,
            ChecksumAlgorithm::Sha256,
            ChecksumAlgorithm::Sha512,
            ChecksumAlgorithm::Crc32,
        ]
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ChecksumAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.to_lowercase();
        match s.as_str() {
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(ChecksumAlgorithm::Sha256),
            "sha512" | "sha-512" => Ok(ChecksumAlgorithm::Sha512),
            "crc32" | "crc-32" => Ok(ChecksumAlgorithm::Crc32),
            _ => Err(Error::InvalidConfig(format!(
                "Unknown checksum algorithm: {}",
                s
            ))),
        }
    }
}

// ============================================================================
// Checksum Result
// ============================================================================

/// Checksum calculation result
#[derive(Debug, Clone)]
pub struct Checksum {
    /// The algorithm used
    pub algorithm: ChecksumAlgorithm,
    /// The digest bytes
    pub bytes: Vec<u8>,
}

impl Checksum {
    /// Create a new checksum from bytes
    pub fn new(algorithm: ChecksumAlgorithm, bytes: Vec<u8>) -> Self {
        Self { algorithm, bytes }
    }

    /// Parse a hex digest, inferring the algorithm from its length
    pub fn parse_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        let algorithm = ChecksumAlgorithm::from_hex_length(hex.len()).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "Unrecognized checksum length: {} hex characters",
                hex.len()
            ))
        })?;
        Self::from_hex(algorithm, hex)
    }

    /// Create a checksum from a hex string
    pub fn from_hex(algorithm: ChecksumAlgorithm, hex: &str) -> Result<Self> {
        let hex = hex.trim().to_lowercase();

        if hex.len() != algorithm.hex_length() {
            return Err(Error::InvalidConfig(format!(
                "Invalid {} checksum length: expected {}, got {}",
                algorithm.name(),
                algorithm.hex_length(),
                hex.len()
            )));
        }

        let bytes = hex_to_bytes(&hex)?;
        Ok(Self { algorithm, bytes })
    }

    /// Get the checksum as a lowercase hex string
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.bytes)
    }

    /// Check if this checksum matches another
    pub fn matches(&self, other: &Checksum) -> bool {
        self.algorithm == other.algorithm && self.bytes == other.bytes
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl PartialEq for Checksum {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Progress callback type
pub type ProgressCallback = Box<dyn FnMut(&ChecksumProgress) + Send>;

/// Hashing progress information
#[derive(Debug, Clone)]
pub struct ChecksumProgress {
    /// Bytes hashed so far
    pub bytes_processed: u64,
    /// Total bytes to hash (if known)
    pub total_bytes: Option<u64>,
    /// Current speed in bytes per second
    pub speed_bps: u64,
    /// Elapsed time
    pub elapsed: Duration,
}

impl ChecksumProgress {
    /// Calculate completion percentage (0-100)
    pub fn percentage(&self) -> f64 {
        match self.total_bytes {
            Some(total) if total > 0 => (self.bytes_processed as f64 / total as f64) * 100.0,
            Some(_) => 100.0,
            None => 0.0,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Checksum engine configuration
#[derive(Debug, Clone)]
pub struct ChecksumConfig {
    /// Block size for reading
    pub block_size: usize,
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_CHECKSUM_BLOCK_SIZE,
        }
    }
}

impl ChecksumConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set block size (clamped to valid range)
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size.clamp(MIN_CHECKSUM_BLOCK_SIZE, MAX_CHECKSUM_BLOCK_SIZE);
        self
    }
}

/// Streaming checksum calculator
pub struct ChecksumEngine {
    config: ChecksumConfig,
    progress_callback: Option<ProgressCallback>,
}

impl ChecksumEngine {
    /// Create a new engine with default configuration
    pub fn new() -> Self {
        Self::with_config(ChecksumConfig::default())
    }

    /// Create an engine with custom configuration
    pub fn with_config(config: ChecksumConfig) -> Self {
        Self {
            config,
            progress_callback: None,
        }
    }

    /// Set progress callback
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ChecksumProgress) + Send + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Hash the full content of the file at `path`
    ///
    /// Fails with [`Error::Io`] if the file does not exist or cannot be read.
    pub fn calculate_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        algorithm: ChecksumAlgorithm,
    ) -> Result<Checksum> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let total_size = file.metadata()?.len();

        tracing::debug!("Calculating {} checksum of {:?}", algorithm, path);
        let checksum = self.calculate(&mut file, algorithm, Some(total_size))?;
        tracing::debug!("{} of {:?}: {}", algorithm, path, checksum);

        Ok(checksum)
    }

    /// Hash everything a reader yields until EOF
    pub fn calculate<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
        algorithm: ChecksumAlgorithm,
        total_size: Option<u64>,
    ) -> Result<Checksum> {
        let start = Instant::now();
        let mut bytes_processed = 0u64;
        let mut buffer = vec![0u8; self.config.block_size];
        let mut hasher = Hasher::new(algorithm);

        loop {
            let n = read_full(reader, &mut buffer)?;
            if n == 0 {
                break;
            }

            hasher.update(&buffer[..n]);
            bytes_processed += n as u64;

            if let Some(ref mut callback) = self.progress_callback {
                let elapsed = start.elapsed();
                let speed_bps = if elapsed.as_secs_f64() > 0.0 {
                    (bytes_processed as f64 / elapsed.as_secs_f64()) as u64
                } else {
                    0
                };

                callback(&ChecksumProgress {
                    bytes_processed,
                    total_bytes: total_size,
                    speed_bps,
                    elapsed,
                });
            }
        }

        Ok(Checksum::new(algorithm, hasher.finalize()))
    }
}

impl Default for ChecksumEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal hasher state for each algorithm
enum Hasher {
    Md5(md5::Md5),
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
    Crc32(crc32fast::Hasher),
}

impl Hasher {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        use sha2::Digest;
        match algorithm {
            ChecksumAlgorithm::Md5 => Hasher::Md5(md5::Md5::new()),
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(sha2::Sha256::new()),
            ChecksumAlgorithm::Sha512 => Hasher::Sha512(sha2::Sha512::new()),
            ChecksumAlgorithm::Crc32 => Hasher::Crc32(crc32fast::Hasher::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        use sha2::Digest;
        match self {
            Hasher::Md5(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
            Hasher::Crc32(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        use sha2::Digest;
        match self {
            Hasher::Md5(h) => h.finalize().to_vec(),
            Hasher::Sha256(h) => h.finalize().to_vec(),
            Hasher::Sha512(h) => h.finalize().to_vec(),
            Hasher::Crc32(h) => h.finalize().to_be_bytes().to_vec(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Read as much as possible into buffer
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(total)
}

/// Convert bytes to lowercase hex string
fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Convert hex string to bytes
fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return Err(Error::InvalidConfig(
            "Hex string must have even length".to_string(),
        ));
    }

    if let Some(pos) = hex.bytes().position(|b| !b.is_ascii_hexdigit()) {
        return Err(Error::InvalidConfig(format!(
            "Invalid hex character at position {}",
            pos
        )));
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| {
                Error::InvalidConfig(format!("Invalid hex character at position {}", i))
            })
        })
        .collect()
}

// ============================================================================
// Unit Tests
// ============================================================================
