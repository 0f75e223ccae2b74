//! Post-crash verification
//!
//! Runs in the session after the restart, with no memory of the copy. The
//! only inputs are the artifacts on disk and the baseline side-file:
//!
//! 1. Locate the artifacts (re-deriving the size from file names if needed)
//! 2. Load the baseline digest ([`Error::NoBaseline`] if absent)
//! 3. Checksum each artifact that exists and compare it to the baseline
//!
//! Nothing is written or removed during verification.

use crate::baseline::ChecksumRecord;
use crate::checksum::{ChecksumConfig, ChecksumEngine, ChecksumProgress};
use crate::error::Result;
use crate::layout::TestLayout;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Which artifact is being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactRole {
    /// The file that was copied from
    Source,
    /// The file that was copied to
    Destination,
}

impl std::fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactRole::Source => write!(f, "source"),
            ArtifactRole::Destination => write!(f, "destination"),
        }
    }
}

/// Observed post-crash state of both artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IntegrityReport {
    source_exists: bool,
    source_intact: bool,
    destination_exists: bool,
    destination_intact: bool,
}

impl IntegrityReport {
    /// Build a report from the four observations
    pub const fn new(
        source_exists: bool,
        source_intact: bool,
        destination_exists: bool,
        destination_intact: bool,
    ) -> Self {
        Self {
            source_exists,
            source_intact,
            destination_exists,
            destination_intact,
        }
    }

    /// Source file is present
    pub const fn source_exists(&self) -> bool {
        self.source_exists
    }

    /// Source file matches the baseline
    pub const fn source_intact(&self) -> bool {
        self.source_intact
    }

    /// Destination file is present
    pub const fn destination_exists(&self) -> bool {
        self.destination_exists
    }

    /// Destination file matches the baseline
    pub const fn destination_intact(&self) -> bool {
        self.destination_intact
    }
}

/// Observation of a single artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCheck {
    /// Size on disk, `None` if the file does not exist
    pub size: Option<u64>,
    /// Hex digest of the current content, `None` if the file does not exist
    pub digest: Option<String>,
    /// Content matches the baseline
    pub intact: bool,
}

impl ArtifactCheck {
    fn missing() -> Self {
        Self {
            size: None,
            digest: None,
            intact: false,
        }
    }

    /// Whether the file was present
    pub fn exists(&self) -> bool {
        self.size.is_some()
    }
}

/// Everything learned by one verification
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    /// Layout that was verified (after recovery)
    pub layout: TestLayout,

    /// Whether the size was re-derived from file names
    pub recovered: bool,

    /// Baseline the artifacts were compared against
    pub baseline: ChecksumRecord,

    /// Source observation
    pub source: ArtifactCheck,

    /// Destination observation
    pub destination: ArtifactCheck,

    /// The four booleans fed to the classifier
    pub report: IntegrityReport,
}

impl VerificationOutcome {
    /// Destination size as a percentage of the source size
    ///
    /// `None` unless both files exist and the source is non-empty.
    pub fn completion_percentage(&self) -> Option<f64> {
        match (self.destination.size, self.source.size) {
            (Some(dest), Some(src)) if src > 0 => Some(dest as f64 / src as f64 * 100.0),
            _ => None,
        }
    }
}

/// Progress callback type, told which artifact is being hashed
pub type ProgressCallback = Arc<dyn Fn(ArtifactRole, &ChecksumProgress) + Send + Sync>;

/// Evaluates artifacts after a restart
pub struct PostCrashVerifier {
    checksum: ChecksumConfig,
    progress_callback: Option<ProgressCallback>,
}

impl PostCrashVerifier {
    /// Create a verifier with default checksum settings
    pub fn new() -> Self {
        Self::with_config(ChecksumConfig::default())
    }

    /// Create a verifier with custom checksum settings
    pub fn with_config(checksum: ChecksumConfig) -> Self {
        Self {
            checksum,
            progress_callback: None,
        }
    }

    /// Set a progress callback for the checksum passes
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ArtifactRole, &ChecksumProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Verify the artifacts described by `layout`
    pub fn verify(&self, layout: &TestLayout) -> Result<VerificationOutcome> {
        let located = layout.recover()?;
        let layout = located.layout;

        let baseline = ChecksumRecord::read(&layout.record_file)?;
        tracing::info!(
            "Verifying against {} baseline {}",
            baseline.checksum.algorithm,
            baseline.digest()
        );

        let source = self.check(ArtifactRole::Source, &layout.source_file, &baseline)?;
        let destination =
            self.check(ArtifactRole::Destination, &layout.destination_file, &baseline)?;

        let report = IntegrityReport::new(
            source.exists(),
            source.intact,
            destination.exists(),
            destination.intact,
        );
        tracing::debug!("Integrity report: {:?}", report);

        Ok(VerificationOutcome {
            layout,
            recovered: located.recovered,
            baseline,
            source,
            destination,
            report,
        })
    }

    fn check(
        &self,
        role: ArtifactRole,
        path: &Path,
        baseline: &ChecksumRecord,
    ) -> Result<ArtifactCheck> {
        if !path.is_file() {
            tracing::warn!("{} file does not exist: {:?}", role, path);
            return Ok(ArtifactCheck::missing());
        }

        let size = std::fs::metadata(path)?.len();
        let mut engine = ChecksumEngine::with_config(self.checksum.clone());
        if let Some(callback) = &self.progress_callback {
            let callback = Arc::clone(callback);
            engine = engine.on_progress(move |p| callback(role, p));
        }

        let checksum = engine.calculate_file(path, baseline.checksum.algorithm)?;
        let intact = checksum == baseline.checksum;

        if intact {
            tracing::info!("{} file is intact", role);
        } else {
            tracing::warn!(
                "{} file differs from baseline ({} bytes, {} != {})",
                role,
                size,
                checksum,
                baseline.digest()
            );
        }

        Ok(ArtifactCheck {
            size: Some(size),
            digest: Some(checksum.to_hex()),
            intact,
        })
    }
}

impl Default for PostCrashVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{Checksum, ChecksumAlgorithm};
    use crate::error::Error;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    const CONTENT: &[u8] = b"Hello, World!\n";
    const CONTENT_MD5: &str = "bea8252ff4e80f41719ea13cdf007273";

    fn setup(dir: &Path, size_gb: u64) -> TestLayout {
        let layout = TestLayout::new(dir, size_gb);
        layout.prepare().unwrap();
        fs::write(&layout.source_file, CONTENT).unwrap();
        ChecksumRecord::new(Checksum::from_hex(ChecksumAlgorithm::Md5, CONTENT_MD5).unwrap())
            .write_durable(&layout.record_file)
            .unwrap();
        layout
    }

    #[test]
    fn test_both_intact() {
        let dir = TempDir::new().unwrap();
        let layout = setup(dir.path(), 1);
        fs::write(&layout.destination_file, CONTENT).unwrap();

        let outcome = PostCrashVerifier::new().verify(&layout).unwrap();

        assert_eq!(outcome.report, IntegrityReport::new(true, true, true, true));
        assert!(!outcome.recovered);
        assert_eq!(outcome.source.digest.as_deref(), Some(CONTENT_MD5));
        assert_eq!(outcome.completion_percentage(), Some(100.0));
    }

    #[test]
    fn test_destination_truncated() {
        let dir = TempDir::new().unwrap();
        let layout = setup(dir.path(), 1);
        fs::write(&layout.destination_file, &CONTENT[..7]).unwrap();

        let outcome = PostCrashVerifier::new().verify(&layout).unwrap();

        assert_eq!(outcome.report, IntegrityReport::new(true, true, true, false));
        assert_eq!(outcome.destination.size, Some(7));
        let pct = outcome.completion_percentage().unwrap();
        assert!((pct - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_destination_missing() {
        let dir = TempDir::new().unwrap();
        let layout = setup(dir.path(), 1);

        let outcome = PostCrashVerifier::new().verify(&layout).unwrap();

        assert_eq!(outcome.report, IntegrityReport::new(true, true, false, false));
        assert_eq!(outcome.destination, ArtifactCheck::missing());
        assert_eq!(outcome.completion_percentage(), None);
    }

    #[test]
    fn test_source_corrupted() {
        let dir = TempDir::new().unwrap();
        let layout = setup(dir.path(), 1);
        fs::write(&layout.source_file, b"Hello, Wxrld!\n").unwrap();
        fs::write(&layout.destination_file, b"junk").unwrap();

        let outcome = PostCrashVerifier::new().verify(&layout).unwrap();

        assert_eq!(outcome.report, IntegrityReport::new(true, false, true, false));
    }

    #[test]
    fn test_source_missing_destination_intact() {
        let dir = TempDir::new().unwrap();
        let layout = setup(dir.path(), 1);
        fs::rename(&layout.source_file, &layout.destination_file).unwrap();

        let outcome = PostCrashVerifier::new().verify(&layout).unwrap();

        assert_eq!(outcome.report, IntegrityReport::new(false, false, true, true));
    }

    #[test]
    fn test_no_baseline() {
        let dir = TempDir::new().unwrap();
        let layout = setup(dir.path(), 1);
        fs::remove_file(&layout.record_file).unwrap();

        let result = PostCrashVerifier::new().verify(&layout);
        assert!(matches!(result, Err(Error::NoBaseline(_))));
    }

    #[test]
    fn test_state_not_found() {
        let dir = TempDir::new().unwrap();
        let layout = TestLayout::new(dir.path(), 1);
        layout.prepare().unwrap();

        let result = PostCrashVerifier::new().verify(&layout);
        assert!(matches!(result, Err(Error::StateNotFound(_))));
    }

    #[test]
    fn test_recovers_size_from_file_names() {
        let dir = TempDir::new().unwrap();
        let actual = setup(dir.path(), 7);

        let outcome = PostCrashVerifier::new()
            .verify(&TestLayout::new(dir.path(), 2))
            .unwrap();

        assert!(outcome.recovered);
        assert_eq!(outcome.layout, actual);
        assert!(outcome.report.source_intact());
    }

    #[test]
    fn test_verification_does_not_modify_artifacts() {
        let dir = TempDir::new().unwrap();
        let layout = setup(dir.path(), 1);
        fs::write(&layout.destination_file, &CONTENT[..3]).unwrap();
        let before_src = fs::metadata(&layout.source_file).unwrap().modified().unwrap();
        let before_dst = fs::metadata(&layout.destination_file).unwrap().modified().unwrap();

        PostCrashVerifier::new().verify(&layout).unwrap();

        assert_eq!(fs::read(&layout.source_file).unwrap(), CONTENT);
        assert_eq!(fs::read(&layout.destination_file).unwrap(), &CONTENT[..3]);
        assert_eq!(
            fs::metadata(&layout.source_file).unwrap().modified().unwrap(),
            before_src
        );
        assert_eq!(
            fs::metadata(&layout.destination_file).unwrap().modified().unwrap(),
            before_dst
        );
    }

    #[test]
    fn test_progress_reports_both_roles() {
        let dir = TempDir::new().unwrap();
        let layout = setup(dir.path(), 1);
        fs::write(&layout.destination_file, CONTENT).unwrap();

        let source_calls = Arc::new(AtomicU32::new(0));
        let dest_calls = Arc::new(AtomicU32::new(0));
        let (s, d) = (Arc::clone(&source_calls), Arc::clone(&dest_calls));

        PostCrashVerifier::new()
            .on_progress(move |role, _| match role {
                ArtifactRole::Source => {
                    s.fetch_add(1, Ordering::SeqCst);
                }
                ArtifactRole::Destination => {
                    d.fetch_add(1, Ordering::SeqCst);
                }
            })
            .verify(&layout)
            .unwrap();

        assert_eq!(source_calls.load(Ordering::SeqCst), 1);
        assert_eq!(dest_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(ArtifactRole::Source.to_string(), "source");
        assert_eq!(ArtifactRole::Destination.to_string(), "destination");
    }
}
