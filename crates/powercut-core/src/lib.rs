//! # Powercut Core
//!
//! Core library for the Powercut filesystem journaling crash test.
//!
//! A test runs in two sessions that share nothing but files on disk:
//!
//! 1. **Before the crash**: generate a large artifact, record its checksum
//!    durably, then copy it block by block while a crash window tells the
//!    operator when to cut power.
//! 2. **After the restart**: re-checksum whatever survived and classify how
//!    well the filesystem's journal preserved the source and the copy.
//!
//! ## Modules
//!
//! - `checksum`: Streaming checksum engine (MD5 by default)
//! - `generator`: Exact-size random artifact generation
//! - `copier`: Monitored copy with per-block durability and a crash window
//! - `verifier`: Post-crash integrity checks
//! - `classifier`: Journaling verdicts from integrity reports
//! - `baseline`: The durable checksum side-file
//! - `layout`: File locations shared by both sessions
//! - `report`: Persisted result reports
//! - `config`: Runtime configuration
//! - `settings`: Persistent user settings from configuration file
//! - `error`: Error types and result aliases
//!
//! ## Example
//!
//! ```no_run
//! use powercut_core::{CrashTest, SilentObserver, TestConfig};
//!
//! let test = CrashTest::new(TestConfig::new("ext4").size_gb(1));
//! test.create()?;
//! test.copy(&mut SilentObserver)?;
//!
//! // ... power is cut, machine restarts ...
//!
//! let result = test.verify()?;
//! println!("{}: {}", result.verdict.rating, result.verdict.rationale);
//! test.save_report(&result.report)?;
//! # Ok::<(), powercut_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod baseline;
pub mod checksum;
pub mod classifier;
pub mod config;
pub mod copier;
pub mod error;
pub mod generator;
pub mod layout;
pub mod report;
pub mod settings;
pub mod verifier;

pub use baseline::ChecksumRecord;
pub use checksum::{
    Checksum, ChecksumAlgorithm, ChecksumConfig, ChecksumEngine, ChecksumProgress,
    DEFAULT_CHECKSUM_BLOCK_SIZE, MAX_CHECKSUM_BLOCK_SIZE, MIN_CHECKSUM_BLOCK_SIZE,
};
pub use classifier::{classify, JournalingVerdict, Rating};
pub use config::{TestConfig, BYTES_PER_GB, DEFAULT_RESULTS_DIR, DEFAULT_SIZE_GB};
pub use copier::{
    format_duration, format_speed, CopyConfig, CopyObserver, CopyOutcome, CopyProgress,
    CrashWindow, MonitoredCopy, SilentObserver,
};
pub use error::{Error, Result};
pub use generator::{
    ArtifactStatus, FileGenerator, GenerateOutcome, GenerateProgress, GeneratorConfig,
};
pub use layout::{artifact_name, parse_artifact_size, LocatedLayout, TestLayout};
pub use report::ResultReport;
pub use settings::{Settings, SettingsError};
pub use verifier::{
    ArtifactCheck, ArtifactRole, IntegrityReport, PostCrashVerifier, VerificationOutcome,
};

use std::path::PathBuf;

/// Everything produced by one verification session
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Raw observations
    pub outcome: VerificationOutcome,
    /// Verdict derived from the observations
    pub verdict: JournalingVerdict,
    /// Report ready to be saved
    pub report: ResultReport,
}

/// Orchestrates the create, copy and verify actions of a crash test
pub struct CrashTest {
    config: TestConfig,
    settings: Settings,
}

impl CrashTest {
    /// Create a test with default settings
    pub fn new(config: TestConfig) -> Self {
        Self::with_settings(config, Settings::default())
    }

    /// Create a test with persistent settings applied
    pub fn with_settings(config: TestConfig, settings: Settings) -> Self {
        Self { config, settings }
    }

    /// Get the current configuration
    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Get the settings in use
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Paths of the artifacts for the configured size
    pub fn layout(&self) -> TestLayout {
        self.config.layout()
    }

    /// A generator configured from the settings
    pub fn file_generator(&self) -> Result<FileGenerator> {
        Ok(FileGenerator::with_config(self.settings.generator_config()?))
    }

    /// A monitored copy configured from the settings and the delay flag
    pub fn monitored_copy(&self) -> Result<MonitoredCopy> {
        let config = self
            .settings
            .copy_config()?
            .use_delay(self.config.use_delay);
        Ok(MonitoredCopy::with_config(config, self.settings.crash_window()?))
    }

    /// A verifier configured from the settings
    pub fn verifier(&self) -> Result<PostCrashVerifier> {
        Ok(PostCrashVerifier::with_config(self.settings.checksum_config()?))
    }

    /// Generate the source artifact with default progress handling
    pub fn create(&self) -> Result<GenerateOutcome> {
        self.create_with(&self.file_generator()?)
    }

    /// Generate the source artifact using `generator`
    pub fn create_with(&self, generator: &FileGenerator) -> Result<GenerateOutcome> {
        self.config.validate()?;
        let layout = self.layout();
        layout.prepare()?;

        tracing::info!(
            "Creating {}GB file for {} at {:?}",
            self.config.size_gb,
            self.config.filesystem,
            layout.source_file
        );
        generator.ensure(&layout.source_file, self.config.size_bytes())
    }

    /// Run the monitored copy
    pub fn copy(&self, observer: &mut dyn CopyObserver) -> Result<CopyOutcome> {
        self.copy_with(&mut self.monitored_copy()?, observer)
    }

    /// Run the monitored copy using `copy`
    pub fn copy_with(
        &self,
        copy: &mut MonitoredCopy,
        observer: &mut dyn CopyObserver,
    ) -> Result<CopyOutcome> {
        self.config.validate()?;
        let layout = self.layout();
        layout.prepare()?;

        copy.run(
            &layout.source_file,
            &layout.destination_file,
            &layout.record_file,
            observer,
        )
    }

    /// Verify the artifacts and classify the result
    pub fn verify(&self) -> Result<TestResult> {
        self.verify_with(&self.verifier()?)
    }

    /// Verify using `verifier` and classify the result
    pub fn verify_with(&self, verifier: &PostCrashVerifier) -> Result<TestResult> {
        self.config.validate()?;
        let outcome = verifier.verify(&self.layout())?;
        let verdict = classify(&outcome.report);

        tracing::info!("Journaling assessment: {}", verdict.rating);

        let report = ResultReport::new(
            self.config.filesystem.clone(),
            self.config.use_delay,
            powercut_platform::os_info(),
            &outcome,
            verdict,
        );

        Ok(TestResult {
            outcome,
            verdict,
            report,
        })
    }

    /// Persist a report under the configured results directory
    pub fn save_report(&self, report: &ResultReport) -> Result<PathBuf> {
        report.save(&self.config.results_path())
    }
}
