//! Result reports
//!
//! One plain-text report is written per verification under
//! `fs_test_results/<FS>_real_journaling_<YYYYmmdd_HHMMSS>.txt`. Reports are
//! opened with `create_new`; if the name is taken a numeric suffix is added,
//! so an earlier report is never overwritten.

use crate::classifier::JournalingVerdict;
use crate::error::{Error, Result};
use crate::verifier::{IntegrityReport, VerificationOutcome};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const SEPARATOR_WIDTH: usize = 60;
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Persisted record of one verification run
#[derive(Debug, Clone, Serialize)]
pub struct ResultReport {
    /// When the verification ran
    pub timestamp: DateTime<Local>,

    /// Host OS identification
    pub os: String,

    /// Filesystem label under test
    pub filesystem: String,

    /// Artifact size in GiB
    pub size_gb: u64,

    /// Whether the artificial delay was enabled
    pub use_delay: bool,

    /// The four observations
    pub integrity: IntegrityReport,

    /// Verdict derived from `integrity`
    pub verdict: JournalingVerdict,

    /// Baseline digest the artifacts were compared against
    pub baseline: String,

    /// Whether the artifact size was re-derived from file names
    pub recovered: bool,

    /// Destination size relative to the source, if both exist
    pub completion_percentage: Option<f64>,
}

impl ResultReport {
    /// Assemble a report for a finished verification
    pub fn new(
        filesystem: impl Into<String>,
        use_delay: bool,
        os: impl std::fmt::Display,
        outcome: &VerificationOutcome,
        verdict: JournalingVerdict,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            os: os.to_string(),
            filesystem: filesystem.into(),
            size_gb: outcome.layout.size_gb,
            use_delay,
            integrity: outcome.report,
            verdict,
            baseline: outcome.baseline.digest(),
            recovered: outcome.recovered,
            completion_percentage: outcome.completion_percentage(),
        }
    }

    /// Override the timestamp
    pub fn timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// One-line judgment
    pub fn summary(&self) -> String {
        if self.verdict.rating.is_effective() {
            format!("{} has effective journaling.", self.filesystem)
        } else {
            format!("{} has limited or ineffective journaling.", self.filesystem)
        }
    }

    /// Default file name for this report
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.file_stem())
    }

    fn file_stem(&self) -> String {
        format!(
            "{}_real_journaling_{}",
            sanitize_label(&self.filesystem),
            self.timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    /// Human-readable report text
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Write the report into `dir`, never replacing an existing file
    ///
    /// Returns the path that was written.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let stem = self.file_stem();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = if attempt == 0 {
                dir.join(format!("{}.txt", stem))
            } else {
                dir.join(format!("{}_{}.txt", stem, attempt))
            };

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    tracing::debug!("Report {:?} exists, trying next name", path);
                    continue;
                }
                Err(e) => return Err(Error::Io(e)),
            };

            file.write_all(self.render().as_bytes())?;
            file.flush()?;
            powercut_platform::sync_file(&file)?;
            powercut_platform::sync_parent(&path)?;

            tracing::info!("Results saved to {:?}", path);
            return Ok(path);
        }

        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("no free report name for {} in {}", stem, dir.display()),
        )))
    }
}

impl std::fmt::Display for ResultReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = &self.integrity;

        writeln!(f, "Real-world Journaling Test Results")?;
        writeln!(f, "{}\n", "=".repeat(SEPARATOR_WIDTH))?;
        writeln!(f, "Date: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "OS: {}", self.os)?;
        writeln!(f, "Filesystem: {}", self.filesystem)?;
        writeln!(f, "Test file size: {}GB", self.size_gb)?;
        writeln!(f, "Artificial delay used: {}\n", self.use_delay)?;

        writeln!(f, "Test Results:")?;
        writeln!(f, "- Source file exists: {}", r.source_exists())?;
        writeln!(f, "- Source file intact: {}", r.source_intact())?;
        writeln!(f, "- Destination file exists: {}", r.destination_exists())?;
        writeln!(f, "- Destination file intact: {}\n", r.destination_intact())?;

        writeln!(f, "Journaling Assessment: {}", self.verdict.rating)?;
        writeln!(f, "{}\n", self.verdict.rationale)?;

        writeln!(f, "Summary:")?;
        writeln!(f, "{}", self.summary())
    }
}

/// Make a filesystem label safe to embed in a file name
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::ChecksumRecord;
    use crate::checksum::{Checksum, ChecksumAlgorithm};
    use crate::classifier::classify;
    use crate::layout::TestLayout;
    use crate::verifier::ArtifactCheck;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn outcome(report: IntegrityReport) -> VerificationOutcome {
        let present = ArtifactCheck {
            size: Some(100),
            digest: Some("bea8252ff4e80f41719ea13cdf007273".to_string()),
            intact: true,
        };
        VerificationOutcome {
            layout: TestLayout::new("/data", 2),
            recovered: false,
            baseline: ChecksumRecord::new(
                Checksum::from_hex(ChecksumAlgorithm::Md5, "bea8252ff4e80f41719ea13cdf007273")
                    .unwrap(),
            ),
            source: present.clone(),
            destination: ArtifactCheck {
                size: Some(50),
                ..present
            },
            report,
        }
    }

    fn fixed_report(fs: &str, integrity: IntegrityReport) -> ResultReport {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        ResultReport::new(fs, true, "Linux 6.8.0", &outcome(integrity), classify(&integrity))
            .timestamp(ts)
    }

    #[test]
    fn test_file_name() {
        let report = fixed_report("ext4", IntegrityReport::new(true, true, false, false));
        assert_eq!(report.file_name(), "ext4_real_journaling_20240309_140507.txt");
    }

    #[test]
    fn test_file_name_sanitized() {
        let report = fixed_report("fat/32 x", IntegrityReport::new(true, true, false, false));
        assert_eq!(
            report.file_name(),
            "fat_32_x_real_journaling_20240309_140507.txt"
        );
        assert_eq!(sanitize_label(" "), "unknown");
    }

    #[test]
    fn test_display_matches_render() {
        let report = fixed_report("NTFS", IntegrityReport::new(true, true, false, false));
        let text = format!("{}", report);

        assert_eq!(text, report.render());
        assert!(text.starts_with("Real-world Journaling Test Results\n"));
        assert!(text.ends_with(&format!("{}\n", report.summary())));
    }

    #[test]
    fn test_render_good() {
        let report = fixed_report("ext4", IntegrityReport::new(true, true, true, false));
        let text = report.render();

        let expected = "\
Real-world Journaling Test Results
============================================================

Date: 2024-03-09 14:05:07
OS: Linux 6.8.0
Filesystem: ext4
Test file size: 2GB
Artificial delay used: true

Test Results:
- Source file exists: true
- Source file intact: true
- Destination file exists: true
- Destination file intact: false

Journaling Assessment: GOOD
Journaling worked well! Source preserved, but destination incomplete.

Summary:
ext4 has effective journaling.
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_summary_for_poor() {
        let report = fixed_report("FAT32", IntegrityReport::new(false, false, true, false));
        assert_eq!(report.summary(), "FAT32 has limited or ineffective journaling.");
        assert!(report.render().contains("Journaling Assessment: POOR"));
    }

    #[test]
    fn test_summary_for_undefined() {
        let report = fixed_report("xfs", IntegrityReport::new(false, false, true, true));
        assert_eq!(report.summary(), "xfs has limited or ineffective journaling.");
    }

    #[test]
    fn test_completion_percentage_carried() {
        let report = fixed_report("ext4", IntegrityReport::new(true, true, true, false));
        assert_eq!(report.completion_percentage, Some(50.0));
        assert_eq!(report.baseline, "bea8252ff4e80f41719ea13cdf007273");
    }

    #[test]
    fn test_save_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let results = dir.path().join("fs_test_results");
        let report = fixed_report("ext4", IntegrityReport::new(true, true, false, false));

        let first = report.save(&results).unwrap();
        let second = report.save(&results).unwrap();
        let third = report.save(&results).unwrap();

        assert_eq!(
            first.file_name().unwrap(),
            "ext4_real_journaling_20240309_140507.txt"
        );
        assert_eq!(
            second.file_name().unwrap(),
            "ext4_real_journaling_20240309_140507_1.txt"
        );
        assert_eq!(
            third.file_name().unwrap(),
            "ext4_real_journaling_20240309_140507_2.txt"
        );
        assert_eq!(fs::read_to_string(&first).unwrap(), report.render());
    }

    #[test]
    fn test_json_shape() {
        let report = fixed_report("ext4", IntegrityReport::new(true, true, false, false));
        let value: serde_json::Value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["filesystem"], "ext4");
        assert_eq!(value["size_gb"], 2);
        assert_eq!(value["verdict"]["rating"], "EXCELLENT");
        assert_eq!(value["integrity"]["source_intact"], true);
        assert_eq!(value["integrity"]["destination_exists"], false);
    }
}
