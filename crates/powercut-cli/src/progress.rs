//! Progress bars and the console view of the monitored copy

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use powercut_core::{CopyObserver, CopyProgress, Error};
use std::time::Duration;

const BANNER_WIDTH: usize = 60;

/// Create a progress bar for a byte-counting operation
pub fn create_progress_bar(total: u64, operation: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(bar_style(&format!(
        "  {{spinner:.green}} {} [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{eta}})",
        operation
    )));
    pb
}

/// Create the progress bar for the test copy
pub fn create_copy_progress_bar(total: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(bar_style(
        "  {spinner:.green} Copying [{bar:40.cyan/blue}] {percent}% {bytes}/{total_bytes} {msg}",
    ));
    pb
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

/// Print `title` centered in a line of `=`
pub fn banner(title: &str) -> String {
    format!("{:=^width$}", format!(" {} ", title), width = BANNER_WIDTH)
}

/// A line of `=` as wide as [`banner`]
pub fn rule() -> String {
    "=".repeat(BANNER_WIDTH)
}

/// Drives the copy progress bar and tells the operator when to cut power
///
/// The crash-window notice is printed even in quiet mode.
pub struct ConsoleObserver {
    pb: ProgressBar,
}

impl ConsoleObserver {
    pub fn new(total: u64, quiet: bool) -> Self {
        Self {
            pb: create_copy_progress_bar(total, quiet),
        }
    }

    /// Clear the bar once the copy thread has terminated
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl CopyObserver for ConsoleObserver {
    fn on_progress(&mut self, progress: &CopyProgress) {
        self.pb.set_length(progress.total_bytes);
        self.pb.set_position(progress.bytes_copied);
        self.pb.set_message(format!(
            "{}, ETA: {}",
            progress.speed_display(),
            progress.eta_display()
        ));
    }

    fn on_window_open(&mut self, progress: &CopyProgress, countdown: Duration) {
        self.pb.suspend(|| {
            println!();
            println!("{}", rule());
            println!("{}", style(banner("CRASH POINT REACHED!")).red().bold());
            println!("{}", rule());
            println!(
                "\n{}",
                style("⚠️  SHUT DOWN YOUR COMPUTER NOW! ⚠️").red().bold()
            );
            println!("\n   Hold the power button until computer turns off");
            println!("   OR disconnect the power cable");
            println!(
                "\n   Progress is at {:.1}%. You have {} seconds before copy continues...",
                progress.percentage(),
                countdown.as_secs()
            );
            println!("\n{}\n", rule());
        });
    }

    fn on_countdown_tick(&mut self, remaining: Duration) {
        self.pb.set_message(
            style(format!(
                "⚠️  SHUTDOWN NOW! {} seconds remaining...",
                remaining.as_secs()
            ))
            .red()
            .bold()
            .to_string(),
        );
        if self.pb.is_hidden() {
            eprintln!("SHUTDOWN NOW! {} seconds remaining...", remaining.as_secs());
        }
    }

    fn on_window_closed(&mut self) {
        self.pb.suspend(|| {
            println!("{}", style("Shutdown window passed. Copy continuing...").yellow());
        });
    }

    fn on_copy_error(&mut self, error: &Error) {
        self.pb.abandon_with_message(format!("{}", style(error).red()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(copied: u64, total: u64) -> CopyProgress {
        CopyProgress {
            bytes_copied: copied,
            total_bytes: total,
            speed_bps: 1024 * 1024,
            eta_seconds: Some(90),
            elapsed: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_create_progress_bar_quiet() {
        let pb = create_progress_bar(1024, "Test", true);
        assert!(pb.is_hidden());
    }

    #[test]
    fn test_create_progress_bar_with_size() {
        let pb = create_progress_bar(1024 * 1024, "Checksumming", false);
        // Progress bar may be hidden in test environment without a terminal
        assert_eq!(pb.length(), Some(1024 * 1024));
    }

    #[test]
    fn test_create_copy_progress_bar_quiet() {
        let pb = create_copy_progress_bar(1024, true);
        assert!(pb.is_hidden());
    }

    #[test]
    fn test_banner_is_centered() {
        let line = banner("CRASH POINT REACHED!");
        assert_eq!(line.chars().count(), 60);
        assert_eq!(
            line,
            format!("{} CRASH POINT REACHED! {}", "=".repeat(19), "=".repeat(19))
        );
        assert_eq!(rule().len(), 60);
    }

    #[test]
    fn test_banner_odd_padding_goes_right() {
        let line = banner("FILE COPY CRASH TEST");
        assert_eq!(
            line,
            format!("{} FILE COPY CRASH TEST {}", "=".repeat(19), "=".repeat(19))
        );

        let line = banner("VERIFYING FILES AFTER CRASH");
        assert_eq!(line.chars().count(), 60);
        assert_eq!(
            line,
            format!("{} VERIFYING FILES AFTER CRASH {}", "=".repeat(15), "=".repeat(16))
        );
    }

    #[test]
    fn test_observer_tracks_progress() {
        let mut observer = ConsoleObserver::new(100, false);
        observer.on_progress(&progress(40, 200));

        assert_eq!(observer.pb.length(), Some(200));
        assert_eq!(observer.pb.position(), 40);
        assert!(observer.pb.message().contains("1.0 MB/s"));
        observer.finish();
    }

    #[test]
    fn test_observer_countdown_message() {
        let mut observer = ConsoleObserver::new(100, false);
        observer.on_countdown_tick(Duration::from_secs(7));
        assert!(observer.pb.message().contains("7 seconds remaining"));
    }
}
