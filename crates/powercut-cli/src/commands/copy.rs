//! Test action - runs the monitored copy and opens the crash window
//!
//! Steps:
//! - Check that the source artifact exists
//! - Explain the forced-shutdown procedure and wait for confirmation
//! - Record the baseline checksum
//! - Copy with progress display, announcing the crash window
//! - Print the command to run after the restart

use anyhow::{bail, Context, Result};
use console::style;
use dialoguer::Confirm;
use powercut_core::{CrashTest, TestConfig};
use std::path::{Path, PathBuf};

use super::{format_size, Output};
use crate::progress::{banner, create_progress_bar, rule, ConsoleObserver};

/// Arguments for the test action
pub struct CopyArgs {
    /// Start without asking
    pub skip_confirm: bool,
    /// Working directory given on the command line, repeated in the verify hint
    pub dir_hint: Option<PathBuf>,
}

/// Execute the test action
pub fn execute(test: &CrashTest, args: CopyArgs, output: Output) -> Result<()> {
    let quiet = output.quiet;
    let config = test.config();
    let layout = test.layout();

    if !layout.source_file.is_file() {
        bail!(
            "Source file doesn't exist: {}\n\
             Please create file first using --create with the same --size parameter",
            layout.source_file.display()
        );
    }
    let source_size = std::fs::metadata(&layout.source_file)
        .with_context(|| format!("Failed to stat {}", layout.source_file.display()))?
        .len();

    let copy = test.monitored_copy().context("Invalid copy settings")?;
    let window = copy.window();

    if !quiet {
        println!("\n{}", rule());
        println!("{}", style(banner("FILE COPY CRASH TEST")).bold());
        println!("{}", rule());
        println!(
            "\nThe file will be copied, and at {:.0}-{:.0}% progress",
            window.lower() * 100.0,
            window.upper() * 100.0
        );
        println!("you will be asked to forcibly shut down the computer.");
        println!(
            "\n{}",
            style("IMPORTANT: Use forced shutdown (hold power button)").yellow().bold()
        );
        println!("           Do NOT use normal shutdown!");

        if config.use_delay {
            println!(
                "\n{} Using artificial delay for easier testing.",
                style("✓").green()
            );
        } else {
            println!(
                "\n{} Running at full speed (no artificial delay).",
                style("⚠").yellow()
            );
            println!("  Shutdown window will be very short!");
        }
        println!("\n{}", rule());
    }

    if !args.skip_confirm {
        let proceed = Confirm::new()
            .with_prompt("Ready to start the copy?")
            .default(true)
            .interact()?;

        if !proceed {
            println!("{}", style("Aborted.").yellow());
            return Ok(());
        }
    }

    println_if!(
        quiet,
        "\n{} {}",
        style("Calculating checksum for:").bold(),
        layout.source_file.display()
    );

    let checksum_pb = create_progress_bar(source_size, "Checksumming", quiet);
    let pb_clone = checksum_pb.clone();
    let mut copy = copy.on_checksum_progress(move |p| {
        pb_clone.set_position(p.bytes_processed);
        if p.total_bytes.is_some_and(|total| p.bytes_processed >= total) {
            pb_clone.finish_and_clear();
        }
    });

    let mut observer = ConsoleObserver::new(source_size, quiet);
    let result = test.copy_with(&mut copy, &mut observer);
    checksum_pb.finish_and_clear();
    observer.finish();

    let mut outcome = result.context("Copy test failed")?;
    println_if!(
        quiet,
        "  {} Baseline {} checksum: {}",
        style("✓").green(),
        outcome.baseline.checksum.algorithm,
        outcome.baseline.digest()
    );

    if let Some(e) = outcome.error.take() {
        return Err(e).context("Error during copy");
    }

    println_if!(
        quiet,
        "  {} Copied {} in {:.1}s ({})",
        style("✓").green(),
        format_size(outcome.bytes_copied),
        outcome.elapsed.as_secs_f64(),
        outcome.speed_display()
    );

    if !outcome.window_fired {
        println_if!(
            quiet,
            "  {} The crash window was never observed; the copy finished too quickly.",
            style("⚠").yellow()
        );
    }

    println_if!(quiet, "\n{}", style("File copy completed.").bold());
    println_if!(
        quiet,
        "If you shut down during the crash window, reboot and run:"
    );
    println_if!(
        quiet,
        "  {}",
        style(verify_command(config, args.dir_hint.as_deref())).cyan()
    );

    Ok(())
}

/// The command line that verifies this test after the restart
fn verify_command(config: &TestConfig, dir: Option<&Path>) -> String {
    let mut command = format!(
        "powercut --type {} --size {} --verify",
        config.filesystem, config.size_gb
    );
    if let Some(dir) = dir {
        command.push_str(&format!(" --dir {}", dir.display()));
    }
    command
}
