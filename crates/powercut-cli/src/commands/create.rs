//! Create action - generates the source artifact

use anyhow::{Context, Result};
use console::style;
use powercut_core::{CrashTest, GenerateOutcome};

use super::{format_size, Output};
use crate::progress::create_progress_bar;

/// Execute the create action
pub fn execute(test: &CrashTest, output: Output) -> Result<()> {
    let quiet = output.quiet;
    let config = test.config();
    let layout = test.layout();

    println_if!(
        quiet,
        "{} {}",
        style("Journaling test for").bold(),
        style(&config.filesystem).cyan()
    );
    println_if!(quiet, "  Using file size: {}GB", config.size_gb);
    println_if!(quiet, "  Source directory: {}", layout.source_dir.display());
    println_if!(
        quiet,
        "  Destination directory: {}",
        layout.destination_dir.display()
    );
    println_if!(quiet, "  Source file: {}", layout.source_file.display());
    println_if!(quiet, "\n{} {}GB file...", style("Creating").bold(), config.size_gb);

    let pb = create_progress_bar(config.size_bytes(), "Writing", quiet);
    let pb_clone = pb.clone();
    let generator = test
        .file_generator()
        .context("Invalid generator settings")?
        .on_progress(move |p| {
            pb_clone.set_position(p.bytes_written);
        });

    let result = test.create_with(&generator);
    pb.finish_and_clear();

    match result.context("Error creating file")? {
        GenerateOutcome::Created { bytes, elapsed } => {
            println_if!(
                quiet,
                "  {} File created successfully: {}",
                style("✓").green(),
                layout.source_file.display()
            );
            println_if!(
                quiet,
                "    Wrote {} in {:.1}s",
                format_size(bytes),
                elapsed.as_secs_f64()
            );
        }
        GenerateOutcome::AlreadyPresent => {
            println_if!(
                quiet,
                "  {} File already exists with correct size ({}GB)",
                style("ℹ").blue(),
                config.size_gb
            );
        }
    }

    Ok(())
}
