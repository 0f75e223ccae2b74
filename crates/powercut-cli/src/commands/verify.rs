//! Verify action - checks the artifacts after the restart and saves a report

use anyhow::{bail, Context, Result};
use console::style;
use powercut_core::{ArtifactCheck, CrashTest, Error, Rating, TestResult};
use std::path::Path;

use super::{format_bytes_exact, Output};
use crate::progress::{banner, create_progress_bar, rule};

/// Execute the verify action
pub fn execute(test: &CrashTest, output: Output) -> Result<()> {
    let quiet = output.quiet || output.json;

    if !quiet {
        println!("\n{}", rule());
        println!("{}", style(banner("VERIFYING FILES AFTER CRASH")).bold());
        println!("{}\n", rule());
    }

    let pb = create_progress_bar(0, "Checksumming", quiet);
    let pb_clone = pb.clone();
    let verifier = test
        .verifier()
        .context("Invalid checksum settings")?
        .on_progress(move |_role, p| {
            if let Some(total) = p.total_bytes {
                pb_clone.set_length(total);
            }
            pb_clone.set_position(p.bytes_processed);
        });

    let result = test.verify_with(&verifier);
    pb.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(Error::NoBaseline(path)) => bail!(
            "Checksum file not found at {}. Must run --create and --test first.",
            path.display()
        ),
        Err(Error::UnusableBaseline { path, reason }) => bail!(
            "Checksum file at {} is unusable ({}). Run --test again before the crash.",
            path.display(),
            reason
        ),
        Err(Error::StateNotFound(reason)) => {
            bail!("Neither source nor destination file exists: {}", reason)
        }
        Err(e) => return Err(e).context("Verification failed"),
    };

    let report_path = test
        .save_report(&result.report)
        .context("Failed to save results")?;

    if output.json {
        let mut value =
            serde_json::to_value(&result.report).context("Failed to serialize results")?;
        value["report_path"] = serde_json::json!(report_path);
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if output.quiet {
        println!("{}", result.verdict.rating);
        return Ok(());
    }

    print_details(&result);
    print_verdict(&result, &report_path);
    Ok(())
}

fn print_details(result: &TestResult) {
    let outcome = &result.outcome;

    if outcome.recovered {
        println!(
            "{} Auto-detected file size: {}GB",
            style("ℹ").blue(),
            outcome.layout.size_gb
        );
        println!();
    }

    println!("Checking source file integrity...");
    match &outcome.source {
        check if check.intact => {
            println!("{} Source file is completely intact!", style("✓").green())
        }
        check if check.exists() => println!(
            "{} Source file exists but is corrupted!",
            style("✗").red()
        ),
        _ => println!("{} Source file does not exist!", style("✗").red()),
    }

    println!("\nChecking destination file integrity...");
    match &outcome.destination {
        check if check.intact => println!(
            "{} Destination file is completely intact!",
            style("✓").green()
        ),
        ArtifactCheck {
            size: Some(dest_size),
            ..
        } => {
            println!(
                "{} Destination file exists but is incomplete or corrupted!",
                style("✗").red()
            );
            println!("  Destination size: {} bytes", format_bytes_exact(*dest_size));
            if let Some(source_size) = outcome.source.size {
                println!("  Source size: {} bytes", format_bytes_exact(source_size));
            }
            if let Some(pct) = outcome.completion_percentage() {
                println!("  Completion: {:.1}%", pct);
            }
        }
        _ => println!("{} Destination file does not exist!", style("✗").red()),
    }
}

fn print_verdict(result: &TestResult, report_path: &Path) {
    let verdict = &result.verdict;
    let title = banner(&format!("Journaling Assessment: {}", verdict.rating));
    let title = match verdict.rating {
        Rating::Excellent => style(title).green().bold(),
        Rating::Good => style(title).cyan().bold(),
        Rating::Poor => style(title).red().bold(),
        Rating::Undefined => style(title).yellow().bold(),
    };

    println!("\n{}", rule());
    println!("{}", title);
    println!("{}", rule());
    println!("\n{}\n", verdict.rationale);
    println!("{}", result.report.summary());
    println!(
        "\n{} Results saved to: {}",
        style("✓").green(),
        report_path.display()
    );
}
