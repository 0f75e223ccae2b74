//! Configuration file management (`--show-config`, `--init-config`)

use anyhow::{Context, Result};
use console::style;
use powercut_core::Settings;
use std::path::PathBuf;

/// Arguments for the config action
pub struct ConfigArgs {
    /// Initialize a new configuration file with defaults
    pub init: bool,
    /// Show configuration in JSON format
    pub json: bool,
    /// Suppress output (for scripting)
    pub quiet: bool,
    /// Custom configuration file path (overrides default)
    pub config_file: Option<PathBuf>,
}

/// Execute the config action
pub fn execute(args: ConfigArgs) -> Result<()> {
    let config_path = args.config_file.clone().or_else(Settings::config_path);

    if args.init {
        return init_config(config_path, args.quiet);
    }

    show_config(config_path, args.json, args.quiet)
}

/// Initialize a new configuration file with default values
fn init_config(config_path: Option<PathBuf>, quiet: bool) -> Result<()> {
    let path = config_path.context("Could not determine configuration directory")?;

    if path.exists() {
        if !quiet {
            eprintln!(
                "{} Configuration file already exists at: {}",
                style("Warning:").yellow(),
                path.display()
            );
            eprintln!("Use a text editor to modify it, or delete it to re-initialize.");
        }
        return Ok(());
    }

    let saved_path = Settings::default()
        .save_to_path(Some(path))
        .context("Failed to save configuration file")?;

    if !quiet {
        println!(
            "{} Created configuration file at: {}",
            style("Success:").green(),
            saved_path.display()
        );
        println!();
        println!("You can edit this file to customize default settings.");
        println!("Example settings:");
        println!();
        println!("  [copy]");
        println!("  delay_ms = 500          # Slower copy, longer crash window");
        println!();
        println!("  [crash_window]");
        println!("  countdown_secs = 60     # More time to reach the power button");
        println!();
        println!("  [behavior]");
        println!("  skip_confirmation = false");
    }

    Ok(())
}

/// Show the current configuration
fn show_config(config_path: Option<PathBuf>, json: bool, quiet: bool) -> Result<()> {
    if quiet {
        return Ok(());
    }

    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let settings = Settings::load_from_path(config_path.clone());

    if json {
        let json_output = serde_json::to_string_pretty(&settings)
            .context("Failed to serialize settings to JSON")?;
        println!("{}", json_output);
        return Ok(());
    }

    println!("{}", style("Powercut Configuration").bold());
    println!();

    if let Some(path) = &config_path {
        if config_exists {
            println!("  {} {}", style("Config file:").dim(), path.display());
        } else {
            println!(
                "  {} {} {}",
                style("Config file:").dim(),
                path.display(),
                style("(not found, using defaults)").yellow()
            );
        }
    }
    println!();

    println!("{}", style("[copy]").cyan());
    println!("  block_size = \"{}\"", settings.copy.block_size);
    println!("  delay_ms = {}", settings.copy.delay_ms);
    println!("  poll_interval_ms = {}", settings.copy.poll_interval_ms);
    println!();

    println!("{}", style("[crash_window]").cyan());
    println!("  lower_percent = {}", settings.crash_window.lower_percent);
    println!("  upper_percent = {}", settings.crash_window.upper_percent);
    println!("  countdown_secs = {}", settings.crash_window.countdown_secs);
    println!();

    println!("{}", style("[generator]").cyan());
    println!("  chunk_size = \"{}\"", settings.generator.chunk_size);
    println!();

    println!("{}", style("[checksum]").cyan());
    println!("  algorithm = \"{}\"", settings.checksum.algorithm);
    println!("  block_size = \"{}\"", settings.checksum.block_size);
    println!();

    println!("{}", style("[paths]").cyan());
    println!("  results_dir = \"{}\"", settings.paths.results_dir);
    println!();

    println!("{}", style("[behavior]").cyan());
    println!(
        "  skip_confirmation = {}",
        settings.behavior.skip_confirmation
    );

    if !config_exists {
        println!();
        println!(
            "{}",
            style("Run 'powercut --init-config' to create a configuration file.").dim()
        );
    }

    Ok(())
}
