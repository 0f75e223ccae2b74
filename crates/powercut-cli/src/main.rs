//! Powercut - real-world filesystem journaling crash test
//!
//! # Usage
//!
//! ```bash
//! # Create a 2GB test file for NTFS
//! powercut --type NTFS --size 2 --create
//!
//! # Run the crash test (cut the power when told to)
//! powercut --type NTFS --size 2 --test
//!
//! # Verify results after the restart
//! powercut --type NTFS --size 2 --verify
//! ```

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser};
use console::style;
use powercut_core::{CrashTest, Settings, TestConfig, DEFAULT_SIZE_GB};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod progress;

const EXAMPLES: &str = "\
Examples:
  # Create a 2GB test file for NTFS
  powercut --type NTFS --size 2 --create

  # Run the crash test
  powercut --type NTFS --size 2 --test

  # Verify results after reboot
  powercut --type NTFS --size 2 --verify

  # Run test at full speed (harder to time shutdown)
  powercut --type NTFS --size 2 --test --no-delay";

/// Real-world filesystem journaling test
#[derive(Parser)]
#[command(name = "powercut")]
#[command(author, version, about, long_about = None)]
#[command(after_help = EXAMPLES)]
struct Cli {
    /// Filesystem type (e.g., NTFS, ext4, XFS)
    #[arg(
        long = "type",
        value_name = "FS",
        required_unless_present_any = ["show_config", "init_config"]
    )]
    filesystem: Option<String>,

    /// File size in GB
    #[arg(long, value_name = "GB", default_value_t = DEFAULT_SIZE_GB)]
    size: u64,

    /// Create large test file
    #[arg(long)]
    create: bool,

    /// Start copy test (will prompt for crash)
    #[arg(long)]
    test: bool,

    /// Verify results after crash
    #[arg(long)]
    verify: bool,

    /// Run copy at normal speed without artificial slowdown
    #[arg(long)]
    no_delay: bool,

    /// Directory holding the test files (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Configuration file (overrides the default location)
    #[arg(long, value_name = "FILE", env = "POWERCUT_CONFIG")]
    config: Option<PathBuf>,

    /// Start the copy without waiting for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Print verification results as JSON
    #[arg(long)]
    json: bool,

    /// Show the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress progress bars and informational output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    // Set up panic handler for nicer error messages
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("{} {}", style("Error:").red().bold(), panic_info);
    }));

    if let Err(e) = run() {
        // {:#} prints the whole context chain on one line
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::new("info")
    };

    // stdout is reserved for results (--json)
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if cli.show_config || cli.init_config {
        return commands::config::execute(commands::config::ConfigArgs {
            init: cli.init_config,
            json: cli.json,
            quiet: cli.quiet,
            config_file: cli.config,
        });
    }

    if cli.size < 1 {
        bail!("File size must be at least 1GB");
    }

    if !(cli.create || cli.test || cli.verify) {
        Cli::command().print_help()?;
        bail!("Please specify an action: --create, --test, or --verify");
    }

    // clap enforces --type whenever no config flag is given
    let Some(filesystem) = cli.filesystem else {
        bail!("--type is required");
    };

    let settings = Settings::load_from_path(cli.config.clone().or_else(Settings::config_path));
    let base_dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    let config = TestConfig::new(filesystem)
        .size_gb(cli.size)
        .base_dir(&base_dir)
        .results_dir(settings.paths.results_dir.clone())
        .use_delay(!cli.no_delay);
    let skip_confirm = cli.yes || settings.behavior.skip_confirmation;
    let test = CrashTest::with_settings(config, settings);

    let output = commands::Output {
        quiet: cli.quiet,
        json: cli.json,
    };

    if cli.create {
        commands::create::execute(&test, output)?;
    }

    if cli.test {
        commands::copy::execute(
            &test,
            commands::copy::CopyArgs {
                skip_confirm,
                dir_hint: cli.dir,
            },
            output,
        )?;
    }

    if cli.verify {
        commands::verify::execute(&test, output)?;
    }

    Ok(())
}
