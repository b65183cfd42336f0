//! # eCFR Pipeline CLI (`ecfr`)
//!
//! The `ecfr` binary drives the bulk ingestion pipeline: downloading eCFR
//! bulk XML, parsing and measuring it, and inspecting the persisted
//! results.
//!
//! ## Usage
//!
//! ```bash
//! ecfr --config ./config/ecfr.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ecfr fetch` | Download bulk XML for titles (cache-aware, no parsing) |
//! | `ecfr process` | Full pipeline: fetch, parse, compute, persist, aggregate |
//! | `ecfr show <title>` | Print one persisted title record |
//! | `ecfr summary` | Print the cross-title summary |
//!
//! ## Examples
//!
//! ```bash
//! # Process every CFR title with 5 parallel workers
//! ecfr process --workers 5
//!
//! # Reprocess titles 7 and 40, bypassing the XML cache
//! ecfr process --titles 7,40 --force
//!
//! # Download XML for title 21 without processing it
//! ecfr fetch --titles 21
//!
//! # Inspect results
//! ecfr show 7
//! ecfr summary
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use ecfr_pipeline::config;
use ecfr_pipeline::display;
use ecfr_pipeline::fetch;
use ecfr_pipeline::pipeline;
use ecfr_pipeline::progress::ProgressMode;
use ecfr_pipeline::titles;

/// eCFR bulk ingestion and text-metrics pipeline.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; a missing file falls back to built-in defaults.
#[derive(Parser)]
#[command(
    name = "ecfr",
    about = "eCFR bulk XML ingestion and text-metrics pipeline",
    version,
    long_about = "Downloads Electronic Code of Federal Regulations bulk XML from GovInfo, \
    parses the regulatory hierarchy (titles, chapters, sections, paragraphs), computes word \
    counts and readability metrics, and persists per-title JSON records plus a cross-title summary."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ecfr.toml`. Storage, fetch, and pipeline
    /// settings are read from this file.
    #[arg(long, global = true, default_value = "./config/ecfr.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Download bulk XML for one or more titles without processing.
    ///
    /// Titles already present in the XML cache are skipped unless
    /// `--force` is given. Downloads run sequentially with the
    /// configured inter-request delay.
    Fetch {
        /// Comma-separated title numbers (e.g. `7,21,40`). Defaults to all 50.
        #[arg(long)]
        titles: Option<String>,

        /// Re-download even when a cached XML file exists.
        #[arg(long)]
        force: bool,
    },

    /// Run the full pipeline: fetch, parse, compute metrics, persist,
    /// and aggregate a summary.
    ///
    /// Each title runs in its own worker; a failure in one title never
    /// stops the others. The summary is rebuilt from every persisted
    /// title after the batch completes.
    Process {
        /// Comma-separated title numbers (e.g. `7,21,40`). Defaults to all 50.
        #[arg(long)]
        titles: Option<String>,

        /// Maximum titles in flight at once. Overrides the config value.
        #[arg(long)]
        workers: Option<usize>,

        /// Re-download XML even when a cached file exists.
        #[arg(long)]
        force: bool,

        /// Progress reporting on stderr: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a terminal.
        #[arg(long)]
        progress: Option<String>,
    },

    /// Print one persisted title record.
    Show {
        /// Title number (1-50).
        title: u32,
    },

    /// Print the cross-title summary.
    Summary,
}

/// Parse `--titles 7,21,40` into validated title numbers; `None` means
/// every known title.
fn parse_titles(list: Option<&str>) -> Result<Vec<u32>> {
    let Some(list) = list else {
        return Ok(titles::all_title_numbers());
    };

    let mut nums = Vec::new();
    for part in list.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let n: u32 = part
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid title number: {}", part))?;
        if titles::title_name(n).is_none() {
            bail!("Unknown title number: {} (valid range is 1-50)", n);
        }
        if !nums.contains(&n) {
            nums.push(n);
        }
    }
    if nums.is_empty() {
        bail!("No title numbers given");
    }
    Ok(nums)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Fetch { titles, force } => {
            let nums = parse_titles(titles.as_deref())?;
            let client = fetch::build_client(&cfg.fetch)?;
            let xml_dir = cfg.xml_dir();

            let mut failures = 0usize;
            for &n in &nums {
                match fetch::fetch_title(&client, &cfg.fetch, &xml_dir, n, force).await {
                    Ok(fetched) if fetched.cached => {
                        println!("Title {:>2}: cached ({})", n, fetched.path.display());
                    }
                    Ok(fetched) => {
                        println!(
                            "Title {:>2}: downloaded {} bytes to {}",
                            n,
                            fetched.bytes,
                            fetched.path.display()
                        );
                    }
                    Err(e) => {
                        eprintln!("Warning: {}", e);
                        failures += 1;
                    }
                }
            }

            println!(
                "Fetched {} of {} titles ({} failed)",
                nums.len() - failures,
                nums.len(),
                failures
            );
            if failures == nums.len() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Process {
            titles,
            workers,
            force,
            progress,
        } => {
            let nums = parse_titles(titles.as_deref())?;
            let max_workers = workers.unwrap_or(cfg.pipeline.max_workers);
            if max_workers == 0 {
                bail!("--workers must be > 0");
            }

            let mode = match progress.as_deref() {
                Some(s) => ProgressMode::parse(s)
                    .ok_or_else(|| anyhow::anyhow!("Invalid progress mode: {} (expected off, human, or json)", s))?,
                None => ProgressMode::default_for_tty(),
            };

            let report =
                pipeline::run_batch(&cfg, &nums, max_workers, force, mode.reporter()).await?;

            println!(
                "Processed {} of {} titles ({} failed)",
                report.succeeded(),
                report.outcomes.len(),
                report.failed()
            );
            if let Some(summary) = &report.summary {
                println!(
                    "Summary: {} titles, {} words total",
                    summary.total_titles, summary.total_metrics.word_count
                );
            }

            if report.succeeded() == 0 {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Show { title } => {
            display::show_title(&cfg.processed_dir(), title)?;
        }

        Commands::Summary => {
            display::show_summary(&cfg.processed_dir())?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
