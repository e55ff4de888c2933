//! Implementation of meshback subcommands.
//!
//! The main entry point is [`execute`], which dispatches parsed CLI
//! arguments to the appropriate handler. All handlers take the current time
//! as a parameter instead of reading the wall clock, so [`execute_at`]
//! exists for tests that need a pinned timestamp.
//!
//! Control flow for a scheduled run: [`create_backup`] writes one archive
//! for the selected tier, [`rotate`](crate::rotate::rotate) enforces the
//! tier's keep count, and [`status`] summarizes all four tiers. An archive
//! failure aborts before rotation; deletion failures are logged per artifact
//! and never change the exit code.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::archive::{TarGzWriter, create_backup};
use crate::cli::{Cli, Commands};
use crate::config::{Config, ConfigBuilder, RetentionPolicy};
use crate::error::Result;
use crate::logging::Logger;
use crate::rotate::{self, RotationReport, list_artifacts};
use crate::tier::{ALL_TIERS, Tier};

/// Create a backup for `tier`, rotate that tier, and print the summary.
///
/// The scheduler's entry point: exactly one archive is written, named at
/// the tier's timestamp granularity from `now`. If archiving fails the
/// error propagates and no rotation happens for this run, so older valid
/// backups survive a broken pipeline.
pub fn run(config: &Config, tier: Tier, now: NaiveDateTime, verbose: u8) -> Result<()> {
    let log = Logger::new(verbose, config.quiet());

    let artifact = create_backup(config, TarGzWriter::new(), tier, now, log)?;
    log.info(format!(
        "Created {} ({})",
        artifact.path.display(),
        format_size(artifact.size_bytes)
    ));

    let report = rotate_tier(config, tier, None, verbose)?;
    log_rotation(&report, tier, config.dry_run(), log);

    status(config, verbose)
}

/// Enforce the keep count over one tier directory.
///
/// `keep_override` replaces the configured policy for this pass only.
pub fn rotate_tier(
    config: &Config,
    tier: Tier,
    keep_override: Option<usize>,
    verbose: u8,
) -> Result<RotationReport> {
    let log = Logger::new(verbose, config.quiet());
    let keep = keep_override.unwrap_or_else(|| config.retention().keep(tier));

    rotate::rotate(tier, &config.tier_dir(tier), keep, config.dry_run(), log)
}

/// Print artifact counts against keep limits for all four tiers.
pub fn status(config: &Config, verbose: u8) -> Result<()> {
    let log = Logger::new(verbose, config.quiet());

    log.info(format!("Backup status for {}:", config.backup_root().display()));
    for tier in ALL_TIERS {
        let artifacts = list_artifacts(tier, &config.tier_dir(tier))?;
        let total: u64 = artifacts.iter().map(|a| a.size_bytes).sum();
        log.info(format!(
            "  {:<8} {:>2}/{} ({})",
            tier,
            artifacts.len(),
            config.retention().keep(tier),
            format_size(total)
        ));
    }

    Ok(())
}

fn log_rotation(report: &RotationReport, tier: Tier, dry_run: bool, log: Logger) {
    if report.deleted_count() > 0 {
        let verb = if dry_run { "Would rotate out" } else { "Rotated out" };
        log.info(format!(
            "{verb} {} old {tier} artifact(s), freeing {}",
            report.deleted_count(),
            format_size(report.bytes_freed)
        ));
    }
    if !report.failed.is_empty() {
        log.warn(format!(
            "{} {tier} artifact(s) could not be deleted; will retry next run",
            report.failed.len()
        ));
    }
}

/// Render a byte count with a binary-unit suffix
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Execute the parsed command with the current local time.
pub fn execute(cli: &Cli) -> Result<()> {
    execute_at(cli, Local::now().naive_local())
}

/// Execute the parsed command with an explicit "now".
///
/// This is the injection point for the clock: archive names derive from
/// `now`, never from the wall clock inside the library.
pub fn execute_at(cli: &Cli, now: NaiveDateTime) -> Result<()> {
    let verbose = if cli.global_opts().quiet() {
        0
    } else {
        cli.global_opts().verbose()
    };

    match cli.command() {
        Commands::Run {
            tier,
            keep,
            timeout_secs,
            dry_run,
        } => {
            let mut retention = RetentionPolicy::default();
            if let Some(keep) = keep {
                retention.set_keep(*tier, *keep);
            }

            let mut builder = config_builder(cli, *dry_run).retention(retention);
            if let Some(secs) = timeout_secs {
                builder = builder.timeout(Duration::from_secs(*secs));
            }

            run(&builder.build(), *tier, now, verbose)
        }
        Commands::Rotate {
            tier,
            keep,
            dry_run,
        } => {
            let config = build_config(cli, *dry_run);
            let log = Logger::new(verbose, config.quiet());
            let report = rotate_tier(&config, *tier, *keep, verbose)?;
            log_rotation(&report, *tier, *dry_run, log);
            if report.deleted_count() == 0 && report.failed.is_empty() {
                log.info(format!("{tier}: nothing to rotate"));
            }
            Ok(())
        }
        Commands::Status => {
            let config = build_config(cli, false);
            status(&config, verbose)
        }
    }
}

fn config_builder(cli: &Cli, dry_run: bool) -> ConfigBuilder {
    Config::builder()
        .source_root(cli.global_opts().source_dir())
        .backup_root(cli.global_opts().backup_dir())
        .prefix(cli.global_opts().prefix())
        .excludes(cli.global_opts().exclude().iter().cloned())
        .dry_run(dry_run)
        .quiet(cli.global_opts().quiet())
}

fn build_config(cli: &Cli, dry_run: bool) -> Config {
    config_builder(cli, dry_run).build()
}
