//! # meshback
//!
//! Tiered backup creation and retention rotation for the meshtracking
//! deployment: snapshot a project tree into a gzipped tarball and keep each
//! retention tier's archive directory bounded to a fixed number of
//! artifacts.
//!
//! ## Overview
//!
//! One scheduled invocation per tier does three things in order: write one
//! archive named at the tier's timestamp granularity, evict the oldest
//! excess artifacts beyond the tier's keep count, and print a summary of
//! all tiers. Daily archives embed a full timestamp so manual re-runs
//! coexist; weekly, monthly, and yearly archives embed only the period, so
//! a re-run inside the same period overwrites the previous snapshot and the
//! tier naturally holds one artifact per period.
//!
//! ## Key invariants
//!
//! - After a successful rotation pass, a tier holds at most its keep count
//!   (daily 10, weekly/monthly/yearly 5 by default).
//! - Eviction is oldest-first by modification time, name as tie-break, so
//!   a repeated pass over unchanged state deletes nothing.
//! - A failed archive aborts the run before rotation: a broken backup can
//!   never cause older, still-valid backups to be deleted.
//! - Deletion failures are per-artifact and non-fatal; one stuck file never
//!   blocks freeing the rest, and the next scheduled run re-converges.
//!
//! ## Architecture
//!
//! - [`cli`]: Command-line interface definitions using clap
//! - [`commands`]: Implementation of the run/rotate/status subcommands
//! - [`config`]: Explicit run configuration (no ambient working-directory
//!   or wall-clock state; time is injected)
//! - [`error`]: Error types and handling with thiserror + miette
//! - [`archive`]: The `ArchiveWriter` capability and the tar+gzip writer
//! - [`rotate`]: Artifact listing, the eviction sort, and the rotation pass
//! - [`tier`]: Retention tiers, naming granularities, and keep defaults
//!
//! ## Library Usage
//!
//! While meshback is primarily a CLI tool, the core operations are exposed
//! for integration:
//!
//! ```no_run
//! use chrono::Local;
//! use meshback::commands;
//! use meshback::config::Config;
//! use meshback::tier::Tier;
//!
//! let config = Config::builder()
//!     .source_root("/srv/meshtracking")
//!     .backup_root("/srv/meshtracking/backups")
//!     .build();
//!
//! commands::run(&config, Tier::Daily, Local::now().naive_local(), 0)?;
//! # Ok::<(), meshback::error::BackupError>(())
//! ```
//!
//! ## Concurrency
//!
//! Single-threaded and synchronous per invocation. The scheduler is
//! expected to run at most one pass per tier directory at a time; the
//! rotator's listing is a point-in-time snapshot and tolerates an external
//! writer or deleter racing it.

pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod rotate;
pub mod tier;
