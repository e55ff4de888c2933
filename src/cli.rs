//! Command-line interface definitions for meshback.
//!
//! This module defines the CLI structure using clap, including all
//! subcommands and their arguments. The main entry point is the [`Cli`]
//! struct. Tier names are a closed `ValueEnum`, so an unrecognized tier is
//! rejected with a usage error before any filesystem side effect occurs.
//!
//! # Example
//!
//! ```no_run
//! use meshback::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_args();
//!
//! match cli.command() {
//!     Commands::Run { tier, .. } => println!("Backing up tier {tier}"),
//!     Commands::Rotate { tier, .. } => println!("Rotating tier {tier}"),
//!     Commands::Status => println!("Reporting status"),
//! }
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::{BackupError, Result};
use crate::tier::Tier;

/// Main command-line interface for meshback.
#[derive(Parser)]
#[command(
    name = "meshback",
    bin_name = "meshback",
    author,
    version,
    about = "Tiered backup creation and retention rotation",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    global_opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Global options that apply to all meshback commands.
///
/// These locate the source tree and the backup root, name the archives, and
/// control output verbosity. Every option has an environment fallback so a
/// cron entry can stay a one-liner.
#[derive(Parser)]
pub struct GlobalOpts {
    /// Project tree to snapshot (defaults to the current directory)
    #[arg(long, global = true, default_value = ".", env = "MESHBACK_SOURCE_DIR")]
    source_dir: PathBuf,

    /// Root directory for the per-tier archive directories
    #[arg(
        long,
        global = true,
        default_value = "backups",
        env = "MESHBACK_BACKUP_DIR"
    )]
    backup_dir: PathBuf,

    /// Leading component of every archive file name
    #[arg(
        long,
        global = true,
        default_value = "meshtracking",
        env = "MESHBACK_PREFIX"
    )]
    prefix: String,

    /// Additional glob patterns to exclude (on top of the built-in set)
    #[arg(
        long = "exclude",
        global = true,
        value_delimiter = ',',
        env = "MESHBACK_EXCLUDE"
    )]
    exclude: Vec<String>,

    /// Enable verbose output (use multiple times for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, env = "MESHBACK_VERBOSE")]
    verbose: u8,

    /// Silence all output except for errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        env = "MESHBACK_QUIET"
    )]
    quiet: bool,
}

impl GlobalOpts {
    /// Create a new builder for constructing `GlobalOpts` programmatically.
    pub fn builder() -> GlobalOptsBuilder {
        GlobalOptsBuilder::default()
    }

    /// Get the source directory
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Get the backup root directory
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Get the archive name prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the extra exclusion patterns
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Get the verbose level
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

/// Builder for constructing `GlobalOpts` without command-line parsing.
///
/// Useful for testing and programmatic usage.
#[derive(Default)]
pub struct GlobalOptsBuilder {
    source_dir: Option<PathBuf>,
    backup_dir: Option<PathBuf>,
    prefix: Option<String>,
    exclude: Vec<String>,
    verbose: u8,
    quiet: bool,
}

impl GlobalOptsBuilder {
    /// Set the source directory.
    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    /// Set the backup root directory.
    pub fn backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    /// Set the archive name prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Add an extra exclusion pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Set the verbosity level (0 = normal, 1+ = verbose).
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable or disable quiet mode.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build the `GlobalOpts` instance with the configured values.
    pub fn build(self) -> GlobalOpts {
        GlobalOpts {
            source_dir: self.source_dir.unwrap_or_else(|| PathBuf::from(".")),
            backup_dir: self.backup_dir.unwrap_or_else(|| PathBuf::from("backups")),
            prefix: self.prefix.unwrap_or_else(|| String::from("meshtracking")),
            exclude: self.exclude,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

impl Cli {
    /// Get the global options
    pub fn global_opts(&self) -> &GlobalOpts {
        &self.global_opts
    }

    /// Get the command
    pub fn command(&self) -> &Commands {
        &self.command
    }

    /// Create a builder for programmatic construction
    pub fn builder() -> CliBuilder {
        CliBuilder::default()
    }

    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Builder for [`Cli`]
#[derive(Default)]
pub struct CliBuilder {
    source_dir: Option<PathBuf>,
    backup_dir: Option<PathBuf>,
    prefix: Option<String>,
    exclude: Vec<String>,
    verbose: u8,
    quiet: bool,
    command: Option<Commands>,
}

impl CliBuilder {
    /// Set the source directory
    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    /// Set the backup root directory
    pub fn backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    /// Set the archive name prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Add an extra exclusion pattern
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Set the verbose level
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable quiet mode
    pub fn quiet(mut self, enabled: bool) -> Self {
        self.quiet = enabled;
        self
    }

    /// Set the command
    pub fn command(mut self, command: Commands) -> Self {
        self.command = Some(command);
        self
    }

    /// Build the Cli instance
    pub fn build(self) -> Result<Cli> {
        let command = self
            .command
            .ok_or_else(|| BackupError::ConfigError("Command is required".to_string()))?;

        let mut global = GlobalOpts::builder()
            .verbose(self.verbose)
            .quiet(self.quiet);
        if let Some(dir) = self.source_dir {
            global = global.source_dir(dir);
        }
        if let Some(dir) = self.backup_dir {
            global = global.backup_dir(dir);
        }
        if let Some(prefix) = self.prefix {
            global = global.prefix(prefix);
        }
        for pattern in self.exclude {
            global = global.exclude(pattern);
        }

        Ok(Cli {
            global_opts: global.build(),
            command,
        })
    }
}

/// Available meshback subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a backup for one tier, then rotate that tier
    ///
    /// This is the scheduled entry point: it writes one archive named at
    /// the tier's timestamp granularity, enforces the tier's keep count on
    /// the archive directory, and prints the per-tier status summary.
    ///
    /// A failed archive aborts the run with a nonzero exit before any
    /// rotation happens. Individual deletion failures during rotation are
    /// logged and do not affect the exit code.
    Run {
        /// Retention tier to back up
        #[arg(value_enum)]
        tier: Tier,

        /// Override the tier's keep count for this run
        #[arg(long, env = "MESHBACK_KEEP")]
        keep: Option<usize>,

        /// Abort archive creation after this many seconds
        #[arg(long, env = "MESHBACK_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,

        /// Show what rotation would delete without actually deleting
        #[arg(long, env = "MESHBACK_DRY_RUN")]
        dry_run: bool,
    },

    /// Rotate one tier without creating a new backup
    ///
    /// Lists the tier's archive directory, and if it holds more artifacts
    /// than the keep count, deletes exactly the oldest excess. Running it
    /// twice in a row is a no-op the second time.
    Rotate {
        /// Retention tier to rotate
        #[arg(value_enum)]
        tier: Tier,

        /// Override the tier's keep count
        #[arg(long, env = "MESHBACK_KEEP")]
        keep: Option<usize>,

        /// Show what would be deleted without actually deleting
        #[arg(long, env = "MESHBACK_DRY_RUN")]
        dry_run: bool,
    },

    /// Report artifact counts against keep limits for all tiers
    Status,
}
