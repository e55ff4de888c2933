//! Error types for meshback.
//!
//! All fatal errors derive from [`BackupError`], defined with `thiserror` and
//! enriched with `miette` diagnostic codes for CLI output.
//!
//! # Error Handling Strategy
//!
//! - Archive-class errors (`SourceMissing`, `ArchiveFailed`, `ArchiveTimeout`,
//!   `EmptyArchive`) are fatal to a run: they abort before any rotation so a
//!   failed backup can never trigger deletion of older, still-valid backups.
//! - Per-artifact deletion failures are deliberately *not* represented here.
//!   They are collected in [`crate::rotate::RotationReport`] and logged,
//!   because one stuck file must never block freeing the rest.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error types that can occur in meshback operations
#[derive(Error, Debug, Diagnostic)]
pub enum BackupError {
    /// Unrecognized retention tier name.
    ///
    /// The only input-validation failure of the subsystem. Raised before any
    /// filesystem side effect occurs.
    #[error("Unknown tier '{0}'")]
    #[diagnostic(
        code(meshback::tier::invalid),
        help("Valid tiers are: daily, weekly, monthly, yearly.")
    )]
    InvalidTier(
        /// The tier name that failed to parse
        String,
    ),

    /// The configured source root does not exist or is not a directory.
    ///
    /// Treated as an archive failure: the run aborts and rotation for the
    /// tier is skipped entirely.
    #[error("Source directory '{0}' does not exist or is not a directory")]
    #[diagnostic(
        code(meshback::archive::source_missing),
        help("Check the --source-dir argument (or MESHBACK_SOURCE_DIR).")
    )]
    SourceMissing(
        /// The missing source root
        PathBuf,
    ),

    /// The underlying tar/gzip writer reported a failure.
    ///
    /// The partial archive, if any, is left on disk for manual inspection
    /// rather than deleted automatically; it is never counted as a valid
    /// artifact because rotation does not run after this error.
    #[error("Failed to write archive '{path}'")]
    #[diagnostic(
        code(meshback::archive::write_failed),
        help("A partial file may remain at the destination; it is safe to remove by hand.")
    )]
    ArchiveFailed {
        /// Destination path of the archive being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Archive creation exceeded the configured time bound.
    ///
    /// Without a bound a hung writer blocks the whole run; when a timeout is
    /// configured, expiry is reported as an archive failure and rotation is
    /// skipped.
    #[error("Archive '{path}' not finished after {secs}s")]
    #[diagnostic(
        code(meshback::archive::timeout),
        help("Raise --timeout-secs or investigate why the source tree is slow to read.")
    )]
    ArchiveTimeout {
        /// Destination path of the archive being written
        path: PathBuf,
        /// The configured bound in seconds
        secs: u64,
    },

    /// The archiver completed but produced a zero-byte file.
    ///
    /// A zero-byte tarball is corrupt by definition and must not be counted
    /// toward the tier's retention.
    #[error("Archive '{0}' is empty")]
    #[diagnostic(
        code(meshback::archive::empty),
        help("The source tree may be unreadable, or the disk may be full.")
    )]
    EmptyArchive(
        /// Path of the empty archive
        PathBuf,
    ),

    /// File system I/O error during meshback operations.
    ///
    /// Used for directory creation, listing, and metadata access. Deletion
    /// of individual artifacts does not use this variant; those failures are
    /// per-artifact and non-fatal.
    #[error("I/O error accessing '{path}'")]
    #[diagnostic(code(meshback::io_error))]
    IoError {
        /// The path that caused the I/O error
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An exclusion pattern is not a valid glob.
    #[error("Invalid exclude pattern '{pattern}'")]
    #[diagnostic(
        code(meshback::config::invalid_pattern),
        help("Exclude patterns use glob syntax, e.g. '*.log' or '__pycache__'.")
    )]
    InvalidPattern {
        /// The pattern that failed to compile
        pattern: String,
        /// The underlying glob error
        #[source]
        source: glob::PatternError,
    },

    /// Required configuration is missing or inconsistent.
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(meshback::config::error),
        help("Check the required configuration parameters.")
    )]
    ConfigError(
        /// Description of the configuration error
        String,
    ),
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, BackupError>;
