//! Snapshot creation: walking the source tree into a gzipped tarball.
//!
//! The archive step is abstracted behind [`ArchiveWriter`] with a single
//! `write` method, so the production tar+gzip implementation and test stubs
//! are interchangeable. [`create_backup`] is the operation the scheduler
//! drives: it validates inputs, creates the tier directory on demand, writes
//! exactly one archive named for the tier's timestamp granularity, and
//! measures the result. A failure here must propagate before any rotation
//! runs, so a broken backup can never evict older, still-valid snapshots.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use flate2::Compression;
use flate2::write::GzEncoder;
use glob::Pattern;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{BackupError, Result};
use crate::logging::Logger;
use crate::rotate::BackupArtifact;
use crate::tier::Tier;

/// Compiled exclusion rules applied while walking the source tree.
///
/// Two kinds of rule: glob patterns matched against every component of an
/// entry's root-relative path (so `__pycache__` prunes the directory anywhere
/// in the tree and `*.pyc` drops individual files), and absolute path
/// prefixes that are skipped outright. The backup root always lands in the
/// prefix list so an archive can never include the directory it is being
/// written into.
#[derive(Clone, Debug)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
    skip_paths: Vec<PathBuf>,
}

impl ExcludeSet {
    /// Compile glob patterns and absolute skip prefixes.
    pub fn compile(patterns: &[String], skip_paths: Vec<PathBuf>) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| BackupError::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            skip_paths,
        })
    }

    /// Whether an entry should be omitted from the archive.
    ///
    /// `abs` is the entry's on-disk path, `rel` its path relative to the
    /// walk root. Matching a directory prunes its whole subtree.
    pub fn is_excluded(&self, abs: &Path, rel: &Path) -> bool {
        if self.skip_paths.iter().any(|skip| abs.starts_with(skip)) {
            return true;
        }

        rel.components().any(|component| {
            let name = component.as_os_str().to_string_lossy();
            self.patterns.iter().any(|pattern| pattern.matches(&name))
        })
    }
}

/// Capability interface over "archive a directory tree with exclusions".
pub trait ArchiveWriter {
    /// Write a compressed archive of `root` to `dest`, returning the number
    /// of bytes written.
    fn write(&self, root: &Path, excludes: &ExcludeSet, dest: &Path) -> Result<u64>;
}

/// Production [`ArchiveWriter`]: tar over gzip, via walkdir.
#[derive(Clone, Copy, Debug, Default)]
pub struct TarGzWriter;

impl TarGzWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveWriter for TarGzWriter {
    fn write(&self, root: &Path, excludes: &ExcludeSet, dest: &Path) -> Result<u64> {
        let archive_failed = |source: io::Error| BackupError::ArchiveFailed {
            path: dest.to_path_buf(),
            source,
        };

        // Overwrites an existing archive of the same name, giving the
        // period-granular tiers their one-snapshot-per-period semantics.
        let file = File::create(dest).map_err(archive_failed)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);

        let walker = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| {
                let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
                !excludes.is_excluded(entry.path(), rel)
            });

        for entry in walker {
            let entry = entry.map_err(|source| archive_failed(io::Error::other(source)))?;
            let rel = entry
                .path()
                .strip_prefix(root)
                .map_err(|source| archive_failed(io::Error::other(source)))?;

            if entry.file_type().is_dir() {
                builder.append_dir(rel, entry.path()).map_err(archive_failed)?;
            } else {
                // Regular files and symlinks; the builder stores symlinks as
                // link entries because follow_symlinks is off.
                builder
                    .append_path_with_name(entry.path(), rel)
                    .map_err(archive_failed)?;
            }
        }

        let encoder = builder.into_inner().map_err(archive_failed)?;
        let file = encoder.finish().map_err(archive_failed)?;
        file.sync_all().map_err(archive_failed)?;

        let metadata = fs::metadata(dest).map_err(archive_failed)?;
        Ok(metadata.len())
    }
}

/// Create one snapshot of the configured source tree for `tier`.
///
/// The archive lands at `<backup_root>/<tier>/<prefix>_<tier>_<stamp>.tar.gz`
/// with the stamp rendered at the tier's granularity from the injected
/// `now`. A same-name collision overwrites silently. On failure a partial
/// file may remain for manual inspection; it is never deleted automatically
/// and never counted against retention, because the caller skips rotation
/// when this returns an error.
pub fn create_backup<W>(
    config: &Config,
    writer: W,
    tier: Tier,
    now: NaiveDateTime,
    log: Logger,
) -> Result<BackupArtifact>
where
    W: ArchiveWriter + Send + 'static,
{
    let source_root = config.source_root();
    if !source_root.is_dir() {
        return Err(BackupError::SourceMissing(source_root.to_path_buf()));
    }

    let tier_dir = config.tier_dir(tier);
    fs::create_dir_all(&tier_dir).map_err(|source| BackupError::IoError {
        path: tier_dir.clone(),
        source,
    })?;

    // Canonicalize both roots so the backup-root prefix check holds even
    // when the backup directory lives inside the source tree.
    let source_root = fs::canonicalize(source_root).map_err(|source| BackupError::IoError {
        path: config.source_root().to_path_buf(),
        source,
    })?;
    let backup_root =
        fs::canonicalize(config.backup_root()).map_err(|source| BackupError::IoError {
            path: config.backup_root().to_path_buf(),
            source,
        })?;

    let name = tier.archive_file_name(config.prefix(), now);
    let dest = tier_dir.join(&name);
    let excludes = ExcludeSet::compile(config.exclude_patterns(), vec![backup_root])?;

    if dest.exists() {
        log.verbose(
            1,
            format!("Replacing existing snapshot {}", dest.display()),
        );
    }
    log.verbose(1, format!("Archiving {} -> {}", source_root.display(), dest.display()));

    let size_bytes = write_archive(writer, source_root, excludes, dest.clone(), config.timeout())?;
    if size_bytes == 0 {
        return Err(BackupError::EmptyArchive(dest));
    }

    let created_at = fs::metadata(&dest)
        .and_then(|m| m.modified())
        .map_err(|source| BackupError::IoError {
            path: dest.clone(),
            source,
        })?;

    Ok(BackupArtifact {
        tier,
        name,
        path: dest,
        created_at,
        size_bytes,
    })
}

/// Run the blocking writer, bounded by `timeout` when one is configured.
///
/// The write happens on a worker thread only in the bounded case; on expiry
/// the worker is abandoned (it holds no locks the next run needs) and the
/// partial file is left for inspection.
fn write_archive<W>(
    writer: W,
    root: PathBuf,
    excludes: ExcludeSet,
    dest: PathBuf,
    timeout: Option<Duration>,
) -> Result<u64>
where
    W: ArchiveWriter + Send + 'static,
{
    let Some(bound) = timeout else {
        return writer.write(&root, &excludes, &dest);
    };

    let (tx, rx) = mpsc::channel();
    let worker_dest = dest.clone();
    thread::spawn(move || {
        let _ = tx.send(writer.write(&root, &excludes, &worker_dest));
    });

    match rx.recv_timeout(bound) {
        Ok(result) => result,
        Err(_) => Err(BackupError::ArchiveTimeout {
            path: dest,
            secs: bound.as_secs(),
        }),
    }
}
