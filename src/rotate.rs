//! Retention rotation: bounding each tier's archive directory to its keep
//! count by evicting the oldest artifacts.
//!
//! The ordering is an explicit in-memory sort, newest first by modification
//! time with a lexicographic name tie-break, rather than whatever order the
//! directory listing happens to return. That makes a rotation pass
//! deterministic and idempotent: two consecutive passes over the same
//! directory state select the same victims, and the second pass selects
//! none.
//!
//! Deletion is best-effort per artifact. A single locked or already-removed
//! file is reported in the [`RotationReport`] and never aborts the batch or
//! fails the run; the next scheduled pass re-converges toward the bound.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{BackupError, Result};
use crate::logging::Logger;
use crate::tier::{ARCHIVE_EXT, Tier};

/// One archived snapshot belonging to exactly one tier.
///
/// Created once by the archiver, never mutated, destroyed exactly once by
/// the rotator when it becomes one of the oldest excess artifacts for its
/// tier.
#[derive(Clone, Debug)]
pub struct BackupArtifact {
    /// Retention class this artifact belongs to
    pub tier: Tier,
    /// File name, encoding prefix, tier, and timestamp
    pub name: String,
    /// Location inside the tier's archive directory
    pub path: PathBuf,
    /// Filesystem modification time
    pub created_at: SystemTime,
    /// Observed post-write size
    pub size_bytes: u64,
}

/// Outcome of a single rotation pass over one tier directory.
#[derive(Debug, Default)]
pub struct RotationReport {
    /// Artifacts present when the pass started
    pub examined: usize,
    /// Artifacts remaining after the pass
    pub kept: usize,
    /// Artifacts removed (or slated for removal in dry-run mode)
    pub deleted: Vec<PathBuf>,
    /// Artifacts that could not be removed, with the reason
    pub failed: Vec<(PathBuf, io::Error)>,
    /// Total size of the removed artifacts
    pub bytes_freed: u64,
}

impl RotationReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Point-in-time listing of the artifacts in one tier directory.
///
/// A missing directory lists as empty rather than erroring, since a tier
/// that has never run simply has nothing to rotate. Entries that vanish
/// between the listing and the metadata read are skipped; an external
/// deleter racing us is tolerated, not fatal.
pub fn list_artifacts(tier: Tier, dir: &Path) -> Result<Vec<BackupArtifact>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|source| BackupError::IoError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut artifacts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| BackupError::IoError {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if !name.ends_with(ARCHIVE_EXT) {
            continue;
        }

        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(created_at) = metadata.modified() else {
            continue;
        };

        artifacts.push(BackupArtifact {
            tier,
            name,
            path,
            created_at,
            size_bytes: metadata.len(),
        });
    }

    Ok(artifacts)
}

/// Split artifacts into the retained head and the excess tail.
///
/// Sorts newest-first by modification time; identical timestamps fall back
/// to lexicographic name order with the larger name treated as newer, so
/// the oldest-looking name is evicted first. The first `keep` entries
/// survive, the rest are the eviction set.
pub fn plan_rotation(
    mut artifacts: Vec<BackupArtifact>,
    keep: usize,
) -> (Vec<BackupArtifact>, Vec<BackupArtifact>) {
    artifacts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.name.cmp(&a.name))
    });

    if artifacts.len() <= keep {
        return (artifacts, Vec::new());
    }

    let excess = artifacts.split_off(keep);
    (artifacts, excess)
}

/// Enforce `keep` over one tier directory, deleting the oldest excess.
///
/// At or under the cap this is a no-op that leaves the directory untouched.
/// In dry-run mode victims are reported but nothing is removed.
pub fn rotate(
    tier: Tier,
    dir: &Path,
    keep: usize,
    dry_run: bool,
    log: Logger,
) -> Result<RotationReport> {
    rotate_with(tier, dir, keep, dry_run, log, |p| fs::remove_file(p))
}

/// [`rotate`] with an injectable removal primitive, so tests can stage
/// per-artifact deletion failures on any filesystem and as any user.
fn rotate_with(
    tier: Tier,
    dir: &Path,
    keep: usize,
    dry_run: bool,
    log: Logger,
    remove: fn(&Path) -> io::Result<()>,
) -> Result<RotationReport> {
    let artifacts = list_artifacts(tier, dir)?;
    let examined = artifacts.len();
    let (retained, excess) = plan_rotation(artifacts, keep);

    let mut report = RotationReport {
        examined,
        kept: retained.len(),
        ..RotationReport::default()
    };

    if excess.is_empty() {
        log.verbose(
            1,
            format!("{tier}: {examined} artifact(s), within keep limit {keep}"),
        );
        return Ok(report);
    }

    log.verbose(
        1,
        format!(
            "{tier}: {examined} artifact(s), keep {keep}, evicting {}",
            excess.len()
        ),
    );

    for artifact in excess {
        if dry_run {
            log.info(format!("Would delete {}", artifact.path.display()));
            report.bytes_freed += artifact.size_bytes;
            report.deleted.push(artifact.path);
            continue;
        }

        match remove(&artifact.path) {
            Ok(()) => {
                log.verbose(2, format!("  Deleted {}", artifact.path.display()));
                report.bytes_freed += artifact.size_bytes;
                report.deleted.push(artifact.path);
            }
            // Already gone: an external remover beat us to it, which is the
            // state we wanted anyway.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log.verbose(2, format!("  Already removed: {}", artifact.path.display()));
                report.deleted.push(artifact.path);
            }
            Err(e) => {
                log.warn(format!("failed to delete {}: {e}", artifact.path.display()));
                report.kept += 1;
                report.failed.push((artifact.path, e));
            }
        }
    }

    Ok(report)
}
