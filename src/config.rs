//! Run configuration for backup creation and rotation.
//!
//! The shell heritage of this tool leaned on ambient state: the working
//! directory, environment-derived timestamps, a hardcoded exclusion list.
//! Here all of that is explicit: a [`Config`] is built once by the CLI layer
//! (or a test) and passed into both the archiver and the rotator, and the
//! current time is injected as a parameter wherever naming needs it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tier::Tier;

/// Exclusion patterns applied to every snapshot regardless of user input:
/// version-control metadata, interpreter caches, virtualenvs, logs, and
/// known stray backup/editor files. The backup root itself is excluded
/// separately by path, not by pattern.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    "__pycache__",
    "*.pyc",
    "venv",
    ".venv",
    "*.log",
    "*.bak",
    "*.tmp",
    "*~",
];

/// Per-tier keep counts enforced by the rotator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionPolicy {
    daily: usize,
    weekly: usize,
    monthly: usize,
    yearly: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            daily: Tier::Daily.default_keep(),
            weekly: Tier::Weekly.default_keep(),
            monthly: Tier::Monthly.default_keep(),
            yearly: Tier::Yearly.default_keep(),
        }
    }
}

impl RetentionPolicy {
    /// Maximum number of artifacts retained for `tier`.
    pub fn keep(&self, tier: Tier) -> usize {
        match tier {
            Tier::Daily => self.daily,
            Tier::Weekly => self.weekly,
            Tier::Monthly => self.monthly,
            Tier::Yearly => self.yearly,
        }
    }

    /// Override the keep count for one tier.
    pub fn set_keep(&mut self, tier: Tier, keep: usize) {
        match tier {
            Tier::Daily => self.daily = keep,
            Tier::Weekly => self.weekly = keep,
            Tier::Monthly => self.monthly = keep,
            Tier::Yearly => self.yearly = keep,
        }
    }
}

/// Backup run configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Project tree to snapshot
    source_root: PathBuf,
    /// Root directory holding the per-tier archive directories
    backup_root: PathBuf,
    /// Leading component of every archive file name
    prefix: String,
    /// Glob-style exclusion patterns (defaults plus user additions)
    exclude_patterns: Vec<String>,
    /// Per-tier keep counts
    retention: RetentionPolicy,
    /// Optional bound on archive creation time
    timeout: Option<Duration>,
    /// Dry run mode - don't actually delete anything
    dry_run: bool,
    /// Suppress informational logging when true
    quiet: bool,
}

impl Config {
    /// Creates a new builder for [`Config`]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Get the source root
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Get the backup root
    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Archive directory for one tier
    pub fn tier_dir(&self, tier: Tier) -> PathBuf {
        self.backup_root.join(tier.dir_name())
    }

    /// Get the archive name prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the exclusion patterns
    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    /// Get the retention policy
    pub fn retention(&self) -> &RetentionPolicy {
        &self.retention
    }

    /// Get the archive creation timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check if dry run mode is enabled
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Check if quiet mode is enabled
    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            backup_root: PathBuf::from("backups"),
            prefix: String::from("meshtracking"),
            exclude_patterns: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            retention: RetentionPolicy::default(),
            timeout: None,
            dry_run: false,
            quiet: false,
        }
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    source_root: Option<PathBuf>,
    backup_root: Option<PathBuf>,
    prefix: Option<String>,
    extra_excludes: Vec<String>,
    retention: Option<RetentionPolicy>,
    timeout: Option<Duration>,
    dry_run: bool,
    quiet: bool,
}

impl ConfigBuilder {
    /// Set the source root
    pub fn source_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_root = Some(dir.into());
        self
    }

    /// Set the backup root
    pub fn backup_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_root = Some(dir.into());
        self
    }

    /// Set the archive name prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Add an exclusion pattern on top of the defaults
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.extra_excludes.push(pattern.into());
        self
    }

    /// Add several exclusion patterns on top of the defaults
    pub fn excludes(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.extra_excludes.extend(patterns);
        self
    }

    /// Set the retention policy
    pub fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Bound archive creation time
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable dry run mode
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enable or disable quiet mode
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build the [`Config`]
    pub fn build(self) -> Config {
        let mut exclude_patterns: Vec<String> =
            DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        exclude_patterns.extend(self.extra_excludes);

        Config {
            source_root: self.source_root.unwrap_or_else(|| PathBuf::from(".")),
            backup_root: self.backup_root.unwrap_or_else(|| PathBuf::from("backups")),
            prefix: self.prefix.unwrap_or_else(|| String::from("meshtracking")),
            exclude_patterns,
            retention: self.retention.unwrap_or_default(),
            timeout: self.timeout,
            dry_run: self.dry_run,
            quiet: self.quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retention_policy() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.keep(Tier::Daily), 10);
        assert_eq!(policy.keep(Tier::Weekly), 5);
        assert_eq!(policy.keep(Tier::Monthly), 5);
        assert_eq!(policy.keep(Tier::Yearly), 5);
    }

    #[test]
    fn test_retention_policy_override() {
        let mut policy = RetentionPolicy::default();
        policy.set_keep(Tier::Daily, 3);
        assert_eq!(policy.keep(Tier::Daily), 3);
        // Other tiers are untouched.
        assert_eq!(policy.keep(Tier::Weekly), 5);
    }

    #[test]
    fn test_builder_keeps_default_excludes() {
        let config = Config::builder()
            .source_root("/srv/meshtracking")
            .exclude("*.sqlite3")
            .build();

        assert!(config.exclude_patterns().iter().any(|p| p == ".git"));
        assert!(config.exclude_patterns().iter().any(|p| p == "*.sqlite3"));
        assert_eq!(config.source_root(), Path::new("/srv/meshtracking"));
    }

    #[test]
    fn test_tier_dir_layout() {
        let config = Config::builder().backup_root("/var/backups/mesh").build();
        assert_eq!(
            config.tier_dir(Tier::Weekly),
            Path::new("/var/backups/mesh/weekly")
        );
    }
}
