//! Retention tiers and tier-specific archive naming.
//!
//! Each tier owns one subdirectory of the backup root, one timestamp
//! granularity for archive names, and one default keep count. The
//! granularity is deliberate: daily names embed a full timestamp so manual
//! re-runs within a day coexist (bounded by the rotator's count cap), while
//! weekly/monthly/yearly names only encode the period, so a re-run within
//! the same period overwrites the earlier snapshot instead of accumulating.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime};
use clap::ValueEnum;

use crate::error::BackupError;

/// Extension shared by every artifact meshback writes.
pub const ARCHIVE_EXT: &str = ".tar.gz";

/// One of the four retention classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Tier {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// All tiers, in the order the status summary reports them.
pub const ALL_TIERS: [Tier; 4] = [Tier::Daily, Tier::Weekly, Tier::Monthly, Tier::Yearly];

impl Tier {
    /// Directory name under the backup root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
            Tier::Yearly => "yearly",
        }
    }

    /// Default number of artifacts retained after a rotation pass.
    pub fn default_keep(self) -> usize {
        match self {
            Tier::Daily => 10,
            Tier::Weekly => 5,
            Tier::Monthly => 5,
            Tier::Yearly => 5,
        }
    }

    /// Render the timestamp portion of an archive name for this tier.
    ///
    /// The time is injected by the caller rather than read from the wall
    /// clock, so tests can pin it.
    pub fn stamp(self, when: NaiveDateTime) -> String {
        match self {
            Tier::Daily => when.format("%Y-%m-%d_%H-%M-%S").to_string(),
            // ISO week numbering: the year here is the ISO week-year, which
            // differs from the calendar year around January 1st.
            Tier::Weekly => {
                let iso = when.iso_week();
                format!("{}-W{:02}", iso.year(), iso.week())
            }
            Tier::Monthly => when.format("%Y-%m").to_string(),
            Tier::Yearly => when.format("%Y").to_string(),
        }
    }

    /// Full archive file name for a run at `when`, e.g.
    /// `meshtracking_weekly_2025-W07.tar.gz`.
    pub fn archive_file_name(self, prefix: &str, when: NaiveDateTime) -> String {
        format!(
            "{prefix}_{tier}_{stamp}{ARCHIVE_EXT}",
            tier = self.dir_name(),
            stamp = self.stamp(when)
        )
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Tier {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Tier::Daily),
            "weekly" => Ok(Tier::Weekly),
            "monthly" => Ok(Tier::Monthly),
            "yearly" => Ok(Tier::Yearly),
            other => Err(BackupError::InvalidTier(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests;
