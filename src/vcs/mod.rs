//! Version-control reader seam
//!
//! The engine never talks to a VCS directly; it goes through the
//! [`VcsReader`] trait. The one production implementation shells out to the
//! git CLI ([`git::GitCli`]); tests substitute in-memory fakes.
//!
//! # Shared working copy
//!
//! A reader owns one working copy, a shared mutable resource: every method
//! takes `&mut self` and [`VcsReader::checkout`] is non-reentrant. Batches
//! of historical checkouts must end with [`VcsReader::restore_baseline`] so
//! the resource is left consistent for any caller. An implementation backed
//! by isolated read-only snapshots per revision may make `checkout` a no-op
//! and drop the sequencing constraint.
//!
//! # Window convention
//!
//! `log_stat(path, after, before)` covers the window `(after, before]` —
//! strictly after the older boundary, up to and including the newer one.
//! `log_after(path, after)` covers everything after `after`. The git
//! implementation approximates both with `--after`/`--before`, matching the
//! underlying tool's inclusive day-granularity semantics.

pub mod git;
pub mod parse;

use chrono::{DateTime, Utc};

use crate::Result;

/// One commit touching a file, as parsed from a VCS log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitRecord {
    /// Commit hash
    pub id: String,
    /// Full commit message block (subject and body)
    pub message: String,
    /// Diff stat, present only when the commit changed exactly one file
    /// (multi-file stats are numerically untrustworthy and dropped)
    pub stat: Option<DiffStat>,
}

/// Insertion/deletion counts from a single-file diff stat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStat {
    /// Lines inserted
    pub insertions: u32,
    /// Lines deleted
    pub deletions: u32,
}

impl DiffStat {
    /// Net lines changed (insertions minus deletions), may be negative
    #[must_use]
    pub fn churn(&self) -> i64 {
        i64::from(self.insertions) - i64::from(self.deletions)
    }
}

/// Blocking, order-sensitive access to one version-controlled working copy
pub trait VcsReader {
    /// Switch the working copy to the given revision
    fn checkout(&mut self, revision: &str) -> Result<()>;

    /// Switch the working copy back to the baseline (most recent) state
    fn restore_baseline(&mut self) -> Result<()>;

    /// Latest commit id not after the given date
    fn snapshot_commit(&mut self, before: DateTime<Utc>) -> Result<String>;

    /// Repo-relative paths of tracked files at the current checkout,
    /// filtered by extension, optionally skipping test directories
    fn list_files(&mut self, extension: &str, exclude_tests: bool) -> Result<Vec<String>>;

    /// Commits touching `path` in the window `(after, before]`, with
    /// single-file diff stats where available
    fn log_stat(
        &mut self,
        path: &str,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>>;

    /// Commits touching `path` after the given date (no stats needed)
    fn log_after(&mut self, path: &str, after: DateTime<Utc>) -> Result<Vec<CommitRecord>>;

    /// Lines of the file at the current checkout
    fn read_lines(&mut self, path: &str) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_stat_churn_signed() {
        let stat = DiffStat {
            insertions: 3,
            deletions: 10,
        };
        assert_eq!(stat.churn(), -7);
    }
}
