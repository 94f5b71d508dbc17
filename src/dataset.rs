//! Walk-forward dataset builder
//!
//! Orchestrates the timeline, the ticket resolver, the metrics aggregator
//! and the bug-label oracle across all tracked files and all analyzed
//! releases, then partitions the result into release-indexed training/test
//! slices that respect temporal order: a model for test release `k` trains
//! only on records from strictly earlier releases.
//!
//! The oldest `discard_fraction` of releases is dropped before analysis to
//! reduce noise from early, sparsely-tracked history.
//!
//! # Failure policy
//!
//! Partial data beats a halted run: a VCS failure for one file or release
//! is logged and that unit keeps zero/false fields, while a failure to
//! resolve the timeline itself aborts (see the error taxonomy in
//! [`crate::error`]).

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::metrics::{self, HistoryMetrics};
use crate::oracle::{self, TicketIndex};
use crate::ticket::Ticket;
use crate::timeline::Timeline;
use crate::vcs::VcsReader;
use crate::{AnalysisConfig, Error, Result};

/// Per-file, per-release feature row
///
/// `release_index` is 0-based internally; sinks emit it 1-based.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileVersionRecord {
    /// Repo-relative file path
    pub path: String,
    /// 0-based index of the release this row describes
    pub release_index: usize,
    /// Non-empty lines of the file at the release snapshot
    pub size_loc: u32,
    /// Lines added over the release window
    pub loc_added: u32,
    /// Lines added plus deleted over the window
    pub loc_touched: u32,
    /// Largest per-commit insertion count
    pub max_loc_added: u32,
    /// Mean per-commit insertion count
    pub avg_loc_added: f64,
    /// Net lines changed over the window
    pub churn: i64,
    /// Largest per-commit churn
    pub max_churn: i64,
    /// Mean per-commit churn
    pub avg_churn: f64,
    /// Commits touching the file in the window
    pub revision_count: u32,
    /// Commits referencing a retained fixed-bug ticket
    pub fix_revision_count: u32,
    /// Whether this file-version falls inside some ticket's defect window
    pub is_defective: bool,
}

impl FileVersionRecord {
    /// Empty record for a file discovered at a release snapshot
    #[must_use]
    pub fn new(path: impl Into<String>, release_index: usize) -> Self {
        Self {
            path: path.into(),
            release_index,
            ..Self::default()
        }
    }

    fn apply_history(&mut self, m: &HistoryMetrics) {
        self.loc_added = m.loc_added;
        self.loc_touched = m.loc_touched;
        self.max_loc_added = m.max_loc_added;
        self.avg_loc_added = m.avg_loc_added;
        self.churn = m.churn;
        self.max_churn = m.max_churn;
        self.avg_churn = m.avg_churn;
        self.revision_count = m.revision_count;
        self.fix_revision_count = m.fix_revision_count;
    }
}

/// Number of most-recent releases analyzed after discarding the oldest
/// fraction: `floor(total * (1 - discard_fraction))`
#[must_use]
pub fn versions_to_analyze(total_releases: usize, discard_fraction: f64) -> usize {
    let kept = (total_releases as f64) * (1.0 - discard_fraction);
    if kept <= 0.0 {
        return 0;
    }
    (kept.floor() as usize).min(total_releases)
}

/// Records belonging to the training slice for test release `k`
/// (strictly earlier releases only)
#[must_use]
pub fn training_slice(records: &[FileVersionRecord], k: usize) -> Vec<&FileVersionRecord> {
    records.iter().filter(|r| r.release_index < k).collect()
}

/// Records belonging to the test slice for release `k`
#[must_use]
pub fn test_slice(records: &[FileVersionRecord], k: usize) -> Vec<&FileVersionRecord> {
    records.iter().filter(|r| r.release_index == k).collect()
}

/// Training/test slice pairs for every evaluable release
///
/// Yields `versions_to_analyze - 1` pairs: the first release has no
/// training slice and is excluded from walk-forward evaluation.
#[must_use]
pub fn walk_forward_pairs(
    records: &[FileVersionRecord],
    versions_to_analyze: usize,
) -> Vec<(Vec<&FileVersionRecord>, Vec<&FileVersionRecord>)> {
    (1..versions_to_analyze)
        .map(|k| (training_slice(records, k), test_slice(records, k)))
        .collect()
}

/// One analysis session over one working copy
///
/// Single-threaded and synchronous by design: the working copy is a shared
/// mutable resource, so each release is fully checked out and measured
/// before the next, and the baseline state is restored after every batch
/// of historical checkouts.
pub struct DatasetBuilder<'a, V: VcsReader> {
    config: &'a AnalysisConfig,
    timeline: &'a Timeline,
    index: TicketIndex<'a>,
    vcs: &'a mut V,
}

impl<'a, V: VcsReader> DatasetBuilder<'a, V> {
    /// Create a builder over resolved inputs
    ///
    /// `tickets` must already have gone through
    /// [`crate::ticket::apply_proportion`].
    pub fn new(
        config: &'a AnalysisConfig,
        timeline: &'a Timeline,
        tickets: &'a [Ticket],
        vcs: &'a mut V,
    ) -> Self {
        Self {
            config,
            timeline,
            index: TicketIndex::new(tickets),
            vcs,
        }
    }

    /// Build the full per-file, per-release feature table
    ///
    /// # Errors
    ///
    /// Fails when the timeline is empty or when the working copy cannot be
    /// restored to its baseline; per-unit VCS failures are logged and leave
    /// zero/false fields instead.
    pub fn build(&mut self) -> Result<Vec<FileVersionRecord>> {
        let total = self.timeline.len();
        if total == 0 {
            return Err(Error::Data("empty release timeline".to_string()));
        }
        let analyze = versions_to_analyze(total, self.config.discard_fraction);
        info!(
            "analyzing {analyze} of {total} releases for {}",
            self.config.project
        );

        let snapshots = self.snapshot_commits(analyze);
        let mut records = self.discover_files(analyze, &snapshots);
        self.measure_sizes(&mut records, &snapshots);
        self.vcs.restore_baseline()?;
        self.measure_history(&mut records);
        self.vcs.restore_baseline()?;

        Ok(records)
    }

    /// Snapshot commit per analyzed release; a failing release is skipped
    fn snapshot_commits(&mut self, analyze: usize) -> Vec<Option<String>> {
        (0..analyze)
            .map(|k| {
                let date = self.timeline.get(k).map(|r| r.date)?;
                match self.vcs.snapshot_commit(date) {
                    Ok(commit) => Some(commit),
                    Err(e) => {
                        warn!("no snapshot for release {}: {e}", k + 1);
                        None
                    }
                }
            })
            .collect()
    }

    /// One record per file present at each analyzed release snapshot
    fn discover_files(
        &mut self,
        analyze: usize,
        snapshots: &[Option<String>],
    ) -> Vec<FileVersionRecord> {
        let mut records = Vec::new();

        for k in 0..analyze {
            let Some(commit) = snapshots[k].as_deref() else {
                continue;
            };
            if let Err(e) = self.vcs.checkout(commit) {
                warn!("checkout failed for release {}: {e}", k + 1);
                continue;
            }
            match self
                .vcs
                .list_files(&self.config.extension, self.config.exclude_tests)
            {
                Ok(files) => {
                    records.extend(files.into_iter().map(|f| FileVersionRecord::new(f, k)));
                }
                Err(e) => warn!("file listing failed for release {}: {e}", k + 1),
            }
        }

        records
    }

    /// Fill `size_loc` per record, one checkout per release
    fn measure_sizes(&mut self, records: &mut [FileVersionRecord], snapshots: &[Option<String>]) {
        let mut current: Option<usize> = None;

        for record in records.iter_mut() {
            let k = record.release_index;
            if current != Some(k) {
                let Some(commit) = snapshots.get(k).and_then(|s| s.as_deref()) else {
                    continue;
                };
                if let Err(e) = self.vcs.checkout(commit) {
                    warn!("checkout failed for release {}: {e}", k + 1);
                    continue;
                }
                current = Some(k);
            }
            match self.vcs.read_lines(&record.path) {
                Ok(lines) => record.size_loc = metrics::size_loc(&lines),
                Err(e) => warn!("cannot read {} at release {}: {e}", record.path, k + 1),
            }
        }
    }

    /// Fill history metrics and the defect label per record, at the
    /// baseline checkout
    fn measure_history(&mut self, records: &mut [FileVersionRecord]) {
        let Some(first_date) = self.timeline.first().map(|r| r.date) else {
            return;
        };
        let progress = self.progress_bar(records.len() as u64);

        for record in records.iter_mut() {
            let window = self
                .timeline
                .get(record.release_index)
                .zip(self.timeline.get(record.release_index + 1));
            if let Some((older, newer)) = window {
                match self.vcs.log_stat(&record.path, older.date, newer.date) {
                    Ok(commits) => record.apply_history(&HistoryMetrics::aggregate(
                        &commits,
                        &self.index,
                        &self.config.project,
                    )),
                    Err(e) => warn!("log failed for {}: {e}", record.path),
                }
            }

            match self.vcs.log_after(&record.path, first_date) {
                Ok(commits) => {
                    record.is_defective = oracle::label_from_commits(
                        record.release_index,
                        &commits,
                        &self.config.project,
                        &self.index,
                    );
                }
                Err(e) => warn!("label log failed for {}: {e}", record.path),
            }
            progress.inc(1);
        }
        progress.finish_and_clear();
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(release_index: usize) -> FileVersionRecord {
        FileVersionRecord::new("src/A.java", release_index)
    }

    #[test]
    fn test_versions_to_analyze_floor() {
        // floor(10 * 0.51) = 5
        assert_eq!(versions_to_analyze(10, 0.49), 5);
        assert_eq!(versions_to_analyze(0, 0.49), 0);
        assert_eq!(versions_to_analyze(3, 0.0), 3);
        assert_eq!(versions_to_analyze(3, 1.0), 0);
    }

    #[test]
    fn test_training_slice_strictly_earlier() {
        let records = vec![record(0), record(1), record(2)];
        let train = training_slice(&records, 2);
        assert_eq!(train.len(), 2);
        assert!(train.iter().all(|r| r.release_index < 2));
    }

    #[test]
    fn test_test_slice_exact_release() {
        let records = vec![record(0), record(1), record(1), record(2)];
        let test = test_slice(&records, 1);
        assert_eq!(test.len(), 2);
        assert!(test.iter().all(|r| r.release_index == 1));
    }

    #[test]
    fn test_walk_forward_pairs_no_leakage() {
        let records: Vec<FileVersionRecord> = (0..4).map(record).collect();
        let pairs = walk_forward_pairs(&records, 4);
        // First release excluded: 3 pairs for 4 analyzed releases.
        assert_eq!(pairs.len(), 3);
        for (k, (train, test)) in (1..).zip(&pairs) {
            assert!(train.iter().all(|r| r.release_index < k));
            assert!(test.iter().all(|r| r.release_index == k));
        }
    }

    #[test]
    fn test_record_new_is_zeroed() {
        let r = record(3);
        assert_eq!(r.release_index, 3);
        assert_eq!(r.size_loc, 0);
        assert_eq!(r.revision_count, 0);
        assert!(!r.is_defective);
    }
}
