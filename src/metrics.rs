//! Change-history metrics aggregation
//!
//! Folds the commits touching one file inside one release window into a
//! fixed feature record: LOC added/touched, churn, per-commit maxima and
//! averages, revision and fix-revision counts.
//!
//! Only single-file diff stats feed the numeric sums; multi-file commits
//! still count as revisions (and possibly fix revisions) but their line
//! counts are ambiguous and stay out of the LOC/churn numbers.

use crate::oracle::TicketIndex;
use crate::vcs::{parse, CommitRecord};

/// Aggregated change-history metrics for one file over one release window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryMetrics {
    /// Sum of inserted lines over parsed commits
    pub loc_added: u32,
    /// Inserted plus deleted lines over parsed commits
    pub loc_touched: u32,
    /// Largest per-commit insertion count
    pub max_loc_added: u32,
    /// Mean per-commit insertion count, 0 when no commit parsed
    pub avg_loc_added: f64,
    /// Net lines changed (insertions minus deletions), may be negative
    pub churn: i64,
    /// Largest per-commit churn, floored at 0
    pub max_churn: i64,
    /// Mean per-commit churn, 0 when no commit parsed
    pub avg_churn: f64,
    /// Commits touching the file in the window (`NR`)
    pub revision_count: u32,
    /// Commits referencing a retained fixed-bug ticket (`NF`)
    pub fix_revision_count: u32,
}

impl HistoryMetrics {
    /// Aggregate the commits of one release window
    ///
    /// `project_key` scopes the ticket-id extraction from commit messages;
    /// at most one fix-revision is counted per commit.
    #[must_use]
    pub fn aggregate(
        commits: &[CommitRecord],
        index: &TicketIndex<'_>,
        project_key: &str,
    ) -> Self {
        let mut metrics = Self::default();
        let mut deletions_total: u32 = 0;
        let mut parsed_commits: u32 = 0;

        for commit in commits {
            metrics.revision_count += 1;

            if let Some(id) = parse::ticket_id(&commit.message, project_key) {
                if index.lookup(&id).is_some() {
                    metrics.fix_revision_count += 1;
                }
            }

            if let Some(stat) = commit.stat {
                parsed_commits += 1;
                metrics.loc_added += stat.insertions;
                deletions_total += stat.deletions;

                let churn = stat.churn();
                metrics.churn += churn;
                metrics.max_loc_added = metrics.max_loc_added.max(stat.insertions);
                metrics.max_churn = metrics.max_churn.max(churn);
            }
        }

        metrics.loc_touched = metrics.loc_added + deletions_total;
        if parsed_commits > 0 {
            metrics.avg_loc_added = f64::from(metrics.loc_added) / f64::from(parsed_commits);
            metrics.avg_churn = metrics.churn as f64 / f64::from(parsed_commits);
        }

        metrics
    }
}

/// Non-empty line count of a file's content at one snapshot
///
/// A separate, simpler operation than history aggregation: it reads the
/// checked-out content, not the log.
#[must_use]
pub fn size_loc(lines: &[String]) -> u32 {
    u32::try_from(lines.iter().filter(|l| !l.is_empty()).count()).unwrap_or(u32::MAX)
}
