//! Bug-label oracle
//!
//! Decides whether the version of a file shipped at a given release is
//! defective, using the SZZ-style affected-version-range containment rule:
//! the file-version is defective when some retained fixed-bug ticket is
//! referenced by a commit touching the file and the release falls inside
//! the ticket's `[injected, fixed)` window.
//!
//! File-version indices are 0-based while ticket version indices are
//! 1-based, hence the `- 1` realignment in [`is_defective`].

use std::collections::HashMap;

use crate::ticket::Ticket;
use crate::vcs::{parse, CommitRecord};

/// Key-indexed view over the retained fixed-bug tickets
///
/// Built once per analysis run for O(1) lookup per commit-message match.
/// Because only retained fixed-bug tickets enter the index, an id match
/// against any other ticket type can never label a file defective.
#[derive(Debug)]
pub struct TicketIndex<'a> {
    by_key: HashMap<&'a str, &'a Ticket>,
}

impl<'a> TicketIndex<'a> {
    /// Index the retained fixed-bug tickets by key
    #[must_use]
    pub fn new(tickets: &'a [Ticket]) -> Self {
        Self {
            by_key: tickets.iter().map(|t| (t.key.as_str(), t)).collect(),
        }
    }

    /// Look up a ticket by its tracker key
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&'a Ticket> {
        self.by_key.get(key).copied()
    }

    /// Number of indexed tickets
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Containment rule for one ticket and one 0-based file version
#[must_use]
pub fn ticket_covers(ticket: &Ticket, file_version: usize) -> bool {
    let Some(injected) = ticket.injected_version else {
        return false;
    };
    // IV - 1 <= v < FV - 1, rearranged to avoid unsigned underflow.
    injected <= file_version + 1 && file_version + 1 < ticket.fixed_version
}

/// Whether the file-version is defective given the tickets its commits
/// reference
///
/// `referenced_ids` are the ticket ids extracted from commits touching the
/// file after the first release date; ids that do not name a retained
/// fixed-bug ticket are ignored.
pub fn is_defective<I>(file_version: usize, referenced_ids: I, index: &TicketIndex<'_>) -> bool
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    referenced_ids
        .into_iter()
        .filter_map(|id| index.lookup(id.as_ref()))
        .any(|t| ticket_covers(t, file_version))
}

/// Label a file-version from the raw commit stream touching the file
///
/// Convenience over [`is_defective`]: extracts every ticket id from each
/// commit message with [`parse::ticket_ids`] — a message may reference
/// several tickets and any retained one can label the version (failure to
/// parse is "no reference").
#[must_use]
pub fn label_from_commits(
    file_version: usize,
    commits: &[CommitRecord],
    project_key: &str,
    index: &TicketIndex<'_>,
) -> bool {
    is_defective(
        file_version,
        commits
            .iter()
            .flat_map(|c| parse::ticket_ids(&c.message, project_key)),
        index,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(key: &str, injected: usize, open: usize, fixed: usize) -> Ticket {
        Ticket {
            key: key.to_string(),
            open_date: "2020-02-01T00:00:00Z".parse().unwrap(),
            fix_date: "2020-07-01T00:00:00Z".parse().unwrap(),
            injected_version: Some(injected),
            open_version: open,
            fixed_version: fixed,
        }
    }

    fn commit(message: &str) -> CommitRecord {
        CommitRecord {
            id: "abc123".to_string(),
            message: message.to_string(),
            stat: None,
        }
    }

    #[test]
    fn test_ticket_covers_window() {
        // IV = 2, FV = 5: defective 0-based versions are 1, 2, 3.
        let t = ticket("P-1", 2, 3, 5);
        assert!(!ticket_covers(&t, 0));
        assert!(ticket_covers(&t, 1));
        assert!(ticket_covers(&t, 3));
        assert!(!ticket_covers(&t, 4));
        assert!(!ticket_covers(&t, 7));
    }

    #[test]
    fn test_ticket_without_injected_version_covers_nothing() {
        let mut t = ticket("P-1", 1, 1, 5);
        t.injected_version = None;
        assert!(!ticket_covers(&t, 0));
    }

    #[test]
    fn test_is_defective_requires_indexed_ticket() {
        let tickets = vec![ticket("P-1", 1, 1, 3)];
        let index = TicketIndex::new(&tickets);
        // "P-99" is not a retained fixed-bug ticket: id match must not label.
        assert!(!is_defective(0, ["P-99"], &index));
        assert!(is_defective(0, ["P-99", "P-1"], &index));
    }

    #[test]
    fn test_is_defective_outside_window() {
        let tickets = vec![ticket("P-1", 2, 2, 3)];
        let index = TicketIndex::new(&tickets);
        // Window covers only 0-based version 1.
        assert!(!is_defective(0, ["P-1"], &index));
        assert!(is_defective(1, ["P-1"], &index));
        assert!(!is_defective(2, ["P-1"], &index));
    }

    #[test]
    fn test_label_from_commits_extracts_ids() {
        let tickets = vec![ticket("PROJ-7", 1, 1, 3)];
        let index = TicketIndex::new(&tickets);
        let commits = vec![
            commit("Refactor logging"),
            commit("PROJ-7: fix race in ledger close"),
        ];
        assert!(label_from_commits(0, &commits, "PROJ", &index));
        assert!(!label_from_commits(2, &commits, "PROJ", &index));
    }

    #[test]
    fn test_label_from_commits_sees_every_reference() {
        let tickets = vec![ticket("PROJ-9", 1, 1, 3)];
        let index = TicketIndex::new(&tickets);
        // An unretained reference ahead of the retained one must not mask it.
        let commits = vec![commit("Backport of PROJ-100\nAlso fixes PROJ-9")];
        assert!(label_from_commits(0, &commits, "PROJ", &index));
    }

    #[test]
    fn test_label_from_commits_no_references() {
        let tickets = vec![ticket("PROJ-7", 1, 1, 3)];
        let index = TicketIndex::new(&tickets);
        let commits = vec![commit("Bump version"), commit("Update docs")];
        assert!(!label_from_commits(0, &commits, "PROJ", &index));
    }
}
