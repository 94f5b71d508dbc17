//! Fuzzy text parsing for VCS log output
//!
//! Commit message formats are not controlled, so everything here degrades
//! to "no data" on a mismatch: `None` or zero, never an error. Keeping the
//! fuzziness isolated in this module stops parse ambiguity from leaking
//! into the numeric aggregation invariants.

use super::{CommitRecord, DiffStat};

/// First run of decimal digits anywhere in the string, 0 when absent
#[must_use]
pub fn leading_number(s: &str) -> u32 {
    let mut value: u32 = 0;
    let mut found = false;
    for c in s.chars() {
        if let Some(d) = c.to_digit(10) {
            value = value.saturating_mul(10).saturating_add(d);
            found = true;
        } else if found {
            break;
        }
    }
    if found {
        value
    } else {
        0
    }
}

/// First ticket id referenced in free text, as `KEY-<digits>`
///
/// Returns `None` when no well-formed reference is present.
#[must_use]
pub fn ticket_id(text: &str, project_key: &str) -> Option<String> {
    ticket_ids(text, project_key).into_iter().next()
}

/// Every ticket id referenced in free text, in order of appearance
///
/// Scans for the uppercased project key followed by a dash and at least one
/// digit; a commit message may reference several tickets and labeling must
/// see all of them. Malformed occurrences (no digits after the dash) are
/// skipped.
#[must_use]
pub fn ticket_ids(text: &str, project_key: &str) -> Vec<String> {
    let marker = format!("{}-", project_key.to_uppercase());
    let mut ids = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(&marker) {
        let tail = &rest[start + marker.len()..];
        let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
        if !digits.is_empty() {
            ids.push(format!("{marker}{digits}"));
        }
        rest = &tail[digits.len()..];
    }

    ids
}

/// Insertion/deletion counts from a single-file diff-stat line
///
/// Only `1 file changed, ...` lines parse; multi-file stats return `None`
/// so their numbers never enter the LOC/churn sums. Singular and plural
/// forms (`1 insertion(+)`, `2 insertions(+)`) are both accepted, and a
/// missing clause counts as 0.
#[must_use]
pub fn diff_stat(line: &str) -> Option<DiffStat> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with("1 file changed,") {
        return None;
    }

    let mut stat = DiffStat::default();
    for clause in trimmed.split(',') {
        if clause.contains("insertion") && clause.contains("(+)") {
            stat.insertions = leading_number(clause);
        } else if clause.contains("deletion") && clause.contains("(-)") {
            stat.deletions = leading_number(clause);
        }
    }
    Some(stat)
}

/// Split a raw `git log [--stat]` dump into commit records
///
/// A `commit <hash>` header starts a record; a single-file diff-stat line
/// fills its stat; everything else accumulates into the message block.
/// Lines before the first header are dropped.
#[must_use]
pub fn split_commits(raw: &str) -> Vec<CommitRecord> {
    let mut commits: Vec<CommitRecord> = Vec::new();

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("commit ") {
            let id = rest.split_whitespace().next().unwrap_or("").to_string();
            commits.push(CommitRecord {
                id,
                message: String::new(),
                stat: None,
            });
        } else if let Some(current) = commits.last_mut() {
            if let Some(stat) = diff_stat(line) {
                current.stat = Some(stat);
            } else {
                current.message.push_str(line.trim());
                current.message.push('\n');
            }
        }
    }

    commits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number(" 10 insertions(+)"), 10);
        assert_eq!(leading_number("abc42def7"), 42);
        assert_eq!(leading_number("no digits"), 0);
        assert_eq!(leading_number(""), 0);
    }

    #[test]
    fn test_ticket_id_found() {
        assert_eq!(
            ticket_id("BOOKKEEPER-123: fix ledger close", "BookKeeper"),
            Some("BOOKKEEPER-123".to_string())
        );
    }

    #[test]
    fn test_ticket_id_mid_text() {
        assert_eq!(
            ticket_id("merge fix for PROJ-9 into trunk", "PROJ"),
            Some("PROJ-9".to_string())
        );
    }

    #[test]
    fn test_ticket_id_absent_or_malformed() {
        assert_eq!(ticket_id("plain refactor", "PROJ"), None);
        assert_eq!(ticket_id("PROJ- dangling dash", "PROJ"), None);
        assert_eq!(ticket_id("OTHER-12", "PROJ"), None);
    }

    #[test]
    fn test_ticket_ids_all_references_in_order() {
        assert_eq!(
            ticket_ids("Backport of PROJ-100\nAlso fixes PROJ-9", "PROJ"),
            vec!["PROJ-100".to_string(), "PROJ-9".to_string()]
        );
    }

    #[test]
    fn test_ticket_ids_skips_malformed_occurrences() {
        assert_eq!(
            ticket_ids("PROJ- dangling, then PROJ-7", "PROJ"),
            vec!["PROJ-7".to_string()]
        );
        assert!(ticket_ids("no references here", "PROJ").is_empty());
    }

    #[test]
    fn test_diff_stat_single_file() {
        let stat = diff_stat(" 1 file changed, 10 insertions(+), 2 deletions(-)").unwrap();
        assert_eq!(stat.insertions, 10);
        assert_eq!(stat.deletions, 2);
        assert_eq!(stat.churn(), 8);
    }

    #[test]
    fn test_diff_stat_singular_forms() {
        let stat = diff_stat(" 1 file changed, 1 insertion(+), 1 deletion(-)").unwrap();
        assert_eq!(stat.insertions, 1);
        assert_eq!(stat.deletions, 1);
    }

    #[test]
    fn test_diff_stat_missing_clause_defaults_to_zero() {
        let stat = diff_stat(" 1 file changed, 5 deletions(-)").unwrap();
        assert_eq!(stat.insertions, 0);
        assert_eq!(stat.deletions, 5);
    }

    #[test]
    fn test_diff_stat_rejects_multi_file() {
        assert_eq!(diff_stat(" 3 files changed, 10 insertions(+)"), None);
        assert_eq!(diff_stat("unrelated line"), None);
    }

    #[test]
    fn test_split_commits() {
        let raw = "\
commit aaa111
Author: Dev <dev@example.org>
Date:   2020-02-10

    PROJ-7: fix race in ledger close

 src/ledger.java | 12 ++--
 1 file changed, 10 insertions(+), 2 deletions(-)

commit bbb222
Author: Dev <dev@example.org>
Date:   2020-03-01

    Refactor logging across modules

 src/a.java | 1 +
 src/b.java | 1 +
 2 files changed, 2 insertions(+)
";
        let commits = split_commits(raw);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].id, "aaa111");
        assert!(commits[0].message.contains("PROJ-7"));
        assert_eq!(
            commits[0].stat,
            Some(DiffStat {
                insertions: 10,
                deletions: 2
            })
        );
        // Multi-file stat stays unparsed.
        assert_eq!(commits[1].stat, None);
    }

    #[test]
    fn test_split_commits_empty_input() {
        assert!(split_commits("").is_empty());
    }
}
