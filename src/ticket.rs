//! Fixed-bug ticket resolution and the Proportion estimator
//!
//! Raw tracker tickets are turned into version-range facts: the release in
//! which the bug was reported (open version), resolved (fixed version) and
//! introduced (injected version). The injected version is usually unknown
//! and is estimated with the Proportion heuristic, which assumes the ratio
//! of a defect's lifetime spent before its report is stable across tickets
//! of the same project.
//!
//! Every retained ticket satisfies `1 <= IV <= OV <= FV` after
//! [`apply_proportion`]; tickets that cannot satisfy the temporal
//! invariants are dropped at resolution time, never propagated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timeline::Timeline;

/// A fixed-bug ticket as delivered by the tracker, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTicket {
    /// Tracker key, e.g. `BOOKKEEPER-123`
    pub key: String,
    /// Creation timestamp
    pub created: DateTime<Utc>,
    /// Resolution timestamp
    pub resolved: DateTime<Utc>,
    /// Tracker ids of the releases listed as affected, possibly empty
    pub affected_version_ids: Vec<String>,
}

/// A resolved fixed-bug ticket with its version-range facts
///
/// Built once from a [`RawTicket`], mutated once by [`apply_proportion`]
/// to fill an unknown injected version, then immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Tracker key
    pub key: String,
    /// Creation timestamp
    pub open_date: DateTime<Utc>,
    /// Resolution timestamp
    pub fix_date: DateTime<Utc>,
    /// Release index (1-based) in which the defect was introduced;
    /// `None` until estimated by [`apply_proportion`]
    pub injected_version: Option<usize>,
    /// Release index (1-based) in which the defect was reported
    pub open_version: usize,
    /// Release index (1-based) in which the defect was resolved
    pub fixed_version: usize,
}

impl Ticket {
    /// Resolve a raw ticket against the timeline
    ///
    /// Returns `None` (the ticket is discarded) when the ticket was opened
    /// before the first release, when the fix date cannot be placed on the
    /// timeline, or when the open version exceeds the fixed version. A known
    /// injected version is clamped to the open version: a bug cannot be
    /// introduced after it was opened.
    #[must_use]
    pub fn resolve(raw: RawTicket, timeline: &Timeline) -> Option<Self> {
        let first = timeline.first()?;
        if raw.created < first.date {
            return None;
        }

        let open_version = timeline.version_for_date(raw.created)?;
        let fixed_version = timeline.version_for_date(raw.resolved)?;
        if open_version > fixed_version {
            return None;
        }

        let injected_version = raw
            .affected_version_ids
            .iter()
            .find_map(|id| timeline.index_of_id(id))
            .map(|iv| iv.min(open_version));

        Some(Self {
            key: raw.key,
            open_date: raw.created,
            fix_date: raw.resolved,
            injected_version,
            open_version,
            fixed_version,
        })
    }
}

/// Resolve all raw tickets, dropping the invalid ones, ordered by open date
#[must_use]
pub fn resolve_all(raws: Vec<RawTicket>, timeline: &Timeline) -> Vec<Ticket> {
    let mut tickets: Vec<Ticket> = raws
        .into_iter()
        .filter_map(|raw| Ticket::resolve(raw, timeline))
        .collect();
    tickets.sort_by_key(|t| t.open_date);
    tickets
}

/// Estimate the unknown injected versions with the Proportion heuristic
///
/// `p` is the mean, over tickets with a known injected version, of
/// `(FV - IV) / (FV - OV + 1)`; `p = 0` when no injected version is known.
/// Every unknown injected version becomes `round(FV - p * (FV - OV + 1))`,
/// clamped into `[1, OV]`.
///
/// Must run exactly once, after [`resolve_all`] (it needs the full known-IV
/// population) and before any bug-labeling query. A second run is a no-op:
/// only unknown injected versions are ever written.
pub fn apply_proportion(tickets: &mut [Ticket]) {
    let p = proportion(tickets);

    for t in tickets.iter_mut() {
        if t.injected_version.is_some() {
            continue;
        }
        let lifetime = (t.fixed_version - t.open_version + 1) as f64;
        let estimate = (t.fixed_version as f64 - p * lifetime).round().max(1.0);
        let estimate = (estimate as usize).min(t.open_version);
        t.injected_version = Some(estimate);
    }
}

/// Mean defect-lifetime ratio over the tickets with a known injected version
fn proportion(tickets: &[Ticket]) -> f64 {
    let mut sum = 0.0;
    let mut known = 0usize;

    for t in tickets {
        if let Some(iv) = t.injected_version {
            let fv = t.fixed_version;
            let ov = t.open_version;
            sum += (fv - iv) as f64 / (fv - ov + 1) as f64;
            known += 1;
        }
    }

    if known == 0 {
        return 0.0;
    }
    sum / known as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::RawRelease;

    fn timeline() -> Timeline {
        Timeline::build(vec![
            release("1", "R1", "2020-01-01"),
            release("2", "R2", "2020-06-01"),
            release("3", "R3", "2021-01-01"),
        ])
    }

    fn release(id: &str, name: &str, date: &str) -> RawRelease {
        RawRelease {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            date: Some(date.parse().unwrap()),
        }
    }

    fn date(s: &str) -> DateTime<Utc> {
        format!("{s}T00:00:00Z").parse().unwrap()
    }

    fn raw(key: &str, created: &str, resolved: &str, affected: &[&str]) -> RawTicket {
        RawTicket {
            key: key.to_string(),
            created: date(created),
            resolved: date(resolved),
            affected_version_ids: affected.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_resolve_places_open_and_fixed_versions() {
        let t = Ticket::resolve(raw("P-1", "2020-02-01", "2020-07-01", &[]), &timeline())
            .expect("retained");
        assert_eq!(t.open_version, 2);
        assert_eq!(t.fixed_version, 3);
        assert_eq!(t.injected_version, None);
    }

    #[test]
    fn test_resolve_discards_opened_before_first_release() {
        let t = Ticket::resolve(raw("P-1", "2019-12-01", "2020-07-01", &[]), &timeline());
        assert!(t.is_none());
    }

    #[test]
    fn test_resolve_discards_unplaceable_fix_date() {
        // Resolved after the last known release: fixed version unresolvable.
        let t = Ticket::resolve(raw("P-1", "2020-02-01", "2021-06-01", &[]), &timeline());
        assert!(t.is_none());
    }

    #[test]
    fn test_resolve_clamps_injected_to_open_version() {
        // Affected version R3 is later than the open version; clamp to it.
        let t = Ticket::resolve(raw("P-1", "2020-02-01", "2020-07-01", &["3"]), &timeline())
            .expect("retained");
        assert_eq!(t.injected_version, Some(2));
    }

    #[test]
    fn test_resolve_keeps_known_injected_version() {
        let t = Ticket::resolve(raw("P-1", "2020-07-01", "2020-12-01", &["1"]), &timeline())
            .expect("retained");
        assert_eq!(t.open_version, 3);
        assert_eq!(t.fixed_version, 3);
        assert_eq!(t.injected_version, Some(1));
    }

    #[test]
    fn test_resolve_ignores_unknown_affected_version_ids() {
        let t = Ticket::resolve(raw("P-1", "2020-02-01", "2020-07-01", &["99", "1"]), &timeline())
            .expect("retained");
        // First id naming a known release wins.
        assert_eq!(t.injected_version, Some(1));
    }

    #[test]
    fn test_resolve_all_sorted_by_open_date() {
        let tickets = resolve_all(
            vec![
                raw("P-2", "2020-07-01", "2020-12-01", &[]),
                raw("P-1", "2020-02-01", "2020-07-01", &[]),
            ],
            &timeline(),
        );
        let keys: Vec<&str> = tickets.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["P-1", "P-2"]);
    }

    #[test]
    fn test_proportion_zero_when_no_known_injected_version() {
        let mut tickets = resolve_all(
            vec![raw("P-1", "2020-02-01", "2020-07-01", &[])],
            &timeline(),
        );
        apply_proportion(&mut tickets);
        // p = 0, so IV = round(FV) clamped to OV.
        assert_eq!(tickets[0].injected_version, Some(2));
    }

    #[test]
    fn test_proportion_fills_unknown_injected_version() {
        let mut tickets = resolve_all(
            vec![
                // Known IV: (FV - IV) / (FV - OV + 1) = (3 - 1) / (3 - 3 + 1) = 2.0
                raw("P-1", "2020-07-01", "2020-12-01", &["1"]),
                // Unknown IV, OV = 2, FV = 3: IV = round(3 - 2.0 * 2) = -1 -> clamp to 1
                raw("P-2", "2020-02-01", "2020-07-01", &[]),
            ],
            &timeline(),
        );
        apply_proportion(&mut tickets);
        assert_eq!(tickets[1].injected_version, Some(1));
    }

    #[test]
    fn test_proportion_mean_is_order_independent() {
        let make = |order: &[&str]| {
            let raws: Vec<RawTicket> = order
                .iter()
                .map(|k| match *k {
                    "a" => raw("P-1", "2020-07-01", "2020-12-01", &["1"]),
                    "b" => raw("P-2", "2020-07-01", "2020-12-01", &["2"]),
                    _ => raw("P-3", "2020-02-01", "2020-07-01", &[]),
                })
                .collect();
            let mut tickets = resolve_all(raws, &timeline());
            apply_proportion(&mut tickets);
            tickets
                .iter()
                .find(|t| t.key == "P-3")
                .and_then(|t| t.injected_version)
        };
        assert_eq!(make(&["a", "b", "c"]), make(&["c", "b", "a"]));
    }

    #[test]
    fn test_proportion_idempotent_for_known_tickets() {
        let mut tickets = resolve_all(
            vec![
                raw("P-1", "2020-07-01", "2020-12-01", &["1"]),
                raw("P-2", "2020-02-01", "2020-07-01", &[]),
            ],
            &timeline(),
        );
        apply_proportion(&mut tickets);
        let snapshot = tickets.clone();
        apply_proportion(&mut tickets);
        assert_eq!(tickets, snapshot);
    }

    #[test]
    fn test_invariant_holds_after_proportion() {
        let mut tickets = resolve_all(
            vec![
                raw("P-1", "2020-07-01", "2020-12-01", &["1"]),
                raw("P-2", "2020-02-01", "2020-07-01", &[]),
                raw("P-3", "2019-12-31", "2020-07-01", &[]),
            ],
            &timeline(),
        );
        apply_proportion(&mut tickets);
        for t in &tickets {
            let iv = t.injected_version.expect("filled");
            assert!(1 <= iv, "{}: IV {iv} below 1", t.key);
            assert!(iv <= t.open_version, "{}: IV above OV", t.key);
            assert!(t.open_version <= t.fixed_version, "{}: OV above FV", t.key);
        }
    }
}
