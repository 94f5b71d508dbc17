//! Ordered release timeline
//!
//! The timeline is the backbone index of the whole engine: every
//! version-range fact (open/fixed/injected versions, metric windows, walk
//! forward slices) is expressed as a 1-based index into this sequence, never
//! as a raw date, so comparisons stay integer and total-ordered.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A release entry as delivered by the tracker, before validation
///
/// Entries missing any of id, name or date are dropped by
/// [`Timeline::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRelease {
    /// Tracker-side version id
    pub id: Option<String>,
    /// Human-readable version name
    pub name: Option<String>,
    /// Release date (date-only in tracker payloads)
    pub date: Option<NaiveDate>,
}

/// A tagged point in the project's history, given a 1-based index by
/// chronological order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// 1-based position in the sorted timeline
    pub index: usize,
    /// Tracker-side version id
    pub id: String,
    /// Human-readable version name
    pub name: String,
    /// Release date, midnight UTC
    pub date: DateTime<Utc>,
}

/// Ordered, deduplicated sequence of releases
///
/// Immutable once built; created once per analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    releases: Vec<Release>,
}

impl Timeline {
    /// Build a timeline from raw tracker entries
    ///
    /// Entries without id, name and date are dropped; survivors are sorted
    /// ascending by date; duplicate dates collapse to the first-seen entry;
    /// each release gets a 1-based index equal to its sorted position.
    #[must_use]
    pub fn build(raw: Vec<RawRelease>) -> Self {
        let mut complete: Vec<(String, String, DateTime<Utc>)> = raw
            .into_iter()
            .filter_map(|r| match (r.id, r.name, r.date) {
                (Some(id), Some(name), Some(date)) => {
                    Some((id, name, date.and_hms_opt(0, 0, 0)?.and_utc()))
                }
                _ => None,
            })
            .collect();

        // Stable sort keeps the first-seen entry in front of its duplicates.
        complete.sort_by_key(|(_, _, date)| *date);

        let mut releases: Vec<Release> = Vec::with_capacity(complete.len());
        for (id, name, date) in complete {
            if releases.last().is_some_and(|prev: &Release| prev.date == date) {
                continue;
            }
            releases.push(Release {
                index: releases.len() + 1,
                id,
                name,
                date,
            });
        }

        Self { releases }
    }

    /// Number of releases
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Whether the timeline has no releases
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Release at a 0-based position
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Release> {
        self.releases.get(position)
    }

    /// Earliest release
    #[must_use]
    pub fn first(&self) -> Option<&Release> {
        self.releases.first()
    }

    /// Iterate over releases in chronological order
    pub fn iter(&self) -> std::slice::Iter<'_, Release> {
        self.releases.iter()
    }

    /// Version index (1-based) whose date interval contains `date`
    ///
    /// Returns `Some(1)` when `date` precedes the first release, otherwise
    /// the index of the release that ships after the event (`k + 1` for the
    /// first 0-based `k` whose date is strictly after `date`). Returns
    /// `None` when the event falls on or after the last release date and
    /// cannot be placed.
    #[must_use]
    pub fn version_for_date(&self, date: DateTime<Utc>) -> Option<usize> {
        let first = self.releases.first()?;
        if date < first.date {
            return Some(1);
        }
        self.releases
            .iter()
            .skip(1)
            .find(|r| date < r.date)
            .map(|r| r.index)
    }

    /// 1-based index of the release with the given tracker id
    #[must_use]
    pub fn index_of_id(&self, version_id: &str) -> Option<usize> {
        self.releases
            .iter()
            .find(|r| r.id == version_id)
            .map(|r| r.index)
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Release;
    type IntoIter = std::slice::Iter<'a, Release>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
