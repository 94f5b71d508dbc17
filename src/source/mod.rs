//! Release/ticket tracker seam
//!
//! The engine consumes tracker data through [`TrackerSource`] only; the
//! one production implementation talks to the Jira REST API
//! ([`jira::JiraSource`]), tests substitute canned data.
//!
//! A source failure is fatal to the run and never retried: network
//! flakiness is not compensated automatically.

pub mod jira;

use crate::ticket::RawTicket;
use crate::timeline::RawRelease;
use crate::Result;

/// Blocking access to a project's release and fixed-bug-ticket records
pub trait TrackerSource {
    /// All release entries of the project, possibly incomplete
    fn fetch_releases(&self, project: &str) -> Result<Vec<RawRelease>>;

    /// All closed/resolved tickets of type Bug with resolution Fixed
    fn fetch_fixed_bug_tickets(&self, project: &str) -> Result<Vec<RawTicket>>;
}
