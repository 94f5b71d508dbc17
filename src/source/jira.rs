//! Jira REST tracker source
//!
//! Queries the Jira REST API v2: `project/{KEY}` for the version list and
//! the paginated `search` endpoint for fixed-bug tickets (1000 per page,
//! the server-side cap). Any transport failure or unexpected payload shape
//! is a fatal [`Error::Source`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::TrackerSource;
use crate::ticket::RawTicket;
use crate::timeline::RawRelease;
use crate::{Error, Result};

/// Default Jira instance (Apache Software Foundation projects)
pub const DEFAULT_BASE_URL: &str = "https://issues.apache.org/jira/rest/api/2";

const PAGE_SIZE: usize = 1000;

/// Tracker source backed by a Jira REST endpoint
#[derive(Debug, Clone)]
pub struct JiraSource {
    base_url: String,
}

impl Default for JiraSource {
    fn default() -> Self {
        Self::new()
    }
}

impl JiraSource {
    /// Create a source against the default Apache Jira instance
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a source against a custom Jira base URL
    /// (e.g. `https://jira.example.org/rest/api/2`)
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        ureq::get(url)
            .call()
            .map_err(|e| Error::Source(format!("request to {url} failed: {e}")))?
            .into_json()
            .map_err(|e| Error::Source(format!("malformed payload from {url}: {e}")))
    }

    fn search_url(&self, project: &str, start_at: usize) -> String {
        format!(
            "{}/search?jql=project=%22{}%22AND%22issueType%22=%22Bug%22AND\
             (%22status%22=%22closed%22OR%22status%22=%22resolved%22)AND\
             %22resolution%22=%22fixed%22&fields=key,resolutiondate,versions,created\
             &startAt={start_at}&maxResults={PAGE_SIZE}",
            self.base_url, project
        )
    }
}

impl TrackerSource for JiraSource {
    fn fetch_releases(&self, project: &str) -> Result<Vec<RawRelease>> {
        let url = format!("{}/project/{}", self.base_url, project.to_uppercase());
        let payload: ProjectPayload = self.get(&url)?;
        Ok(payload.versions.into_iter().map(RawRelease::from).collect())
    }

    fn fetch_fixed_bug_tickets(&self, project: &str) -> Result<Vec<RawTicket>> {
        let mut tickets = Vec::new();
        let mut start_at = 0usize;

        loop {
            let payload: SearchPayload = self.get(&self.search_url(project, start_at))?;
            let page_len = payload.issues.len();
            tickets.extend(payload.issues.into_iter().filter_map(issue_to_raw));

            start_at += page_len;
            if start_at >= payload.total || page_len == 0 {
                break;
            }
        }

        Ok(tickets)
    }
}

/// Ticket with parseable creation and resolution timestamps, or `None`
fn issue_to_raw(issue: IssuePayload) -> Option<RawTicket> {
    let created = parse_jira_datetime(issue.fields.created.as_deref()?)?;
    let resolved = parse_jira_datetime(issue.fields.resolution_date.as_deref()?)?;
    Some(RawTicket {
        key: issue.key,
        created,
        resolved,
        affected_version_ids: issue
            .fields
            .versions
            .into_iter()
            .filter_map(|v| v.id)
            .collect(),
    })
}

/// Jira timestamps look like `2020-02-01T10:30:00.000+0000`
fn parse_jira_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
struct ProjectPayload {
    #[serde(default)]
    versions: Vec<VersionPayload>,
}

#[derive(Debug, Deserialize)]
struct VersionPayload {
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "releaseDate")]
    release_date: Option<String>,
}

impl From<VersionPayload> for RawRelease {
    fn from(v: VersionPayload) -> Self {
        Self {
            id: v.id,
            name: v.name,
            date: v
                .release_date
                .and_then(|d| d.parse::<NaiveDate>().ok()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    issues: Vec<IssuePayload>,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    key: String,
    fields: FieldsPayload,
}

#[derive(Debug, Deserialize)]
struct FieldsPayload {
    created: Option<String>,
    #[serde(rename = "resolutiondate")]
    resolution_date: Option<String>,
    #[serde(default)]
    versions: Vec<VersionPayload>,
}
