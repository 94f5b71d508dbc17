//! Excavar - Defect Dataset Mining for Software Analytics
//!
//! Excavar mines a source-controlled project's history into a labeled,
//! per-file, per-release defect dataset usable for defect-prediction
//! experiments. It reconstructs, from an ordered release timeline and a
//! stream of fixed-bug tickets, which released version of each source file
//! is defective, and computes change-history metrics (churn, revision
//! counts, fix counts) at each release boundary.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        EXCAVAR CORE                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Timeline  →  Ticket     →  Oracle    →  Dataset             │
//! │  (releases)   Resolver      (labels)     Builder             │
//! │                  │                          ↑                │
//! │                  └── Proportion      Metrics Aggregator      │
//! └──────────────────────────────────────────────────────────────┘
//!       ↑ source (Jira REST)      ↑ vcs (git CLI)     ↓ sink (CSV)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use excavar::dataset::DatasetBuilder;
//! use excavar::source::{jira::JiraSource, TrackerSource};
//! use excavar::timeline::Timeline;
//! use excavar::vcs::git::GitCli;
//! use excavar::AnalysisConfig;
//!
//! # fn main() -> excavar::Result<()> {
//! let source = JiraSource::new();
//! let timeline = Timeline::build(source.fetch_releases("BOOKKEEPER")?);
//! let mut tickets =
//!     excavar::ticket::resolve_all(source.fetch_fixed_bug_tickets("BOOKKEEPER")?, &timeline);
//! excavar::ticket::apply_proportion(&mut tickets);
//!
//! let config = AnalysisConfig::new("BOOKKEEPER");
//! let mut git = GitCli::new("/repos/bookkeeper");
//! let records = DatasetBuilder::new(&config, &timeline, &tickets, &mut git).build()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`timeline`] - Ordered release timeline with 1-based version indices
//! - [`ticket`] - Ticket resolution and the Proportion estimator
//! - [`oracle`] - Bug-label oracle (SZZ-style version-range containment)
//! - [`metrics`] - Per-window change-history metrics aggregation
//! - [`dataset`] - Walk-forward dataset builder and train/test slicing
//! - [`source`] - Release/ticket tracker seam (Jira REST implementation)
//! - [`vcs`] - Version-control reader seam (git CLI implementation)
//! - [`sink`] - Dataset sink seam (CSV implementation)

#![forbid(unsafe_code)]

pub mod dataset;
pub mod error;
pub mod metrics;
pub mod oracle;
pub mod sink;
pub mod source;
pub mod ticket;
pub mod timeline;
pub mod vcs;

pub use error::{Error, Result};

/// Default fraction of the oldest releases discarded before analysis
pub const DEFAULT_DISCARD_FRACTION: f64 = 0.49;

/// Configuration for one analysis session
///
/// Replaces any process-wide mutable state: the config, the timeline and the
/// resolved tickets are threaded explicitly through every call.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Tracker project key (e.g. `BOOKKEEPER`); uppercased for ticket-id
    /// matching in commit messages
    pub project: String,
    /// File extension of tracked sources, including the dot
    pub extension: String,
    /// Fraction of the oldest releases dropped to reduce noise from early,
    /// sparsely-tracked history
    pub discard_fraction: f64,
    /// Skip files under test directories when listing a snapshot
    pub exclude_tests: bool,
    /// Show a progress bar over the per-file metric loop
    pub show_progress: bool,
}

impl AnalysisConfig {
    /// Create a configuration for a project with default settings
    #[must_use]
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            extension: ".java".to_string(),
            discard_fraction: DEFAULT_DISCARD_FRACTION,
            exclude_tests: true,
            show_progress: false,
        }
    }

    /// Set the tracked file extension (including the dot)
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the discarded fraction of oldest releases
    #[must_use]
    pub fn discard_fraction(mut self, fraction: f64) -> Self {
        self.discard_fraction = fraction;
        self
    }

    /// Include files under test directories
    #[must_use]
    pub fn include_tests(mut self) -> Self {
        self.exclude_tests = false;
        self
    }

    /// Enable the progress bar
    #[must_use]
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AnalysisConfig::new("BOOKKEEPER");
        assert_eq!(config.project, "BOOKKEEPER");
        assert_eq!(config.extension, ".java");
        assert!((config.discard_fraction - 0.49).abs() < f64::EPSILON);
        assert!(config.exclude_tests);
        assert!(!config.show_progress);
    }

    #[test]
    fn test_config_builder() {
        let config = AnalysisConfig::new("AVRO")
            .extension(".rs")
            .discard_fraction(0.25)
            .include_tests()
            .show_progress(true);
        assert_eq!(config.extension, ".rs");
        assert!((config.discard_fraction - 0.25).abs() < f64::EPSILON);
        assert!(!config.exclude_tests);
        assert!(config.show_progress);
    }
}
