//! Dataset sink seam
//!
//! The engine hands its output tables to a [`DatasetSink`]; persistence
//! format and downstream classifier evaluation are outside the core's
//! responsibility. The bundled implementation writes CSV ([`csv::CsvSink`]).

pub mod csv;

use crate::dataset::FileVersionRecord;
use crate::ticket::Ticket;
use crate::timeline::Timeline;
use crate::Result;

/// Consumer of the final tables of one analysis run
pub trait DatasetSink {
    /// Persist the release timeline
    fn write_releases(&mut self, project: &str, timeline: &Timeline) -> Result<()>;

    /// Persist the resolved tickets
    fn write_tickets(&mut self, project: &str, tickets: &[Ticket]) -> Result<()>;

    /// Persist the full per-file, per-release feature table
    fn write_records(&mut self, project: &str, records: &[FileVersionRecord]) -> Result<()>;

    /// Persist the walk-forward training/test slices
    fn write_walk_forward(
        &mut self,
        records: &[FileVersionRecord],
        versions_to_analyze: usize,
    ) -> Result<()>;
}
