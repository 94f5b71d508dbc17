//! CSV dataset sink
//!
//! Writes, under one target directory:
//!
//! - `{Project}VersionsInfo.csv` — the release timeline
//! - `{Project}TicketInfo.csv` — the resolved tickets
//! - `{Project}Metrics.csv` — the full feature table, field order:
//!   version, file, size, LOC touched, LOC added, max LOC added,
//!   avg LOC added, churn, max churn, avg churn, NR, NF, defective
//! - `WalkForwardData/Training{k}.csv` / `Test{k}.csv` — per-release
//!   slices (file-name column dropped, US number format)
//!
//! Two locale modes mirror common spreadsheet expectations: `Us` uses a
//! comma separator with decimal points, `It` a semicolon separator with
//! decimal commas.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::DatasetSink;
use crate::dataset::{self, FileVersionRecord};
use crate::ticket::Ticket;
use crate::timeline::Timeline;
use crate::Result;

/// Subdirectory holding the per-release training/test slices
pub const WALK_FORWARD_DIR: &str = "WalkForwardData";

/// Separator and number locale of the emitted CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvMode {
    /// Comma separator, decimal point
    #[default]
    Us,
    /// Semicolon separator, decimal comma
    It,
}

impl CsvMode {
    fn separator(self) -> char {
        match self {
            Self::Us => ',',
            Self::It => ';',
        }
    }

    fn float(self, value: f64) -> String {
        let s = format!("{value}");
        match self {
            Self::Us => s,
            Self::It => s.replace('.', ","),
        }
    }
}

/// CSV implementation of [`DatasetSink`]
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    mode: CsvMode,
}

impl CsvSink {
    /// Create a sink writing under `dir` (created on demand)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            mode: CsvMode::default(),
        }
    }

    /// Set the locale mode of the main tables (slices are always US,
    /// they feed machine-learning tools)
    #[must_use]
    pub fn mode(mut self, mode: CsvMode) -> Self {
        self.mode = mode;
        self
    }

    fn write(&self, name: &str, content: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(name), content)?;
        Ok(())
    }

    fn metrics_header(separator: char, with_file: bool) -> String {
        let mut fields = vec![
            "Version",
            "FileName",
            "Size",
            "LOC_touched",
            "LOC_added",
            "MAX_LOC_added",
            "AVG_LOC_added",
            "Churn",
            "MAX_Churn",
            "AVG_Churn",
            "NR",
            "NF",
            "Bugged",
        ];
        if !with_file {
            fields.retain(|f| *f != "FileName");
        }
        let mut header = fields.join(&separator.to_string());
        header.push('\n');
        header
    }

    fn record_row(record: &FileVersionRecord, mode: CsvMode, with_file: bool) -> String {
        let sep = mode.separator();
        let mut row = String::new();
        let _ = write!(row, "{}{sep}", record.release_index + 1);
        if with_file {
            let _ = write!(row, "{}{sep}", record.path);
        }
        let _ = writeln!(
            row,
            "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
            record.size_loc,
            record.loc_touched,
            record.loc_added,
            record.max_loc_added,
            mode.float(record.avg_loc_added),
            record.churn,
            record.max_churn,
            mode.float(record.avg_churn),
            record.revision_count,
            record.fix_revision_count,
            record.is_defective,
        );
        row
    }

    fn slice_table(records: &[&FileVersionRecord]) -> String {
        let mut out = Self::metrics_header(CsvMode::Us.separator(), false);
        for record in records {
            out.push_str(&Self::record_row(record, CsvMode::Us, false));
        }
        out
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M").to_string()
}

impl DatasetSink for CsvSink {
    fn write_releases(&mut self, project: &str, timeline: &Timeline) -> Result<()> {
        let sep = self.mode.separator();
        let mut out = format!("Index{sep}Version ID{sep}Version Name{sep}Release Date\n");
        for release in timeline {
            let _ = writeln!(
                out,
                "{}{sep}{}{sep}{}{sep}{}",
                release.index,
                release.id,
                release.name,
                format_date(release.date)
            );
        }
        self.write(&format!("{project}VersionsInfo.csv"), &out)
    }

    fn write_tickets(&mut self, project: &str, tickets: &[Ticket]) -> Result<()> {
        let sep = self.mode.separator();
        let mut out = format!(
            "Ticket{sep}Open Date{sep}Resolution Date{sep}Injected Version{sep}\
             Open Version{sep}Fixed Version\n"
        );
        for t in tickets {
            // A ticket whose estimated window is empty carries no label
            // information; keep the row only when IV < FV or IV is unset.
            let injected = match t.injected_version {
                None => String::new(),
                Some(iv) if iv < t.fixed_version => iv.to_string(),
                Some(_) => continue,
            };
            let _ = writeln!(
                out,
                "{}{sep}{}{sep}{}{sep}{injected}{sep}{}{sep}{}",
                t.key,
                format_date(t.open_date),
                format_date(t.fix_date),
                t.open_version,
                t.fixed_version
            );
        }
        self.write(&format!("{project}TicketInfo.csv"), &out)
    }

    fn write_records(&mut self, project: &str, records: &[FileVersionRecord]) -> Result<()> {
        let mut out = Self::metrics_header(self.mode.separator(), true);
        for record in records {
            out.push_str(&Self::record_row(record, self.mode, true));
        }
        self.write(&format!("{project}Metrics.csv"), &out)
    }

    fn write_walk_forward(
        &mut self,
        records: &[FileVersionRecord],
        versions_to_analyze: usize,
    ) -> Result<()> {
        let dir = self.dir.join(WALK_FORWARD_DIR);
        fs::create_dir_all(&dir)?;

        for k in 0..versions_to_analyze {
            let training = Self::slice_table(&dataset::training_slice(records, k));
            fs::write(dir.join(format!("Training{}.csv", k + 1)), training)?;

            let test = Self::slice_table(&dataset::test_slice(records, k));
            fs::write(dir.join(format!("Test{}.csv", k + 1)), test)?;
        }
        Ok(())
    }
}
