//! Excavar CLI - Defect Dataset Mining for Software Analytics
//!
//! Mine a project's release history and bug tickets into a labeled
//! per-file, per-release feature table with walk-forward slices.

use clap::{Parser, Subcommand};

use excavar::dataset::{self, DatasetBuilder};
use excavar::sink::csv::{CsvMode, CsvSink};
use excavar::sink::DatasetSink;
use excavar::source::jira::JiraSource;
use excavar::source::TrackerSource;
use excavar::ticket::{self, Ticket};
use excavar::timeline::Timeline;
use excavar::vcs::git::GitCli;
use excavar::{AnalysisConfig, Error, Result};

/// Excavar - Defect Dataset Mining
#[derive(Parser)]
#[command(name = "excavar")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine the full dataset for a project
    Mine {
        /// Tracker project key (e.g. BOOKKEEPER)
        #[arg(short, long)]
        project: String,

        /// Path to the project's git working copy
        #[arg(short, long)]
        repo: String,

        /// Tracked file extension
        #[arg(short, long, default_value = ".java")]
        extension: String,

        /// Fraction of oldest releases to discard
        #[arg(short, long, default_value = "0.49")]
        discard: f64,

        /// Baseline branch restored after historical checkouts
        #[arg(short, long, default_value = "master")]
        baseline: String,

        /// Output directory for the CSV tables (default: the repo path)
        #[arg(short, long)]
        out: Option<String>,

        /// CSV locale mode (us, it)
        #[arg(long, default_value = "us")]
        csv_mode: String,

        /// Include files under test directories
        #[arg(long)]
        include_tests: bool,

        /// Jira base URL
        #[arg(long, default_value = excavar::source::jira::DEFAULT_BASE_URL)]
        jira_url: String,
    },

    /// Fetch and print the release timeline
    Releases {
        /// Tracker project key
        #[arg(short, long)]
        project: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: String,

        /// Jira base URL
        #[arg(long, default_value = excavar::source::jira::DEFAULT_BASE_URL)]
        jira_url: String,
    },

    /// Fetch, resolve and print the fixed-bug tickets
    Tickets {
        /// Tracker project key
        #[arg(short, long)]
        project: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: String,

        /// Jira base URL
        #[arg(long, default_value = excavar::source::jira::DEFAULT_BASE_URL)]
        jira_url: String,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Mine {
            project,
            repo,
            extension,
            discard,
            baseline,
            out,
            csv_mode,
            include_tests,
            jira_url,
        } => mine(
            &project,
            &repo,
            &extension,
            discard,
            &baseline,
            out.as_deref(),
            &csv_mode,
            include_tests,
            &jira_url,
        ),
        Commands::Releases {
            project,
            output,
            jira_url,
        } => {
            let timeline = fetch_timeline(&project, &jira_url)?;
            if output == "json" {
                let releases: Vec<_> = timeline.iter().collect();
                println!("{}", to_json(&releases)?);
            } else {
                for r in &timeline {
                    println!("{:>4}  {:<12} {}  {}", r.index, r.name, r.date.date_naive(), r.id);
                }
            }
            Ok(())
        }
        Commands::Tickets {
            project,
            output,
            jira_url,
        } => {
            let timeline = fetch_timeline(&project, &jira_url)?;
            let tickets = resolve_tickets(&project, &jira_url, &timeline)?;
            if output == "json" {
                println!("{}", to_json(&tickets)?);
            } else {
                for t in &tickets {
                    println!(
                        "{:<20} IV={} OV={} FV={}",
                        t.key,
                        t.injected_version.map_or_else(|| "?".to_string(), |v| v.to_string()),
                        t.open_version,
                        t.fixed_version
                    );
                }
            }
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn mine(
    project: &str,
    repo: &str,
    extension: &str,
    discard: f64,
    baseline: &str,
    out: Option<&str>,
    csv_mode: &str,
    include_tests: bool,
    jira_url: &str,
) -> Result<()> {
    let mode = parse_csv_mode(csv_mode)?;
    let timeline = fetch_timeline(project, jira_url)?;
    let tickets = resolve_tickets(project, jira_url, &timeline)?;
    println!(
        "{}: {} releases, {} fixed-bug tickets retained",
        project,
        timeline.len(),
        tickets.len()
    );

    let mut config = AnalysisConfig::new(project.to_uppercase())
        .extension(extension)
        .discard_fraction(discard)
        .show_progress(true);
    if include_tests {
        config = config.include_tests();
    }

    let mut git = GitCli::new(repo).baseline(baseline);
    let records = DatasetBuilder::new(&config, &timeline, &tickets, &mut git).build()?;
    let analyzed = dataset::versions_to_analyze(timeline.len(), discard);
    let defective = records.iter().filter(|r| r.is_defective).count();
    println!(
        "built {} records over {} releases ({} defective)",
        records.len(),
        analyzed,
        defective
    );

    let mut sink = CsvSink::new(out.unwrap_or(repo)).mode(mode);
    sink.write_releases(project, &timeline)?;
    sink.write_tickets(project, &tickets)?;
    sink.write_records(project, &records)?;
    sink.write_walk_forward(&records, analyzed)?;
    println!("tables written to {}", out.unwrap_or(repo));

    Ok(())
}

fn fetch_timeline(project: &str, jira_url: &str) -> Result<Timeline> {
    let source = JiraSource::with_base_url(jira_url);
    let timeline = Timeline::build(source.fetch_releases(project)?);
    if timeline.is_empty() {
        return Err(Error::Data(format!("project {project} has no dated releases")));
    }
    Ok(timeline)
}

fn resolve_tickets(project: &str, jira_url: &str, timeline: &Timeline) -> Result<Vec<Ticket>> {
    let source = JiraSource::with_base_url(jira_url);
    let mut tickets = ticket::resolve_all(source.fetch_fixed_bug_tickets(project)?, timeline);
    ticket::apply_proportion(&mut tickets);
    Ok(tickets)
}

fn parse_csv_mode(s: &str) -> Result<CsvMode> {
    match s.to_lowercase().as_str() {
        "us" => Ok(CsvMode::Us),
        "it" => Ok(CsvMode::It),
        other => Err(Error::Configuration(format!("unknown csv mode: {other}"))),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Data(format!("json encoding: {e}")))
}
