//! CLI interface for Krishi.
//!
//! Operator-facing commands over the ledger, the advisory store, and the
//! officer reports. Each subcommand is non-interactive: arguments in,
//! structured output out. Results go to stdout; failures go to stderr via
//! the caller and exit non-zero.

mod format;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use jiff::Zoned;
use jiff::civil::Date;

use crate::advisory::AdvisoryStore;
use crate::analytics::Aggregator;
use crate::gateway::{AdvisoryRequest, Gateway, SubsidyDecision};
use crate::ledger::Ledger;
use crate::model::{AdvisoryKind, FarmerProfile, Resolution};

use format::{format_advisory_line, format_bulk_outcome, format_priority_entry};

/// The wired-up components a CLI invocation runs against.
pub struct App {
    pub gateway: Gateway,
    pub aggregator: Aggregator,
    pub ledger: Arc<Ledger>,
    pub advisories: Arc<AdvisoryStore>,
}

/// Krishi — advisory lifecycle and integrity ledger.
#[derive(Debug, Parser)]
#[command(name = "krishi", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: issuing and tracking an advisory
  1. krishi advisory issue 9876500001 --kind pest --message "Spray neem oil within 2 days"
     → prints the advisory id (e.g. 12_9876500001)
  2. krishi advisory resolve 9876500001 12_9876500001 followed
  3. krishi report adoption
  4. krishi ledger verify

Reports:
  krishi report priority --profiles farmers.json --top 20
  krishi report crops --profiles farmers.json"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect the audit ledger: verify integrity, export records.
    Ledger {
        #[command(subcommand)]
        command: LedgerCommand,
    },

    /// Record subsidy-eligibility decisions on the ledger.
    Subsidy {
        #[command(subcommand)]
        command: SubsidyCommand,
    },

    /// Issue, resolve, and list advisories.
    Advisory {
        #[command(subcommand)]
        command: AdvisoryCommand,
    },

    /// Officer reports over advisory histories.
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum LedgerCommand {
    /// Verify the chain end-to-end. Exits non-zero on a broken chain.
    Verify,

    /// Export the full chain as JSON to `--out` (or stdout).
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SubsidyCommand {
    /// Record a subsidy-eligibility decision for a farmer.
    ///
    /// Only decisions granting at least one scheme reach the ledger.
    Record {
        subject: String,

        /// Land holding in acres.
        #[arg(long)]
        land: f64,

        #[arg(long, default_value = "General")]
        category: String,

        /// A scheme the farmer qualified for. Repeatable; none = ineligible.
        #[arg(long = "scheme")]
        schemes: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdvisoryCommand {
    /// Issue an advisory to one farmer. Prints the advisory id.
    Issue {
        subject: String,

        #[arg(long, value_enum)]
        kind: KindArg,

        #[arg(long)]
        message: String,

        /// Issue date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// Issue the same advisory to many farmers, reporting each outcome.
    Bulk {
        /// Target farmer. Repeatable.
        #[arg(long = "to", required = true)]
        subjects: Vec<String>,

        #[arg(long, value_enum)]
        kind: KindArg,

        #[arg(long)]
        message: String,

        /// Issue date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a farmer's outcome for a pending advisory.
    Resolve {
        subject: String,

        id: String,

        #[arg(value_enum)]
        outcome: OutcomeArg,
    },

    /// Show a farmer's most recent advisories, oldest first.
    History {
        subject: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Advisory adoption rate across all farmers.
    Adoption,

    /// Farmers needing attention, riskiest first.
    Priority {
        /// JSON file of farmer profiles (subject, location, cropType, riskScore).
        #[arg(long)]
        profiles: PathBuf,

        #[arg(long, default_value_t = 20)]
        top: usize,
    },

    /// Share of farmers per crop.
    Crops {
        /// JSON file of farmer profiles.
        #[arg(long)]
        profiles: PathBuf,
    },
}

/// CLI-facing advisory kind, mapped to the domain `AdvisoryKind`.
#[derive(Debug, Clone, ValueEnum)]
pub enum KindArg {
    Irrigation,
    Fertilizer,
    Pesticide,
    Weather,
    Pest,
}

impl KindArg {
    fn to_domain(&self) -> AdvisoryKind {
        match self {
            Self::Irrigation => AdvisoryKind::Irrigation,
            Self::Fertilizer => AdvisoryKind::Fertilizer,
            Self::Pesticide => AdvisoryKind::Pesticide,
            Self::Weather => AdvisoryKind::Weather,
            Self::Pest => AdvisoryKind::Pest,
        }
    }
}

/// CLI-facing outcome, mapped to the domain `Resolution`.
#[derive(Debug, Clone, ValueEnum)]
pub enum OutcomeArg {
    Followed,
    Ignored,
}

impl OutcomeArg {
    fn to_domain(&self) -> Resolution {
        match self {
            Self::Followed => Resolution::Followed,
            Self::Ignored => Resolution::Ignored,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(app: &App) -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Ledger { command } => match command {
            LedgerCommand::Verify => cmd_ledger_verify(app),
            LedgerCommand::Export { out } => cmd_ledger_export(app, out.as_deref()),
        },
        Command::Subsidy { command } => match command {
            SubsidyCommand::Record {
                subject,
                land,
                category,
                schemes,
            } => cmd_subsidy_record(app, subject, land, category, schemes),
        },
        Command::Advisory { command } => match command {
            AdvisoryCommand::Issue {
                subject,
                kind,
                message,
                date,
            } => cmd_advisory_issue(app, subject, &kind, message, date.as_deref()),
            AdvisoryCommand::Bulk {
                subjects,
                kind,
                message,
                date,
            } => cmd_advisory_bulk(app, &subjects, &kind, &message, date.as_deref()),
            AdvisoryCommand::Resolve {
                subject,
                id,
                outcome,
            } => cmd_advisory_resolve(app, &subject, &id, &outcome),
            AdvisoryCommand::History { subject, limit } => {
                cmd_advisory_history(app, &subject, limit)
            }
        },
        Command::Report { command } => match command {
            ReportCommand::Adoption => cmd_report_adoption(app),
            ReportCommand::Priority { profiles, top } => {
                cmd_report_priority(app, &profiles, top)
            }
            ReportCommand::Crops { profiles } => cmd_report_crops(app, &profiles),
        },
    }
}

fn cmd_ledger_verify(app: &App) -> Result<(), String> {
    if app.gateway.verify_ledger() {
        let records = app.ledger.snapshot().len();
        println!("ledger ok ({records} records)");
        Ok(())
    } else {
        Err("ledger verification FAILED — writes are refused until the log is repaired".into())
    }
}

fn cmd_ledger_export(app: &App, out: Option<&Path>) -> Result<(), String> {
    let chain = app.ledger.snapshot();
    let json = serde_json::to_string_pretty(&chain)
        .map_err(|e| format!("failed to serialize ledger: {e}"))?;

    match out {
        Some(path) => {
            fs::write(path, &json).map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Exported {} records → {}", chain.len(), path.display());
        }
        None => {
            println!("{json}");
        }
    }
    Ok(())
}

fn cmd_subsidy_record(
    app: &App,
    subject: String,
    land: f64,
    category: String,
    schemes: Vec<String>,
) -> Result<(), String> {
    let decision = SubsidyDecision {
        subject,
        land_acres: land,
        category,
        schemes,
    };
    let recorded = app
        .gateway
        .record_subsidy_check(&decision)
        .map_err(|e| format!("failed to record subsidy check: {e}"))?;

    match recorded {
        Some(record) => println!("recorded at index {}", record.index),
        None => println!("not eligible — nothing recorded"),
    }
    Ok(())
}

fn cmd_advisory_issue(
    app: &App,
    subject: String,
    kind: &KindArg,
    message: String,
    date: Option<&str>,
) -> Result<(), String> {
    let request = AdvisoryRequest {
        subject,
        kind: kind.to_domain(),
        message,
        issued_at: parse_date(date)?,
    };
    let record = app
        .gateway
        .issue_advisory(&request)
        .map_err(|e| format!("failed to issue advisory: {e}"))?;

    println!("{}", record.id);
    Ok(())
}

fn cmd_advisory_bulk(
    app: &App,
    subjects: &[String],
    kind: &KindArg,
    message: &str,
    date: Option<&str>,
) -> Result<(), String> {
    let outcomes = app
        .gateway
        .issue_bulk(subjects, kind.to_domain(), message, parse_date(date)?)
        .map_err(|e| format!("failed to send bulk advisory: {e}"))?;

    let sent = outcomes.iter().filter(|o| o.result.is_ok()).count();
    for outcome in &outcomes {
        println!("{}", format_bulk_outcome(outcome));
    }
    eprintln!("Sent {sent}/{} advisories", outcomes.len());
    Ok(())
}

fn cmd_advisory_resolve(
    app: &App,
    subject: &str,
    id: &str,
    outcome: &OutcomeArg,
) -> Result<(), String> {
    let record = app
        .gateway
        .resolve_advisory(subject, id, outcome.to_domain())
        .map_err(|e| format!("failed to resolve advisory: {e}"))?;

    println!("{} → {}", record.id, record.status);
    Ok(())
}

fn cmd_advisory_history(app: &App, subject: &str, limit: usize) -> Result<(), String> {
    let history = app.advisories.history(subject, limit);
    if history.is_empty() {
        println!("No advisories for {subject}");
        return Ok(());
    }
    for record in &history {
        println!("{}", format_advisory_line(record));
    }
    Ok(())
}

fn cmd_report_adoption(app: &App) -> Result<(), String> {
    println!("adoption rate: {:.1}%", app.aggregator.adoption_rate());
    Ok(())
}

fn cmd_report_priority(app: &App, profiles: &Path, top: usize) -> Result<(), String> {
    let profiles = load_profiles(profiles)?;
    let overview = app.aggregator.overview(&profiles, top);

    println!(
        "{} farmers, adoption {:.1}%",
        overview.total_farmers, overview.adoption_rate
    );
    if overview.priority.is_empty() {
        println!("No farmers need attention");
        return Ok(());
    }
    for entry in &overview.priority {
        println!("{}", format_priority_entry(entry));
    }
    Ok(())
}

fn cmd_report_crops(app: &App, profiles: &Path) -> Result<(), String> {
    let profiles = load_profiles(profiles)?;
    for (crop, share) in app.aggregator.crop_distribution(&profiles) {
        println!("{crop}  {share:.1}%");
    }
    Ok(())
}

/// Parses `--date`, defaulting to today in the system time zone.
fn parse_date(date: Option<&str>) -> Result<Date, String> {
    match date {
        Some(raw) => raw
            .parse::<Date>()
            .map_err(|e| format!("invalid --date: {e}")),
        None => Ok(Zoned::now().date()),
    }
}

/// Loads farmer profiles from a JSON file supplied by the enrollment layer.
fn load_profiles(path: &Path) -> Result<Vec<FarmerProfile>, String> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&json).map_err(|e| format!("invalid profiles at {}: {e}", path.display()))
}
