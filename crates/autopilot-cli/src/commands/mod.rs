//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `budget` - Budget derivation, month-to-date summary and goals
//! - `insights` - Spending patterns and upcoming events
//! - `simulate` - Forward projection
//! - `timemachine` - Counterfactual replays and the regret leaderboard
//! - `serve` - JSON API server
//!
//! Shared loading (records, settings, dates) lives here.

pub mod budget;
pub mod insights;
pub mod serve;
pub mod simulate;
pub mod timemachine;

// Re-export command functions for main.rs
pub use budget::*;
pub use insights::*;
pub use serve::*;
pub use simulate::*;
pub use timemachine::*;

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use autopilot_core::import::{load_dataset, load_income_csv, load_transactions_csv};
use autopilot_core::{Dataset, EngineSettings, Priority, RejectedRow};
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Where the records come from
#[derive(Debug, Clone, Default)]
pub struct RecordSources {
    pub transactions: Option<PathBuf>,
    pub income: Option<PathBuf>,
    pub dataset: Option<PathBuf>,
}

/// Everything an engine command needs
pub struct RunContext {
    pub records: Dataset,
    pub today: NaiveDate,
    pub settings: EngineSettings,
    pub json: bool,
}

pub fn load_settings(path: Option<&Path>) -> Result<EngineSettings> {
    match path {
        Some(path) => EngineSettings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => EngineSettings::load().context("Failed to load settings"),
    }
}

fn report_rejected(what: &str, rejected: &[RejectedRow]) {
    if rejected.is_empty() {
        return;
    }
    warn!(count = rejected.len(), "Skipped invalid {} rows", what);
    eprintln!("⚠️  Skipped {} invalid {} row(s)", rejected.len(), what);
    for row in rejected.iter().take(5) {
        eprintln!("   line {}: {}", row.line, row.reason);
    }
}

/// Load records from a dataset file, or from the transaction/income CSVs
pub fn load_records(sources: &RecordSources) -> Result<Dataset> {
    if let Some(path) = &sources.dataset {
        let report = load_dataset(path)
            .with_context(|| format!("Failed to load dataset {}", path.display()))?;
        report_rejected("transaction", &report.rejected_transactions);
        report_rejected("income", &report.rejected_income);
        return Ok(report.dataset);
    }

    if sources.transactions.is_none() && sources.income.is_none() {
        bail!("No records given. Pass --dataset, or --transactions and --income");
    }

    let mut dataset = Dataset::default();
    if let Some(path) = &sources.transactions {
        let report = load_transactions_csv(path)
            .with_context(|| format!("Failed to load transactions {}", path.display()))?;
        report_rejected("transaction", &report.rejected);
        dataset.transactions = report.records;
    }
    if let Some(path) = &sources.income {
        let report = load_income_csv(path)
            .with_context(|| format!("Failed to load income {}", path.display()))?;
        report_rejected("income", &report.rejected);
        dataset.income = report.records;
    }

    debug!(
        transactions = dataset.transactions.len(),
        income = dataset.income.len(),
        "Loaded records"
    );
    Ok(dataset)
}

fn parse_date(s: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date format (use YYYY-MM-DD)", flag))
}

/// The evaluation date: --today, or the local calendar date
pub fn resolve_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(s) => parse_date(s, "--today"),
        None => Ok(Local::now().date_naive()),
    }
}

/// A replay window; both ends or neither
pub fn resolve_range(from: Option<&str>, to: Option<&str>) -> Result<Option<(NaiveDate, NaiveDate)>> {
    match (from, to) {
        (Some(from), Some(to)) => {
            let from = parse_date(from, "--from")?;
            let to = parse_date(to, "--to")?;
            if from > to {
                bail!("--from {} is after --to {}", from, to);
            }
            Ok(Some((from, to)))
        }
        (None, None) => Ok(None),
        _ => bail!("--from and --to must be given together"),
    }
}

/// Priority from a flag, falling back to the configured default
pub fn resolve_priority(priority: Option<&str>, settings: &EngineSettings) -> Result<Priority> {
    match priority {
        Some(p) => p.parse().map_err(|e: String| anyhow::anyhow!(e)),
        None => Ok(settings.budget.default_priority),
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
