//! Autopilot CLI - Budget autopilot and financial simulator
//!
//! Usage:
//!   autopilot --dataset data.json budget           Derive a budget
//!   autopilot --dataset data.json summary -b 2500  Month-to-date summary
//!   autopilot --dataset data.json simulate -m 12   Project balances
//!   autopilot serve --port 3000                    Start the JSON API

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let settings = commands::load_settings(cli.config.as_deref())?;
    let sources = commands::RecordSources {
        transactions: cli.transactions.clone(),
        income: cli.income.clone(),
        dataset: cli.dataset.clone(),
    };
    let today = cli.today.clone();
    let json = cli.json;

    // Records are only needed by the engine commands, not by `serve`
    let context = || -> Result<commands::RunContext> {
        Ok(commands::RunContext {
            records: commands::load_records(&sources)?,
            today: commands::resolve_today(today.as_deref())?,
            settings: settings.clone(),
            json,
        })
    };

    match cli.command {
        Commands::Serve { port, host } => commands::cmd_serve(settings.clone(), &host, port).await,
        Commands::Budget { priority, protect } => {
            commands::cmd_budget(&context()?, priority.as_deref(), &protect)
        }
        Commands::Summary { balance, priority } => {
            commands::cmd_summary(&context()?, balance, priority.as_deref())
        }
        Commands::Patterns { limit } => commands::cmd_patterns(&context()?, limit),
        Commands::Events { days, news } => {
            commands::cmd_events(&context()?, days, news.as_deref())
        }
        Commands::Simulate {
            months,
            savings_rate,
            income_change,
            expense_change,
            scenario,
            news,
        } => {
            let input = match scenario {
                Some(path) => commands::read_json(&path)?,
                None => {
                    let mut input = autopilot_core::SimulationInput::new(months, savings_rate);
                    input.income_change_percent = income_change;
                    input.expense_change_percent = expense_change;
                    input
                }
            };
            commands::cmd_simulate(&context()?, input, news.as_deref())
        }
        Commands::Branch { ops, from, to } => {
            let range = commands::resolve_range(from.as_deref(), to.as_deref())?;
            commands::cmd_branch(&context()?, &ops, range)
        }
        Commands::Regrets { limit, from, to } => {
            let range = commands::resolve_range(from.as_deref(), to.as_deref())?;
            commands::cmd_regrets(&context()?, limit, range)
        }
        Commands::Goals { file } => commands::cmd_goals(&context()?, &file),
    }
}
