//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Autopilot - Budget autopilot and financial simulator
#[derive(Parser)]
#[command(name = "autopilot")]
#[command(about = "Budget autopilot, spending insights and what-if simulation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Transactions CSV (date,name,category,amount[,id])
    #[arg(long, global = true)]
    pub transactions: Option<PathBuf>,

    /// Income CSV (date,amount)
    #[arg(long, global = true)]
    pub income: Option<PathBuf>,

    /// JSON dataset with `transactions` and `income` arrays
    ///
    /// Takes precedence over --transactions and --income.
    #[arg(long, global = true)]
    pub dataset: Option<PathBuf>,

    /// Engine settings file (defaults to the user override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Evaluate as of this date (YYYY-MM-DD, defaults to today)
    #[arg(long, global = true)]
    pub today: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Derive a budget from history
    Budget {
        /// Savings priority: aggressive, balanced, lifestyle
        #[arg(short, long)]
        priority: Option<String>,

        /// Extra categories to protect from cuts (repeatable)
        #[arg(long = "protect")]
        protect: Vec<String>,
    },

    /// Month-to-date budget summary with safe-to-spend
    Summary {
        /// Current account balance
        #[arg(short, long, default_value = "0")]
        balance: f64,

        /// Savings priority: aggressive, balanced, lifestyle
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Detect spending patterns
    Patterns {
        /// Number of patterns to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Upcoming calendar, historical and news events
    Events {
        /// Look-ahead window in days (defaults to settings)
        #[arg(short, long)]
        days: Option<u32>,

        /// JSON array of analyzed news events
        #[arg(long)]
        news: Option<PathBuf>,
    },

    /// Project balances forward under a scenario
    Simulate {
        /// Months to project
        #[arg(short, long, default_value = "12")]
        months: u32,

        /// Target savings rate in percent
        #[arg(long, default_value = "20")]
        savings_rate: f64,

        /// Income change in percent (e.g. -10)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        income_change: f64,

        /// Expense change in percent
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        expense_change: f64,

        /// Full scenario as JSON (overrides the flags above)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// JSON array of analyzed news events to fold into the scenario
        #[arg(long)]
        news: Option<PathBuf>,
    },

    /// Replay history with hypothetical edits
    Branch {
        /// JSON array of operations
        #[arg(long)]
        ops: PathBuf,

        /// First day of the replay window (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last day of the replay window (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Rank past decisions by what undoing them would have saved
    Regrets {
        /// Number of candidates (defaults to settings)
        #[arg(short, long)]
        limit: Option<usize>,

        /// First day of the replay window (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last day of the replay window (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Evaluate savings goals
    Goals {
        /// JSON array of savings goals
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Start the JSON API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
