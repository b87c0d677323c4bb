//! Autopilot Core Library
//!
//! Budget autopilot and financial simulation engine. Every operation is a
//! pure function of raw transaction/income records plus a little
//! configuration:
//! - Income estimation and category spending analysis
//! - Budget allocation with fixed, discretionary and protected splits
//! - Month-to-date tracking, safe-to-spend and savings goals
//! - Spending pattern detection (day-of-week, time-of-month, seasonal, impulse)
//! - Upcoming event detection (calendar, historical spikes, analyzed news)
//! - Scenario simulation
//! - Counterfactual "time machine" replays and a regret leaderboard
//! - Record loading from CSV and JSON

pub mod budget;
pub mod error;
pub mod events;
pub mod import;
pub mod insights;
pub mod models;
pub mod patterns;
pub mod settings;
pub mod simulation;
pub mod stats;
pub mod timemachine;

/// Record fixtures for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use budget::{
    calculate_budget_allocations, calculate_monthly_income, calculate_safe_to_spend,
    detect_recurring_bills, evaluate_goal, generate_budget_summary, initialize_budget,
    month_to_date, update_budget_with_spending, AllocationPlan, AutopilotConfig,
    BudgetInitialization, BudgetStatus, BudgetSummary, CategoryBudget, CategorySpending,
    GoalEvaluation, GoalStatus, MonthToDate, SafeToSpend, SavingsGoal, UpcomingBill,
};
pub use error::{Error, Result};
pub use events::{
    get_all_upcoming_events, AnalyzedNewsEvent, Confidence, CreateEventInput, DetectedEvent,
    EventSource, Urgency,
};
pub use import::{Dataset, DatasetReport, ImportReport, RejectedRow};
pub use insights::{Insight, Tone};
pub use models::{Category, IncomeRecord, MonthKey, Priority, Transaction};
pub use patterns::{analyze_all_patterns, top_spending_insights, PatternType, SpendingPattern};
pub use settings::EngineSettings;
pub use simulation::{run_simulation, SimulationInput, SimulationResult};
pub use timemachine::{Operation, OperationSet, RegretCandidate, TimeMachine};
