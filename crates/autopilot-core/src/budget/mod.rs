//! Budget autopilot
//!
//! Turns income and transaction history into category allocations, then
//! tracks the current month against them. Everything here is recomputed from
//! the raw records on every call.

mod allocator;
mod analyzer;
mod goals;
mod income;
mod safe_to_spend;
mod tracker;

pub use allocator::{
    calculate_budget_allocations, plan_allocations, protected_categories, AllocationPlan,
};
pub use analyzer::{analyze_spending_by_category, is_fixed_category, FIXED_CATEGORIES};
pub use goals::{evaluate_goal, GoalEvaluation, GoalStatus, SavingsGoal};
pub use income::calculate_monthly_income;
pub use safe_to_spend::{
    calculate_safe_to_spend, detect_recurring_bills, SafeToSpend, UpcomingBill,
    DEFAULT_LOOK_AHEAD_DAYS,
};
pub use tracker::{generate_budget_summary, update_budget_with_spending};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use chrono::NaiveDate;

use crate::models::{Category, IncomeRecord, MonthKey, Priority, Transaction};

/// Rent and Insurance can never be reduced or reallocated
pub const ALWAYS_PROTECTED: &[&str] = &["Rent", "Insurance"];

/// Per-category spending statistics across all months of history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category: Category,
    pub total: f64,
    pub transactions: Vec<Transaction>,
    pub monthly_average: f64,
    pub variance: f64,
    pub is_fixed: bool,
}

/// Health of a category against its allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Healthy,
    Warning,
    Danger,
}

impl BudgetStatus {
    /// Percent used at which a category turns `warning` (inclusive)
    pub const WARNING_PERCENT: f64 = 75.0;
    /// Percent used at which a category turns `danger` (inclusive)
    pub const DANGER_PERCENT: f64 = 95.0;

    pub fn from_percent_used(percent_used: f64) -> Self {
        if percent_used >= Self::DANGER_PERCENT {
            Self::Danger
        } else if percent_used >= Self::WARNING_PERCENT {
            Self::Warning
        } else {
            Self::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BudgetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthy" => Ok(Self::Healthy),
            "warning" => Ok(Self::Warning),
            "danger" => Ok(Self::Danger),
            _ => Err(format!("Unknown budget status: {}", s)),
        }
    }
}

/// One category's allocation and current-month progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBudget {
    pub category: Category,
    pub allocated: f64,
    pub spent: f64,
    pub remaining: f64,
    pub percent_used: f64,
    pub is_fixed: bool,
    pub status: BudgetStatus,
}

/// User-level autopilot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutopilotConfig {
    pub priority: Priority,
    #[serde(default = "default_true")]
    pub auto_adjust_enabled: bool,
    #[serde(default)]
    pub non_negotiable_categories: Vec<Category>,
    pub monthly_income: f64,
    pub savings_target_percentage: f64,
}

fn default_true() -> bool {
    true
}

impl AutopilotConfig {
    pub fn new(priority: Priority, monthly_income: f64, non_negotiables: &[Category]) -> Self {
        Self {
            priority,
            auto_adjust_enabled: true,
            non_negotiable_categories: protected_categories(non_negotiables),
            monthly_income,
            savings_target_percentage: priority.savings_rate() * 100.0,
        }
    }
}

/// Month-level rollup of the category budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    /// YYYY-MM
    pub month: String,
    pub total_income: f64,
    pub fixed_costs: f64,
    pub savings_target: f64,
    pub savings_actual: f64,
    pub total_budget: f64,
    pub total_spent: f64,
    pub safe_to_spend: f64,
    pub days_remaining: u32,
    pub category_budgets: Vec<CategoryBudget>,
}

/// Result of setting up the autopilot for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetInitialization {
    pub config: AutopilotConfig,
    pub plan: AllocationPlan,
}

/// Derive config and allocations from raw history
pub fn initialize_budget(
    transactions: &[Transaction],
    income: &[IncomeRecord],
    priority: Priority,
    non_negotiables: &[Category],
) -> BudgetInitialization {
    let config = AutopilotConfig::new(priority, calculate_monthly_income(income), non_negotiables);
    let spending = analyze_spending_by_category(transactions);
    let plan = plan_allocations(
        config.monthly_income,
        &spending,
        priority,
        &config.non_negotiable_categories,
    );

    debug!(
        income = config.monthly_income,
        categories = plan.budgets.len(),
        priority = %priority,
        "Initialized budget"
    );

    BudgetInitialization { config, plan }
}

/// The current month tracked against allocations derived from history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthToDate {
    pub summary: BudgetSummary,
    pub safe_to_spend: SafeToSpend,
    /// Recurring bills due by the end of next month
    pub upcoming_bills: Vec<UpcomingBill>,
}

/// Initialize, apply this month's spending up to `today`, then summarize
///
/// Bills still due this month are reserved in the summary; safe-to-spend
/// reserves the bills due within the default look-ahead window.
pub fn month_to_date(
    transactions: &[Transaction],
    income: &[IncomeRecord],
    priority: Priority,
    non_negotiables: &[Category],
    account_balance: f64,
    today: NaiveDate,
) -> MonthToDate {
    let init = initialize_budget(transactions, income, priority, non_negotiables);
    let month = MonthKey::from_date(today);

    let current: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| tx.month() == month && tx.date <= today)
        .cloned()
        .collect();
    let budgets = update_budget_with_spending(&init.plan.budgets, &current);

    let upcoming_bills = detect_recurring_bills(transactions, today);
    let due_this_month: f64 = upcoming_bills
        .iter()
        .filter(|bill| MonthKey::from_date(bill.due_date) == month)
        .map(|bill| bill.amount)
        .sum();

    let summary = generate_budget_summary(
        &init.config,
        &budgets,
        account_balance,
        due_this_month,
        today,
    );
    let safe_to_spend = calculate_safe_to_spend(
        account_balance,
        summary.total_budget,
        summary.total_spent,
        &upcoming_bills,
        DEFAULT_LOOK_AHEAD_DAYS,
        today,
    );

    MonthToDate {
        summary,
        safe_to_spend,
        upcoming_bills,
    }
}
