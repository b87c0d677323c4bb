//! Current-month tracking against allocations

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use super::{AutopilotConfig, BudgetStatus, BudgetSummary, CategoryBudget};
use crate::models::{Category, MonthKey, Transaction};
use crate::stats::round2;

/// Recompute spent, remaining, percent used and status for each budget
///
/// Transactions in categories without a budget are ignored.
pub fn update_budget_with_spending(
    budgets: &[CategoryBudget],
    current_month: &[Transaction],
) -> Vec<CategoryBudget> {
    let mut spent_by_category: HashMap<&Category, f64> = HashMap::new();
    for tx in current_month {
        *spent_by_category.entry(&tx.category).or_insert(0.0) += tx.amount;
    }

    budgets
        .iter()
        .map(|budget| {
            let spent = round2(
                spent_by_category
                    .get(&budget.category)
                    .copied()
                    .unwrap_or(0.0),
            );
            let percent_used = if budget.allocated > 0.0 {
                spent / budget.allocated * 100.0
            } else {
                0.0
            };

            CategoryBudget {
                spent,
                remaining: budget.allocated - spent,
                percent_used,
                status: BudgetStatus::from_percent_used(percent_used),
                ..budget.clone()
            }
        })
        .collect()
}

/// Roll the category budgets up into a month summary as of `today`
pub fn generate_budget_summary(
    config: &AutopilotConfig,
    budgets: &[CategoryBudget],
    account_balance: f64,
    upcoming_bills: f64,
    today: NaiveDate,
) -> BudgetSummary {
    let month = MonthKey::from_date(today);
    let days_remaining = month.days_in_month().saturating_sub(today.day());

    let total_budget: f64 = budgets.iter().map(|b| b.allocated).sum();
    let total_spent: f64 = budgets.iter().map(|b| b.spent).sum();
    let fixed_costs: f64 = budgets
        .iter()
        .filter(|b| b.is_fixed)
        .map(|b| b.allocated)
        .sum();

    let savings_target = config.monthly_income * config.savings_target_percentage / 100.0;
    let savings_actual = (config.monthly_income - total_spent - fixed_costs).max(0.0);

    let daily_budget = if days_remaining > 0 {
        (total_budget - total_spent) / days_remaining as f64
    } else {
        0.0
    };
    let safe_to_spend = round2((account_balance - upcoming_bills - daily_budget).max(0.0));

    debug!(
        month = %month,
        total_budget,
        total_spent,
        safe_to_spend,
        days_remaining,
        "Generated budget summary"
    );

    BudgetSummary {
        month: month.to_string(),
        total_income: config.monthly_income,
        fixed_costs,
        savings_target,
        savings_actual,
        total_budget,
        total_spent,
        safe_to_spend,
        days_remaining,
        category_budgets: budgets.to_vec(),
    }
}
