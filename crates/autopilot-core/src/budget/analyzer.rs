//! Per-category spending analysis

use std::collections::BTreeMap;

use tracing::debug;

use super::CategorySpending;
use crate::models::{Category, MonthKey, Transaction};
use crate::stats::{mean, variance};

/// Categories that are always treated as fixed costs
pub const FIXED_CATEGORIES: &[&str] = &["Rent", "Insurance", "Utilities", "Subscriptions"];

/// Variance below this share of the monthly average marks a category fixed
const LOW_VARIANCE_RATIO: f64 = 0.1;

pub fn is_fixed_category(category: &Category) -> bool {
    FIXED_CATEGORIES.iter().any(|fixed| category == fixed)
}

/// Group transactions by category and compute monthly statistics
///
/// The monthly average is taken over the distinct months in which the
/// category has spending, and the variance is the population variance of
/// those monthly totals. Output is ordered by category name.
pub fn analyze_spending_by_category(transactions: &[Transaction]) -> Vec<CategorySpending> {
    let mut by_category: BTreeMap<&Category, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        by_category.entry(&tx.category).or_default().push(tx);
    }

    let analysis: Vec<CategorySpending> = by_category
        .into_iter()
        .map(|(category, txs)| {
            let total: f64 = txs.iter().map(|tx| tx.amount).sum();

            let mut monthly: BTreeMap<MonthKey, f64> = BTreeMap::new();
            for tx in &txs {
                *monthly.entry(tx.month()).or_insert(0.0) += tx.amount;
            }
            let monthly_totals: Vec<f64> = monthly.into_values().collect();

            let monthly_average = mean(&monthly_totals);
            let variance = variance(&monthly_totals);
            let is_fixed = is_fixed_category(category)
                || (monthly_average > 0.0 && variance < monthly_average * LOW_VARIANCE_RATIO);

            CategorySpending {
                category: category.clone(),
                total,
                transactions: txs.into_iter().cloned().collect(),
                monthly_average,
                variance,
                is_fixed,
            }
        })
        .collect();

    debug!(
        transactions = transactions.len(),
        categories = analysis.len(),
        "Analyzed spending by category"
    );

    analysis
}
