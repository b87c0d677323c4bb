//! Historical baseline for projections

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{add_months, Category, MonthKey, Transaction};

/// Half-over-half change needed before a category counts as trending
const TREND_THRESHOLD_PERCENT: f64 = 5.0;
const TOP_CATEGORY_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: Category,
    pub total_spent: f64,
    /// Rounded to whole dollars
    pub avg_monthly: f64,
    pub transactions: usize,
    pub trend: Trend,
    pub trend_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// e.g. "Mar 2024"
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalAnalysis {
    pub total_income: f64,
    pub total_expenses: f64,
    pub avg_monthly_expenses: f64,
    pub avg_monthly_savings: f64,
    /// Sorted by total spent, largest first
    pub category_breakdown: Vec<CategorySummary>,
    pub top_categories: Vec<Category>,
    pub monthly_trends: Vec<MonthlyTrend>,
}

/// Compare the mean of the first half of the months with the second half
fn trend_of(monthly: &[f64]) -> (Trend, f64) {
    if monthly.len() < 2 {
        return (Trend::Stable, 0.0);
    }
    let mid = monthly.len() / 2;
    let first = monthly[..mid].iter().sum::<f64>() / mid as f64;
    let second = monthly[mid..].iter().sum::<f64>() / (monthly.len() - mid) as f64;
    if first <= 0.0 {
        return (Trend::Stable, 0.0);
    }

    let percent = (second - first) / first * 100.0;
    let trend = if percent > TREND_THRESHOLD_PERCENT {
        Trend::Up
    } else if percent < -TREND_THRESHOLD_PERCENT {
        Trend::Down
    } else {
        Trend::Stable
    };
    (trend, percent.round())
}

/// Summarize spending over the trailing `history_months` window ending today
///
/// A category's average covers only the months it appears in. Trends compare
/// the first and second halves of those months. Monthly rows carry the given
/// steady `monthly_income`.
pub fn analyze_historical_data(
    transactions: &[Transaction],
    monthly_income: f64,
    history_months: u32,
    today: NaiveDate,
) -> HistoricalAnalysis {
    // A window reaching past the calendar covers all history
    let window_start = i32::try_from(history_months)
        .ok()
        .and_then(|m| add_months(today, -m).ok())
        .unwrap_or(NaiveDate::MIN);

    let mut monthly_expenses: BTreeMap<MonthKey, f64> = BTreeMap::new();
    let mut by_category: BTreeMap<&Category, (usize, BTreeMap<MonthKey, f64>)> = BTreeMap::new();

    for tx in transactions
        .iter()
        .filter(|tx| tx.date >= window_start && tx.date <= today)
    {
        *monthly_expenses.entry(tx.month()).or_insert(0.0) += tx.amount;

        let (count, months) = by_category.entry(&tx.category).or_default();
        *count += 1;
        *months.entry(tx.month()).or_insert(0.0) += tx.amount;
    }

    let mut category_breakdown: Vec<CategorySummary> = by_category
        .into_iter()
        .map(|(category, (count, months))| {
            let amounts: Vec<f64> = months.into_values().collect();
            let total: f64 = amounts.iter().sum();
            let (trend, trend_percent) = trend_of(&amounts);
            CategorySummary {
                category: category.clone(),
                total_spent: total,
                avg_monthly: (total / amounts.len().max(1) as f64).round(),
                transactions: count,
                trend,
                trend_percent,
            }
        })
        .collect();
    category_breakdown.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));

    let monthly_trends: Vec<MonthlyTrend> = monthly_expenses
        .iter()
        .map(|(month, expenses)| MonthlyTrend {
            month: month.label(),
            income: monthly_income,
            expenses: *expenses,
            savings: monthly_income - expenses,
        })
        .collect();

    let total_expenses: f64 = category_breakdown.iter().map(|c| c.total_spent).sum();
    let month_count = monthly_trends.len().max(1) as f64;
    let avg_monthly_expenses = total_expenses / month_count;

    HistoricalAnalysis {
        total_income: monthly_income * month_count,
        total_expenses,
        avg_monthly_expenses: avg_monthly_expenses.round(),
        avg_monthly_savings: (monthly_income - avg_monthly_expenses).round(),
        top_categories: category_breakdown
            .iter()
            .take(TOP_CATEGORY_COUNT)
            .map(|c| c.category.clone())
            .collect(),
        category_breakdown,
        monthly_trends,
    }
}
