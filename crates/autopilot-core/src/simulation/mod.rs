//! Scenario simulator
//!
//! Projects income, expenses, savings and cash balance forward month by
//! month from a historical baseline. The caller's scenario adjusts the
//! baseline with percentage deltas, one-off or recurring custom events and
//! category-scoped news impacts.

mod history;

pub use history::{analyze_historical_data, CategorySummary, HistoricalAnalysis, MonthlyTrend, Trend};

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::budget::calculate_monthly_income;
use crate::error::{Error, Result};
use crate::insights::{Insight, Tone};
use crate::models::{Category, IncomeRecord, MonthKey, Transaction};
use crate::settings::SimulationSettings;
use crate::stats::{mean, std_dev};

/// Longest projection accepted
pub const MAX_MONTHS: u32 = 120;
/// Share of the historical trend carried into the projection
const TREND_CARRY: f64 = 0.5;
/// Projected vs historical expenses must differ by more than this to be reported
const EXPENSE_CHANGE_INSIGHT_PERCENT: f64 = 10.0;
const NEWS_INSIGHT_MIN_MONTHLY: f64 = 100.0;
const STRONG_BALANCE: f64 = 20000.0;
/// Risk score weights: negative-balance share and expense volatility
const RISK_NEGATIVE_WEIGHT: f64 = 70.0;
const RISK_VOLATILITY_WEIGHT: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactKind {
    Income,
    Expense,
}

/// A percentage change to one category (or income) over a span of months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsImpact {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub impact_type: ImpactKind,
    /// Signed, e.g. 5.0 for +5%
    pub impact_percent: f64,
    /// First projection month affected, 1-based
    pub effective_month: u32,
    pub duration: u32,
    pub description: String,
}

impl NewsImpact {
    fn active_in(&self, month: u32) -> bool {
        month >= self.effective_month && month < self.effective_month + self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationEventKind {
    Income,
    Expense,
    Subscription,
    OneTime,
}

impl SimulationEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationEventKind::Income => "income",
            SimulationEventKind::Expense => "expense",
            SimulationEventKind::Subscription => "subscription",
            SimulationEventKind::OneTime => "one-time",
        }
    }
}

impl fmt::Display for SimulationEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-defined cash event
///
/// Applies every month when `recurring`, otherwise in `month` (1-based), or
/// in the first month when no month is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: SimulationEventKind,
    pub description: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
}

impl SimulationEvent {
    fn applies_in(&self, month: u32) -> bool {
        match self.month {
            _ if self.recurring => true,
            Some(m) => m == month,
            None => month == 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInput {
    #[serde(default)]
    pub income_change_percent: f64,
    #[serde(default)]
    pub expense_change_percent: f64,
    pub savings_rate_percent: f64,
    #[serde(default)]
    pub custom_events: Vec<SimulationEvent>,
    #[serde(default)]
    pub news_impacts: Vec<NewsImpact>,
    pub months: u32,
}

impl SimulationInput {
    pub fn new(months: u32, savings_rate_percent: f64) -> Self {
        Self {
            income_change_percent: 0.0,
            expense_change_percent: 0.0,
            savings_rate_percent,
            custom_events: Vec::new(),
            news_impacts: Vec::new(),
            months,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.months == 0 || self.months > MAX_MONTHS {
            return Err(Error::InvalidData(format!(
                "months must be between 1 and {}, got {}",
                MAX_MONTHS, self.months
            )));
        }
        if !(0.0..=100.0).contains(&self.savings_rate_percent) {
            return Err(Error::InvalidData(format!(
                "savingsRatePercent must be between 0 and 100, got {}",
                self.savings_rate_percent
            )));
        }
        let values = [self.income_change_percent, self.expense_change_percent];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData("change percentages must be finite".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProjection {
    /// 1-based
    pub month: u32,
    pub month_name: String,
    pub income: f64,
    pub expenses: f64,
    pub savings: f64,
    /// Cumulative cash balance at month end
    pub balance: f64,
    pub events: Vec<String>,
    pub news_effects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationBreakdown {
    pub category: Category,
    pub base_amount: f64,
    pub adjusted_amount: f64,
    pub change_percent: f64,
    /// Monthly effect of all expense news for this category while active
    pub news_impact: f64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalComparison {
    pub avg_monthly_expenses_before: f64,
    pub avg_monthly_expenses_after: f64,
    pub savings_rate_change: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// False when there was no data to project from; every number is zero
    pub connected: bool,
    pub projections: Vec<MonthlyProjection>,
    pub breakdown: Vec<SimulationBreakdown>,
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_savings: f64,
    pub end_balance: f64,
    /// Percent of the savings goal reached, capped at 100
    pub goal_progress: f64,
    /// 0-100
    pub risk_score: f64,
    pub insights: Vec<Insight>,
    pub timeline: Vec<String>,
    pub historical_comparison: HistoricalComparison,
}

impl SimulationResult {
    /// The zeroed result for a user with no records
    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// Risk from the share of negative-balance months and expense volatility
///
/// Non-decreasing in both the number of negative months and the coefficient
/// of variation of monthly expenses.
pub fn risk_score(negative_months: usize, months: usize, monthly_expenses: &[f64]) -> f64 {
    if months == 0 {
        return 0.0;
    }
    let negative_share = negative_months as f64 / months as f64;
    let average = mean(monthly_expenses);
    let cv = if average > 0.0 {
        std_dev(monthly_expenses) / average
    } else {
        0.0
    };
    (RISK_NEGATIVE_WEIGHT * negative_share + RISK_VOLATILITY_WEIGHT * cv.min(1.0)).round()
}

fn signed_dollars(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "+" };
    format!("{}${:.0}", sign, amount.abs())
}

fn expense_news<'a>(
    impacts: &'a [NewsImpact],
    category: &'a Category,
) -> impl Iterator<Item = &'a NewsImpact> + 'a {
    impacts
        .iter()
        .filter(move |n| n.impact_type == ImpactKind::Expense && &n.category == category)
}

/// Per-category baseline with trend and user delta applied
struct CategoryProjection {
    category: Category,
    adjusted: f64,
}

/// Run a scenario against the user's history
///
/// The baseline income is the estimated steady monthly income of
/// `income_records`; the baseline expenses come from the trailing
/// `history_months` of `transactions`. Returns [`SimulationResult::disconnected`]
/// when both are empty.
pub fn run_simulation(
    input: &SimulationInput,
    transactions: &[Transaction],
    income_records: &[IncomeRecord],
    settings: &SimulationSettings,
    today: NaiveDate,
) -> Result<SimulationResult> {
    input.validate()?;

    if transactions.is_empty() && income_records.is_empty() {
        debug!("No records to simulate from");
        return Ok(SimulationResult::disconnected());
    }

    let monthly_income = calculate_monthly_income(income_records);
    let historical =
        analyze_historical_data(transactions, monthly_income, settings.history_months, today);

    let mut breakdown = Vec::with_capacity(historical.category_breakdown.len());
    let mut categories = Vec::with_capacity(historical.category_breakdown.len());
    for summary in &historical.category_breakdown {
        let base = summary.avg_monthly;
        let trend_adjustment = match summary.trend {
            Trend::Up | Trend::Down => 1.0 + summary.trend_percent / 100.0 * TREND_CARRY,
            Trend::Stable => 1.0,
        };
        let adjusted = base * trend_adjustment * (1.0 + input.expense_change_percent / 100.0);
        let news_impact: f64 = expense_news(&input.news_impacts, &summary.category)
            .map(|n| adjusted * n.impact_percent / 100.0)
            .sum();

        breakdown.push(SimulationBreakdown {
            category: summary.category.clone(),
            base_amount: base.round(),
            adjusted_amount: adjusted.round(),
            change_percent: if base > 0.0 {
                ((adjusted - base) / base * 100.0).round()
            } else {
                0.0
            },
            news_impact: news_impact.round(),
            total_amount: (adjusted + news_impact).round(),
        });
        categories.push(CategoryProjection {
            category: summary.category.clone(),
            adjusted,
        });
    }

    let start = MonthKey::from_date(today);
    let mut projections = Vec::with_capacity(input.months as usize);
    let mut timeline = Vec::new();
    let mut monthly_expense_totals = Vec::with_capacity(input.months as usize);
    let mut balance = settings.starting_balance;
    let mut total_income = 0.0;
    let mut total_expenses = 0.0;
    let mut total_savings = 0.0;
    let mut negative_months = 0;

    for m in 1..=input.months {
        let mut events = Vec::new();
        let mut news_effects = Vec::new();

        let mut income = monthly_income * (1.0 + input.income_change_percent / 100.0);
        for news in input
            .news_impacts
            .iter()
            .filter(|n| n.impact_type == ImpactKind::Income && n.active_in(m))
        {
            let impact = income * news.impact_percent / 100.0;
            income += impact;
            if m == news.effective_month {
                news_effects.push(format!("{}: {}/mo", news.title, signed_dollars(impact)));
                timeline.push(format!("Month {}: {} takes effect", m, news.title));
            }
        }

        let mut expenses = 0.0;
        for projection in &categories {
            let mut amount = projection.adjusted;
            for news in expense_news(&input.news_impacts, &projection.category).filter(|n| n.active_in(m)) {
                let impact = projection.adjusted * news.impact_percent / 100.0;
                amount += impact;
                if m == news.effective_month {
                    news_effects.push(format!(
                        "{}: {}/mo on {}",
                        news.title,
                        signed_dollars(impact),
                        projection.category
                    ));
                    timeline.push(format!(
                        "Month {}: {} impacts {}",
                        m, news.title, projection.category
                    ));
                }
            }
            expenses += amount;
        }

        for event in input.custom_events.iter().filter(|e| e.applies_in(m)) {
            match event.event_type {
                SimulationEventKind::Income => income += event.amount,
                SimulationEventKind::Expense
                | SimulationEventKind::Subscription
                | SimulationEventKind::OneTime => expenses += event.amount,
            }
            events.push(format!("{}: {}", event.description, signed_dollars(event.amount)));
        }

        let target_savings = income * input.savings_rate_percent / 100.0;
        let savings = target_savings.min(income - expenses).max(0.0);
        balance += income - expenses - savings;
        if balance < 0.0 {
            negative_months += 1;
        }

        projections.push(MonthlyProjection {
            month: m,
            month_name: start.add_months(m as i32 - 1)?.label(),
            income: income.round(),
            expenses: expenses.round(),
            savings: savings.round(),
            balance: balance.round(),
            events,
            news_effects,
        });

        monthly_expense_totals.push(expenses);
        total_income += income;
        total_expenses += expenses;
        total_savings += savings;
    }

    let months = input.months as f64;
    let risk = risk_score(negative_months, input.months as usize, &monthly_expense_totals);
    let avg_expenses_after = total_expenses / months;
    let actual_savings_rate = if total_income > 0.0 {
        total_savings / total_income * 100.0
    } else {
        0.0
    };

    let mut insights = Vec::new();

    if negative_months > 0 {
        insights.push(Insight::projection(
            "negative_months",
            input.months,
            negative_months as f64,
            Tone::Negative,
            format!(
                "Risk Alert: {} month(s) may have negative balance",
                negative_months
            ),
        ));
    }

    if historical.avg_monthly_expenses > 0.0 {
        let change = (avg_expenses_after - historical.avg_monthly_expenses)
            / historical.avg_monthly_expenses
            * 100.0;
        if change > EXPENSE_CHANGE_INSIGHT_PERCENT {
            insights.push(Insight::projection(
                "expense_change",
                input.months,
                change.round(),
                Tone::Negative,
                format!(
                    "Expenses projected {:.0}% higher than historical average",
                    change
                ),
            ));
        } else if change < -EXPENSE_CHANGE_INSIGHT_PERCENT {
            insights.push(Insight::projection(
                "expense_change",
                input.months,
                change.round(),
                Tone::Positive,
                format!(
                    "Expenses projected {:.0}% lower than historical average",
                    change.abs()
                ),
            ));
        }
    }

    let news_monthly: f64 = input
        .news_impacts
        .iter()
        .filter(|n| n.impact_type == ImpactKind::Expense)
        .map(|n| avg_expenses_after * n.impact_percent / 100.0)
        .sum();
    if news_monthly > NEWS_INSIGHT_MIN_MONTHLY {
        insights.push(Insight::projection(
            "news_expense_impact",
            input.months,
            news_monthly.round(),
            Tone::Negative,
            format!("News factors adding ~${:.0}/mo to expenses", news_monthly),
        ));
    }

    if actual_savings_rate >= input.savings_rate_percent {
        insights.push(Insight::projection(
            "savings_rate",
            input.months,
            actual_savings_rate.round(),
            Tone::Positive,
            format!("On track for {:.0}% savings rate", actual_savings_rate),
        ));
    } else {
        insights.push(Insight::projection(
            "savings_rate",
            input.months,
            actual_savings_rate.round(),
            Tone::Negative,
            format!(
                "Actual savings rate: {:.0}% (target: {}%)",
                actual_savings_rate, input.savings_rate_percent
            ),
        ));
    }

    if balance > STRONG_BALANCE {
        insights.push(Insight::projection(
            "end_balance",
            input.months,
            balance.round(),
            Tone::Positive,
            format!("Strong ending balance: ${:.0}", balance),
        ));
    }

    let savings_rate_change = if monthly_income > 0.0 {
        (actual_savings_rate - historical.avg_monthly_savings / monthly_income * 100.0).round()
    } else {
        0.0
    };

    debug!(
        months = input.months,
        categories = breakdown.len(),
        end_balance = balance,
        risk,
        "Simulation complete"
    );

    Ok(SimulationResult {
        connected: true,
        projections,
        breakdown,
        total_income: total_income.round(),
        total_expenses: total_expenses.round(),
        total_savings: total_savings.round(),
        end_balance: balance.round(),
        goal_progress: (total_savings / settings.savings_goal * 100.0).min(100.0).round(),
        risk_score: risk,
        insights,
        timeline,
        historical_comparison: HistoricalComparison {
            avg_monthly_expenses_before: historical.avg_monthly_expenses,
            avg_monthly_expenses_after: avg_expenses_after.round(),
            savings_rate_change,
        },
    })
}
