//! Financial time machine
//!
//! Counterfactual replay of real history: "what if I hadn't bought that?"
//! Transactions become dated [`FinancialEvent`]s, a baseline month-by-month
//! balance series is computed from them and the income records, and a branch
//! re-runs the same accumulation after applying an [`OperationSet`].

mod operations;
mod regrets;

pub use operations::{apply_operations, Operation, OperationSet};
pub use regrets::{find_top_regrets, RegretCandidate};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::{slugify, Category, IncomeRecord, MonthKey, Transaction};
use crate::settings::TimeMachineSettings;
use crate::stats::round2;

/// Spending that could have been skipped
const DISCRETIONARY_CATEGORIES: &[&str] = &[
    "Shopping",
    "Entertainment",
    "Dining",
    "Food",
    "Subscriptions",
    "Coffee",
    "Transportation",
];
/// Everyday spending that repeats week to week
const HABIT_CATEGORIES: &[&str] = &["Food", "Coffee", "Transportation", "Groceries", "Dining"];
/// Never one-off, whatever the amount
const OBLIGATION_CATEGORIES: &[&str] = &["Rent", "Utilities", "Insurance"];
const ONE_OFF_AMOUNT: f64 = 500.0;

const SERIES_MIN_OCCURRENCES: usize = 3;
const SERIES_MIN_GAP_DAYS: f64 = 25.0;
const SERIES_MAX_GAP_DAYS: f64 = 35.0;
/// Goal-time changes at or below this are not mentioned in descriptions
const GOAL_TIME_MENTION_MONTHS: f64 = 0.5;

pub(crate) fn is_discretionary(category: &Category) -> bool {
    DISCRETIONARY_CATEGORIES.iter().any(|c| category == c)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventTag {
    Habit,
    OneOff,
    Fixed,
    Discretionary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialEvent {
    pub id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub category: Category,
    pub merchant: String,
    pub description: String,
    pub tags: Vec<EventTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
}

impl FinancialEvent {
    pub fn from_transaction(tx: &Transaction) -> Self {
        let merchant = if tx.name.trim().is_empty() {
            tx.category.to_string()
        } else {
            tx.name.clone()
        };

        let mut tags = Vec::new();
        if is_discretionary(&tx.category) {
            tags.push(EventTag::Discretionary);
        } else {
            tags.push(EventTag::Fixed);
        }
        if tx.amount > ONE_OFF_AMOUNT && !OBLIGATION_CATEGORIES.iter().any(|c| tx.category == *c) {
            tags.push(EventTag::OneOff);
        }
        if HABIT_CATEGORIES.iter().any(|c| tx.category == *c) {
            tags.push(EventTag::Habit);
        }

        Self {
            id: tx.id(),
            date: tx.date,
            amount: tx.amount,
            category: tx.category.clone(),
            description: format!("{} - ${:.2}", merchant, tx.amount),
            merchant,
            tags,
            series_id: None,
        }
    }

    pub fn has_tag(&self, tag: EventTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// Transactions within `range` (inclusive) as date-sorted events
pub fn build_events(
    transactions: &[Transaction],
    range: Option<(NaiveDate, NaiveDate)>,
) -> Vec<FinancialEvent> {
    let mut events: Vec<FinancialEvent> = transactions
        .iter()
        .filter(|tx| match range {
            Some((start, end)) => tx.date >= start && tx.date <= end,
            None => true,
        })
        .map(FinancialEvent::from_transaction)
        .collect();
    events.sort_by_key(|e| e.date);

    // Identical transactions share a fingerprint; repeats get "-1", "-2", ...
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    for event in &mut events {
        let count = seen.entry(event.id.clone()).or_insert(0);
        if *count > 0 {
            event.id = format!("{}-{}", event.id, count);
        }
        *count += 1;
    }
    events
}

/// A monthly charge from the same merchant at about the same amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringSeries {
    pub id: String,
    pub merchant: String,
    pub category: Category,
    /// Amount rounded to the nearest $10, the grouping key
    pub typical_amount: f64,
    pub event_ids: Vec<String>,
    pub total_cost: f64,
}

/// Group events by merchant and $10-rounded amount; groups of three or more
/// whose average gap is 25-35 days become series
///
/// Members get their `series_id` set.
pub fn identify_recurring_series(events: &mut [FinancialEvent]) -> Vec<RecurringSeries> {
    let mut groups: BTreeMap<(String, i64), Vec<usize>> = BTreeMap::new();
    for (i, event) in events.iter().enumerate() {
        let rounded = (event.amount / 10.0).round() as i64 * 10;
        groups
            .entry((slugify(&event.merchant), rounded))
            .or_default()
            .push(i);
    }

    let mut series = Vec::new();
    for ((merchant_slug, rounded), mut members) in groups {
        if members.len() < SERIES_MIN_OCCURRENCES {
            continue;
        }
        members.sort_by_key(|&i| events[i].date);

        let gaps: Vec<f64> = members
            .windows(2)
            .map(|pair| (events[pair[1]].date - events[pair[0]].date).num_days() as f64)
            .collect();
        let avg_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
        if !(SERIES_MIN_GAP_DAYS..=SERIES_MAX_GAP_DAYS).contains(&avg_gap) {
            continue;
        }

        let id = format!("series-{}-{}", merchant_slug, rounded);
        for &i in &members {
            events[i].series_id = Some(id.clone());
        }
        let first = &events[members[0]];
        series.push(RecurringSeries {
            id,
            merchant: first.merchant.clone(),
            category: first.category.clone(),
            typical_amount: rounded as f64,
            event_ids: members.iter().map(|&i| events[i].id.clone()).collect(),
            total_cost: round2(members.iter().map(|&i| events[i].amount).sum()),
        });
    }

    debug!(series = series.len(), "Identified recurring series");
    series
}

/// How a category is spent, month over month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorPattern {
    pub category: Category,
    pub total: f64,
    /// Rounded to whole dollars, over the months the category appears in
    pub avg_monthly: f64,
    /// Purchases per active month, one decimal
    pub frequency: f64,
    pub event_count: usize,
}

pub fn identify_behavior_patterns(events: &[FinancialEvent]) -> Vec<BehaviorPattern> {
    let mut by_category: BTreeMap<&Category, Vec<&FinancialEvent>> = BTreeMap::new();
    for event in events {
        by_category.entry(&event.category).or_default().push(event);
    }

    by_category
        .into_iter()
        .map(|(category, group)| {
            let total: f64 = group.iter().map(|e| e.amount).sum();
            let mut months: Vec<MonthKey> = group.iter().map(|e| e.month()).collect();
            months.sort();
            months.dedup();
            let active = months.len().max(1) as f64;

            BehaviorPattern {
                category: category.clone(),
                total: round2(total),
                avg_monthly: (total / active).round(),
                frequency: (group.len() as f64 / active * 10.0).round() / 10.0,
                event_count: group.len(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSnapshot {
    /// e.g. "Jan 2026"
    pub month: String,
    pub month_index: usize,
    pub income: f64,
    pub expenses: f64,
    pub savings: f64,
    pub cumulative_balance: f64,
    pub event_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorstMonth {
    pub month: String,
    /// Negative savings for that month
    pub deficit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResult {
    pub months: Vec<MonthSnapshot>,
    pub net_worth_today: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_savings: f64,
    /// Percent of the savings goal, capped at 100
    pub goal_progress: f64,
    /// Percent of months with negative savings
    pub risk_score: f64,
    pub worst_month: Option<WorstMonth>,
    pub starting_balance: f64,
}

impl TimelineResult {
    /// Months to reach `goal` at this timeline's average monthly savings
    fn months_to_goal(&self, goal: f64) -> Option<f64> {
        if self.total_savings <= 0.0 || self.months.is_empty() {
            return None;
        }
        Some(goal / (self.total_savings / self.months.len() as f64))
    }
}

/// Accumulate a balance over `months`; events outside them are ignored
fn run_timeline(
    events: &[FinancialEvent],
    income: &BTreeMap<MonthKey, f64>,
    months: &[MonthKey],
    settings: &TimeMachineSettings,
) -> TimelineResult {
    let mut expenses_by_month: BTreeMap<MonthKey, (f64, usize)> = BTreeMap::new();
    for event in events {
        let entry = expenses_by_month.entry(event.month()).or_insert((0.0, 0));
        entry.0 += event.amount;
        entry.1 += 1;
    }

    let mut snapshots = Vec::with_capacity(months.len());
    let mut balance = settings.starting_balance;
    let mut total_income = 0.0;
    let mut total_expenses = 0.0;
    let mut worst_month: Option<WorstMonth> = None;
    let mut negative_months = 0;

    for (index, month) in months.iter().enumerate() {
        let month_income = income.get(month).copied().unwrap_or(0.0);
        let (expenses, event_count) = expenses_by_month.get(month).copied().unwrap_or((0.0, 0));
        let savings = month_income - expenses;

        balance += savings;
        total_income += month_income;
        total_expenses += expenses;

        if savings < 0.0 {
            negative_months += 1;
            if worst_month.as_ref().map_or(true, |w| savings < w.deficit) {
                worst_month = Some(WorstMonth {
                    month: month.label(),
                    deficit: round2(savings),
                });
            }
        }

        snapshots.push(MonthSnapshot {
            month: month.label(),
            month_index: index,
            income: round2(month_income),
            expenses: round2(expenses),
            savings: round2(savings),
            cumulative_balance: round2(balance),
            event_count,
        });
    }

    let total_savings = total_income - total_expenses;
    TimelineResult {
        net_worth_today: round2(balance),
        total_income: round2(total_income),
        total_expenses: round2(total_expenses),
        total_savings: round2(total_savings),
        goal_progress: (total_savings / settings.savings_goal * 100.0).clamp(0.0, 100.0).round(),
        risk_score: (negative_months as f64 / months.len().max(1) as f64 * 100.0).round(),
        worst_month,
        starting_balance: settings.starting_balance,
        months: snapshots,
    }
}

/// Branch minus baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaSummary {
    pub net_worth_delta: f64,
    pub savings_delta: f64,
    /// Months sooner (positive) the savings goal is reached; None when
    /// either timeline never gets there
    pub goal_time_delta: Option<f64>,
    pub risk_delta: f64,
    pub expenses_delta: f64,
    pub description: String,
    /// Expense reduction as a percent of baseline expenses, one decimal
    pub percent_improvement: f64,
}

pub fn compute_delta(baseline: &TimelineResult, branch: &TimelineResult, savings_goal: f64) -> DeltaSummary {
    let net_worth_delta = round2(branch.net_worth_today - baseline.net_worth_today);
    let expenses_delta = round2(branch.total_expenses - baseline.total_expenses);

    let goal_time_delta = match (
        baseline.months_to_goal(savings_goal),
        branch.months_to_goal(savings_goal),
    ) {
        (Some(before), Some(after)) => Some(((before - after) * 10.0).round() / 10.0),
        _ => None,
    };

    let percent_improvement = if baseline.total_expenses > 0.0 {
        (-expenses_delta / baseline.total_expenses * 1000.0).round() / 10.0
    } else {
        0.0
    };

    let mut description = if net_worth_delta > 0.0 {
        format!("You'd have ${:.0} more today", net_worth_delta)
    } else if net_worth_delta < 0.0 {
        format!("You'd have ${:.0} less today", net_worth_delta.abs())
    } else {
        "No change to net worth".to_string()
    };
    if let Some(months) = goal_time_delta.filter(|m| *m > GOAL_TIME_MENTION_MONTHS) {
        description.push_str(&format!(" and reach your goal {:.1} months sooner", months));
    }

    DeltaSummary {
        net_worth_delta,
        savings_delta: round2(branch.total_savings - baseline.total_savings),
        goal_time_delta,
        risk_delta: branch.risk_score - baseline.risk_score,
        expenses_delta,
        description,
        percent_improvement,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchComparison {
    pub baseline: TimelineResult,
    pub branch: TimelineResult,
    pub delta: DeltaSummary,
}

/// Baseline history plus everything needed to branch from it
#[derive(Debug, Clone)]
pub struct TimeMachine {
    events: Vec<FinancialEvent>,
    series: Vec<RecurringSeries>,
    income: BTreeMap<MonthKey, f64>,
    months: Vec<MonthKey>,
    baseline: TimelineResult,
    settings: TimeMachineSettings,
}

impl TimeMachine {
    /// Build from raw records, optionally restricted to an inclusive date range
    ///
    /// The timeline covers every calendar month from the earliest to the
    /// latest record (or the whole range when one is given), so months with
    /// no activity still count.
    pub fn new(
        transactions: &[Transaction],
        income_records: &[IncomeRecord],
        range: Option<(NaiveDate, NaiveDate)>,
        settings: TimeMachineSettings,
    ) -> Self {
        let mut events = build_events(transactions, range);
        let series = identify_recurring_series(&mut events);

        let mut income: BTreeMap<MonthKey, f64> = BTreeMap::new();
        for record in income_records.iter().filter(|r| match range {
            Some((start, end)) => r.date >= start && r.date <= end,
            None => true,
        }) {
            *income.entry(record.month()).or_insert(0.0) += record.amount;
        }

        let bounds = match range {
            Some((start, end)) => Some((MonthKey::from_date(start), MonthKey::from_date(end))),
            None => {
                let all = events.iter().map(|e| e.month()).chain(income.keys().copied());
                all.clone().min().zip(all.max())
            }
        };
        let mut months = Vec::new();
        if let Some((first, last)) = bounds {
            let mut month = first;
            while month <= last {
                months.push(month);
                month = month.next();
            }
        }

        let baseline = run_timeline(&events, &income, &months, &settings);
        debug!(
            events = events.len(),
            months = months.len(),
            net_worth = baseline.net_worth_today,
            "Built time machine baseline"
        );

        Self {
            events,
            series,
            income,
            months,
            baseline,
            settings,
        }
    }

    pub fn events(&self) -> &[FinancialEvent] {
        &self.events
    }

    pub fn series(&self) -> &[RecurringSeries] {
        &self.series
    }

    pub fn behavior_patterns(&self) -> Vec<BehaviorPattern> {
        identify_behavior_patterns(&self.events)
    }

    pub fn baseline(&self) -> &TimelineResult {
        &self.baseline
    }

    pub fn settings(&self) -> &TimeMachineSettings {
        &self.settings
    }

    /// Replay history with `ops` applied
    ///
    /// The month range stays that of the baseline; an event delayed past the
    /// last month drops out of the branch.
    pub fn branch(&self, ops: &OperationSet) -> Result<TimelineResult> {
        ops.validate()?;
        let edited = apply_operations(&self.events, ops)?;
        Ok(run_timeline(&edited, &self.income, &self.months, &self.settings))
    }

    pub fn compare(&self, ops: &OperationSet) -> Result<BranchComparison> {
        let branch = self.branch(ops)?;
        let delta = compute_delta(&self.baseline, &branch, self.settings.savings_goal);
        Ok(BranchComparison {
            baseline: self.baseline.clone(),
            branch,
            delta,
        })
    }

    pub fn top_regrets(&self) -> Vec<RegretCandidate> {
        find_top_regrets(self, self.settings.regret_limit)
    }
}
