//! Spending pattern detection
//!
//! Four independent analyzers run over the same transaction history:
//! - Day of week: weekend vs weekday, and each category's peak weekday
//! - Time of month: post-payday and mid-month spikes
//! - Impulse: per-category outliers far above the median
//! - Seasonal: holiday season and summer vs the yearly average
//!
//! Every pattern carries a savings opportunity estimate and a ready-to-show
//! insight sentence that includes the computed percentage.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Category, Transaction};
use crate::stats::{mean, median, std_dev};

const WEEKEND_RATIO: f64 = 1.3;
const WEEKENDS_PER_MONTH: f64 = 8.0;
const WEEKEND_REDUCTION: f64 = 0.3;
const PEAK_DAY_RATIO: f64 = 1.5;
const PEAK_DAY_REDUCTION: f64 = 0.25;

const EARLY_MONTH_RATIO: f64 = 1.25;
const EARLY_MONTH_REDUCTION: f64 = 0.3;
const MID_MONTH_RATIO: f64 = 1.2;
const MID_MONTH_REDUCTION: f64 = 0.2;

const IMPULSE_MIN_TRANSACTIONS: usize = 10;
const IMPULSE_STD_DEVS: f64 = 2.5;
const IMPULSE_AVOIDABLE: f64 = 0.5;

const HOLIDAY_RATIO: f64 = 1.4;
const HOLIDAY_REDUCTION: f64 = 0.2;
const SUMMER_RATIO: f64 = 1.25;
const SUMMER_REDUCTION: f64 = 0.15;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternType {
    DayOfWeek,
    TimeOfMonth,
    Seasonal,
    Impulse,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DayOfWeek => "day-of-week",
            Self::TimeOfMonth => "time-of-month",
            Self::Seasonal => "seasonal",
            Self::Impulse => "impulse",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected spending habit with an estimated monthly savings opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingPattern {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub description: String,
    pub category: Option<Category>,
    /// Multiplier, or a percentage for impulse patterns
    pub metric: f64,
    pub insight: String,
    pub savings_opportunity: f64,
}

fn round_ratio(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage above 1.0 for a multiplier, e.g. 1.45 -> 45
fn percent_above(multiplier: f64) -> i64 {
    ((multiplier - 1.0) * 100.0).round() as i64
}

/// Weekend vs weekday, plus each category's peak weekday
pub fn analyze_day_of_week(transactions: &[Transaction]) -> Vec<SpendingPattern> {
    let mut patterns = Vec::new();

    let mut by_day: [Vec<f64>; 7] = Default::default();
    for tx in transactions {
        by_day[tx.date.weekday().num_days_from_sunday() as usize].push(tx.amount);
    }
    let day_averages: Vec<f64> = by_day.iter().map(|amounts| mean(amounts)).collect();

    let weekday_avg = day_averages[1..=5].iter().sum::<f64>() / 5.0;
    let weekend_avg = (day_averages[0] + day_averages[6]) / 2.0;

    if weekday_avg > 0.0 && weekend_avg >= weekday_avg * WEEKEND_RATIO {
        let multiplier = round_ratio(weekend_avg / weekday_avg);
        let extra = (weekend_avg - weekday_avg) * WEEKENDS_PER_MONTH;
        patterns.push(SpendingPattern {
            pattern_type: PatternType::DayOfWeek,
            description: format!("Weekend spending is {}x higher than weekdays", multiplier),
            category: None,
            metric: multiplier,
            insight: format!(
                "Your spending spikes {}% on weekends. Consider meal prepping on Fridays or setting a weekend budget.",
                percent_above(multiplier)
            ),
            savings_opportunity: (extra * WEEKEND_REDUCTION).round(),
        });
    }

    let mut category_days: BTreeMap<&Category, [f64; 7]> = BTreeMap::new();
    for tx in transactions {
        let day = tx.date.weekday().num_days_from_sunday() as usize;
        category_days.entry(&tx.category).or_insert([0.0; 7])[day] += tx.amount;
    }

    for (category, sums) in category_days {
        let avg = sums.iter().sum::<f64>() / 7.0;
        let (peak_day, peak) = sums
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::MIN), |best, (day, v)| if v > best.1 { (day, v) } else { best });

        if avg > 0.0 && peak > avg * PEAK_DAY_RATIO {
            let ratio = peak / avg;
            let day_name = DAY_NAMES[peak_day];
            patterns.push(SpendingPattern {
                pattern_type: PatternType::DayOfWeek,
                description: format!("{} spending peaks on {}s", category, day_name),
                category: Some(category.clone()),
                metric: round_ratio(ratio),
                insight: format!(
                    "Your {} spending is {}% higher on {}s.",
                    category,
                    percent_above(ratio),
                    day_name
                ),
                savings_opportunity: ((peak - avg) * PEAK_DAY_REDUCTION).round(),
            });
        }
    }

    patterns
}

/// Days 1-7, 8-14, 15-21 and 22-31 as quarters 0..=3
fn month_quarter(day: u32) -> usize {
    match day {
        1..=7 => 0,
        8..=14 => 1,
        15..=21 => 2,
        _ => 3,
    }
}

/// Post-payday (first week) and mid-month (third week) spikes
pub fn analyze_time_of_month(transactions: &[Transaction]) -> Vec<SpendingPattern> {
    let mut patterns = Vec::new();

    let mut quarters: [Vec<f64>; 4] = Default::default();
    for tx in transactions {
        quarters[month_quarter(tx.date.day())].push(tx.amount);
    }
    let averages: Vec<f64> = quarters.iter().map(|amounts| mean(amounts)).collect();
    let overall = averages.iter().sum::<f64>() / 4.0;
    if overall <= 0.0 {
        return patterns;
    }

    let early = averages[0];
    if early > overall * EARLY_MONTH_RATIO {
        let multiplier = round_ratio(early / overall);
        let pct = percent_above(multiplier);
        patterns.push(SpendingPattern {
            pattern_type: PatternType::TimeOfMonth,
            description: format!("Spending spikes {}% in the first week of the month", pct),
            category: None,
            metric: multiplier,
            insight: format!(
                "You spend {}% more right after payday. Consider waiting 48 hours before non-essential purchases.",
                pct
            ),
            savings_opportunity: ((early - overall) * 4.0 * EARLY_MONTH_REDUCTION).round(),
        });
    }

    let mid = averages[2];
    if mid > overall * MID_MONTH_RATIO {
        let multiplier = round_ratio(mid / overall);
        patterns.push(SpendingPattern {
            pattern_type: PatternType::TimeOfMonth,
            description: "Mid-month spending increase detected".to_string(),
            category: None,
            metric: multiplier,
            insight: format!(
                "Your spending picks up {}% mid-month. This might indicate a second payday effect.",
                percent_above(multiplier)
            ),
            savings_opportunity: ((mid - overall) * 4.0 * MID_MONTH_REDUCTION).round(),
        });
    }

    patterns
}

fn group_by_category(transactions: &[Transaction]) -> BTreeMap<&Category, Vec<&Transaction>> {
    let mut groups: BTreeMap<&Category, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        groups.entry(&tx.category).or_default().push(tx);
    }
    groups
}

/// Transactions more than 2.5 standard deviations above their category median
///
/// Only categories with at least ten transactions are considered.
pub fn find_impulse_outliers(transactions: &[Transaction]) -> Vec<&Transaction> {
    group_by_category(transactions)
        .into_values()
        .flat_map(category_outliers)
        .collect()
}

fn category_outliers(txs: Vec<&Transaction>) -> Vec<&Transaction> {
    if txs.len() < IMPULSE_MIN_TRANSACTIONS {
        return Vec::new();
    }
    let amounts: Vec<f64> = txs.iter().map(|tx| tx.amount).collect();
    let threshold = median(&amounts) + IMPULSE_STD_DEVS * std_dev(&amounts);
    txs.into_iter().filter(|tx| tx.amount > threshold).collect()
}

/// Per-category impulse purchase patterns
pub fn detect_impulse_purchases(transactions: &[Transaction]) -> Vec<SpendingPattern> {
    let mut patterns = Vec::new();

    for (category, txs) in group_by_category(transactions) {
        let count = txs.len();
        let outliers = category_outliers(txs);
        if outliers.is_empty() {
            continue;
        }

        let outlier_total: f64 = outliers.iter().map(|tx| tx.amount).sum();
        let percentage = outliers.len() as f64 / count as f64 * 100.0;
        patterns.push(SpendingPattern {
            pattern_type: PatternType::Impulse,
            description: format!(
                "{} potential impulse purchases detected in {}",
                outliers.len(),
                category
            ),
            category: Some(category.clone()),
            metric: percentage,
            insight: format!(
                "{}% of your {} transactions are significantly above your typical spending. These may be impulse purchases.",
                percentage.round() as i64,
                category
            ),
            savings_opportunity: (outlier_total * IMPULSE_AVOIDABLE).round(),
        });
    }

    patterns
}

/// Holiday season and summer spending vs the yearly average
pub fn analyze_seasonal(transactions: &[Transaction]) -> Vec<SpendingPattern> {
    let mut patterns = Vec::new();

    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for tx in transactions {
        by_month.entry(tx.date.month()).or_default().push(tx.amount);
    }
    let month_averages: BTreeMap<u32, f64> = by_month
        .iter()
        .map(|(month, amounts)| (*month, mean(amounts)))
        .collect();

    let present: Vec<f64> = month_averages.values().copied().collect();
    let overall = mean(&present);
    if overall <= 0.0 {
        return patterns;
    }
    let season_avg = |months: &[u32]| {
        months
            .iter()
            .map(|m| month_averages.get(m).copied().unwrap_or(0.0))
            .sum::<f64>()
            / months.len() as f64
    };

    let holiday = season_avg(&[11, 12]);
    if holiday >= overall * HOLIDAY_RATIO {
        let multiplier = round_ratio(holiday / overall);
        let pct = percent_above(holiday / overall);
        patterns.push(SpendingPattern {
            pattern_type: PatternType::Seasonal,
            description: format!("Holiday season spending is {}% above average", pct),
            category: None,
            metric: multiplier,
            insight: format!(
                "Your spending rises {}% during the holiday season. Start saving in September to avoid financial stress.",
                pct
            ),
            savings_opportunity: ((holiday - overall) * 2.0 * HOLIDAY_REDUCTION).round(),
        });
    }

    let summer = season_avg(&[6, 7, 8]);
    if summer >= overall * SUMMER_RATIO {
        let multiplier = round_ratio(summer / overall);
        let pct = percent_above(summer / overall);
        patterns.push(SpendingPattern {
            pattern_type: PatternType::Seasonal,
            description: format!("Summer spending is {}% above average", pct),
            category: None,
            metric: multiplier,
            insight: format!(
                "You spend {}% more during summer months. Plan ahead for vacations and activities.",
                pct
            ),
            savings_opportunity: ((summer - overall) * 3.0 * SUMMER_REDUCTION).round(),
        });
    }

    patterns
}

/// Run every analyzer and rank by savings opportunity, highest first
pub fn analyze_all_patterns(transactions: &[Transaction]) -> Vec<SpendingPattern> {
    let mut patterns = analyze_day_of_week(transactions);
    patterns.extend(analyze_time_of_month(transactions));
    patterns.extend(detect_impulse_purchases(transactions));
    patterns.extend(analyze_seasonal(transactions));

    patterns.sort_by(|a, b| b.savings_opportunity.total_cmp(&a.savings_opportunity));

    debug!(
        transactions = transactions.len(),
        patterns = patterns.len(),
        "Analyzed spending patterns"
    );
    patterns
}

/// The first `limit` patterns of an already ranked list
pub fn top_spending_insights(patterns: &[SpendingPattern], limit: usize) -> Vec<SpendingPattern> {
    patterns.iter().take(limit).cloned().collect()
}
