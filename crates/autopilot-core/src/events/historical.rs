//! Recurring same-week spending spikes

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Confidence, DetectedEvent, EventSource, HistoricalSpending};
use crate::models::{clamped_date, Category, Transaction};
use crate::stats::mean;

/// A bucket-year counts as a spike above this multiple of the category mean
const SPIKE_RATIO: f64 = 1.3;
const MIN_SPIKE_YEARS: usize = 2;

/// A (category, month, week-of-month) bucket that spiked in at least two years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSpike {
    pub category: Category,
    /// 1-12
    pub month: u32,
    /// 1-5, days 1-7 are week 1
    pub week_of_month: u32,
    pub average_spike: f64,
    pub years: Vec<HistoricalSpending>,
}

fn week_of_month(day: u32) -> u32 {
    day.div_ceil(7)
}

/// Find weeks of the year where a category repeatedly spikes
///
/// Each transaction lands in a (category, month, week-of-month, year) bucket.
/// A category needs at least two bucket-years to have a baseline; the
/// threshold is 1.3x the mean over all of its bucket-years.
pub fn detect_historical_spikes(transactions: &[Transaction]) -> Vec<HistoricalSpike> {
    type Buckets = BTreeMap<(u32, u32), BTreeMap<i32, f64>>;
    let mut by_category: BTreeMap<&Category, Buckets> = BTreeMap::new();

    for tx in transactions {
        *by_category
            .entry(&tx.category)
            .or_default()
            .entry((tx.date.month(), week_of_month(tx.date.day())))
            .or_default()
            .entry(tx.date.year())
            .or_insert(0.0) += tx.amount;
    }

    let mut spikes = Vec::new();
    for (category, buckets) in by_category {
        let all_totals: Vec<f64> = buckets
            .values()
            .flat_map(|years| years.values().copied())
            .collect();
        if all_totals.len() < 2 {
            continue;
        }
        let threshold = mean(&all_totals) * SPIKE_RATIO;

        for ((month, week), years) in buckets {
            let spike_years: Vec<HistoricalSpending> = years
                .into_iter()
                .filter(|(_, amount)| *amount > threshold)
                .map(|(year, amount)| HistoricalSpending { year, amount })
                .collect();

            if spike_years.len() >= MIN_SPIKE_YEARS {
                let amounts: Vec<f64> = spike_years.iter().map(|y| y.amount).collect();
                spikes.push(HistoricalSpike {
                    category: category.clone(),
                    month,
                    week_of_month: week,
                    average_spike: mean(&amounts),
                    years: spike_years,
                });
            }
        }
    }

    spikes
}

/// Project each spike to its next occurrence and keep those within `days_ahead`
///
/// The projected date is day `week * 7` of the month, clamped to the month
/// end. A bucket later than the current (month, week) lands this year,
/// otherwise next year.
pub fn spike_events(
    spikes: &[HistoricalSpike],
    days_ahead: u32,
    today: NaiveDate,
) -> Vec<DetectedEvent> {
    let current = (today.month(), week_of_month(today.day()));

    spikes
        .iter()
        .filter_map(|spike| {
            let year = if (spike.month, spike.week_of_month) > current {
                today.year()
            } else {
                today.year() + 1
            };
            let date = clamped_date(year, spike.month, spike.week_of_month * 7);
            let days_away = (date - today).num_days();
            if days_away > days_ahead as i64 {
                return None;
            }

            Some(
                DetectedEvent::new(
                    EventSource::Historical,
                    Confidence::Medium,
                    format!("Historical {} Spike", spike.category),
                    date,
                    spike.category.clone(),
                    spike.average_spike.round(),
                    format!(
                        "You typically spend more on {} around this time. Consider setting aside funds in advance.",
                        spike.category
                    ),
                    today,
                )
                .with_history(spike.years.clone()),
            )
        })
        .collect()
}
