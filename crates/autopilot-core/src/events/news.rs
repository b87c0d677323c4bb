//! News events analyzed by an external collaborator
//!
//! The analysis itself (fetching articles, asking a model what they mean for
//! household budgets) happens elsewhere. This module only turns the analyzed
//! records into dated events and simulator impacts.

use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Confidence, DetectedEvent, EventSource};
use crate::models::{clamped_date, Category, MonthKey};
use crate::simulation::{ImpactKind, NewsImpact};

/// Cost estimates scale this base by the impact percentage
const NEWS_BASE_COST: f64 = 100.0;
const DEFAULT_DAYS_OUT: i64 = 30;
const WEEK_DAYS_OUT: i64 = 7;
/// Months a news impact lasts in the simulator
const IMPACT_DURATION_MONTHS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactDirection {
    Increase,
    Decrease,
}

impl ImpactDirection {
    pub fn sign(&self) -> f64 {
        match self {
            ImpactDirection::Increase => 1.0,
            ImpactDirection::Decrease => -1.0,
        }
    }
}

/// One analyzed news item, as produced upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedNewsEvent {
    pub event_name: String,
    /// Free text such as "next week" or "late February"
    pub timeframe: String,
    pub affected_category: Category,
    pub impact_type: ImpactDirection,
    pub impact_percentage: f64,
    pub reasoning: String,
    pub actionable_advice: String,
}

impl AnalyzedNewsEvent {
    /// Impact percentage with the direction applied
    pub fn signed_percentage(&self) -> f64 {
        self.impact_percentage.abs() * self.impact_type.sign()
    }
}

fn month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(january|february|march|april|may|june|july|august|september|october|november|december)\b",
        )
        .expect("valid regex")
    })
}

fn month_number(name: &str) -> u32 {
    match name {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        _ => 12,
    }
}

/// Best-effort date for a free-text timeframe
///
/// "week" means a week from today. A month name means that month on today's
/// day (clamped), pushed to next year if it has already passed. Anything
/// else defaults to thirty days out.
pub fn parse_timeframe(timeframe: &str, today: NaiveDate) -> NaiveDate {
    let lower = timeframe.to_lowercase();

    if lower.contains("week") {
        return today + Duration::days(WEEK_DAYS_OUT);
    }

    if let Some(m) = month_regex().captures(&lower).and_then(|c| c.get(1)) {
        let month = month_number(m.as_str());
        let candidate = clamped_date(today.year(), month, today.day());
        return if candidate < today {
            clamped_date(today.year() + 1, month, today.day())
        } else {
            candidate
        };
    }

    today + Duration::days(DEFAULT_DAYS_OUT)
}

/// Convert an analyzed news item into a dated event
///
/// The cost is the $100 base moved by the signed impact percentage, never
/// below zero.
pub fn news_event_to_detected(event: &AnalyzedNewsEvent, today: NaiveDate) -> DetectedEvent {
    let date = parse_timeframe(&event.timeframe, today);
    let cost = (NEWS_BASE_COST * (1.0 + event.signed_percentage() / 100.0))
        .round()
        .max(0.0);

    DetectedEvent::new(
        EventSource::News,
        Confidence::Medium,
        event.event_name.clone(),
        date,
        event.affected_category.clone(),
        cost,
        event.actionable_advice.clone(),
        today,
    )
    .with_news_insight(event.reasoning.clone())
}

/// Turn analyzed news into category-scoped simulator impacts
///
/// News about the Income category moves income; everything else moves that
/// category's expenses. The impact starts in the month its timeframe points
/// at (month 1 is the current month) and lasts a year. Items with a zero
/// percentage are dropped.
pub fn impacts_from_news(events: &[AnalyzedNewsEvent], today: NaiveDate) -> Vec<NewsImpact> {
    let current = MonthKey::from_date(today);

    events
        .iter()
        .enumerate()
        .filter(|(_, event)| event.impact_percentage != 0.0)
        .map(|(i, event)| {
            let starts = MonthKey::from_date(parse_timeframe(&event.timeframe, today));
            let offset = (starts.year - current.year) * 12 + starts.month as i32
                - current.month as i32;
            let impact_type = if event.affected_category == "Income" {
                ImpactKind::Income
            } else {
                ImpactKind::Expense
            };

            NewsImpact {
                id: format!("news-{}", i + 1),
                title: event.event_name.clone(),
                category: event.affected_category.clone(),
                impact_type,
                impact_percent: event.signed_percentage(),
                effective_month: (offset + 1).max(1) as u32,
                duration: IMPACT_DURATION_MONTHS,
                description: event.actionable_advice.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::date;

    fn news(timeframe: &str, category: &str, direction: ImpactDirection, pct: f64) -> AnalyzedNewsEvent {
        AnalyzedNewsEvent {
            event_name: "Price change".to_string(),
            timeframe: timeframe.to_string(),
            affected_category: Category::parse(category).unwrap(),
            impact_type: direction,
            impact_percentage: pct,
            reasoning: "Because".to_string(),
            actionable_advice: "Plan ahead".to_string(),
        }
    }

    #[test]
    fn test_parse_timeframe() {
        let today = date("2024-03-31");
        assert_eq!(parse_timeframe("Within the next WEEK", today), date("2024-04-07"));
        assert_eq!(parse_timeframe("Late April", today), date("2024-04-30"));
        assert_eq!(parse_timeframe("early february", today), date("2025-02-28"));
        assert_eq!(parse_timeframe("March", today), date("2024-03-31"));
        assert_eq!(parse_timeframe("soon", today), date("2024-04-30"));
        // "mayhem" is not a month
        assert_eq!(parse_timeframe("mayhem", today), date("2024-04-30"));
    }

    #[test]
    fn test_cost_direction() {
        let today = date("2024-03-01");
        let up = news_event_to_detected(&news("next week", "Groceries", ImpactDirection::Increase, 15.0), today);
        assert_eq!(up.estimated_cost, 115.0);
        assert_eq!(up.source, EventSource::News);
        assert_eq!(up.confidence, Confidence::Medium);

        let down = news_event_to_detected(&news("next week", "Groceries", ImpactDirection::Decrease, 15.0), today);
        assert_eq!(down.estimated_cost, 85.0);

        let floor = news_event_to_detected(&news("next week", "Groceries", ImpactDirection::Decrease, 250.0), today);
        assert_eq!(floor.estimated_cost, 0.0);
    }

    #[test]
    fn test_impacts_from_news() {
        let today = date("2024-03-15");
        let items = vec![
            news("June", "Rent", ImpactDirection::Increase, 5.0),
            news("next week", "Income", ImpactDirection::Increase, 8.0),
            news("soon", "Groceries", ImpactDirection::Decrease, 2.0),
            news("soon", "Travel", ImpactDirection::Increase, 0.0),
        ];
        let impacts = impacts_from_news(&items, today);
        assert_eq!(impacts.len(), 3);

        assert_eq!(impacts[0].impact_type, ImpactKind::Expense);
        assert_eq!(impacts[0].effective_month, 4);
        assert_eq!(impacts[0].impact_percent, 5.0);

        assert_eq!(impacts[1].impact_type, ImpactKind::Income);
        assert_eq!(impacts[1].effective_month, 1);

        assert_eq!(impacts[2].impact_percent, -2.0);
        assert_eq!(impacts[2].effective_month, 2);
    }
}
