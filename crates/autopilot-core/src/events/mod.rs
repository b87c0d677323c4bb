//! Upcoming budget-impacting events
//!
//! Three sources are merged into one date-sorted list:
//! - a fixed calendar of US consumer occasions
//! - spikes that recur in the user's own history around the same week
//! - news events already analyzed by an external collaborator
//!
//! Calendar events always win: a historical spike is dropped when a calendar
//! event of the same category lands within a week of it.

mod calendar;
mod historical;
mod news;

pub use calendar::{calendar_events, upcoming_calendar_events, CalendarEvent};
pub use historical::{detect_historical_spikes, spike_events, HistoricalSpike};
pub use news::{
    impacts_from_news, news_event_to_detected, parse_timeframe, AnalyzedNewsEvent,
    ImpactDirection,
};

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{slugify, Category, Transaction};

/// Calendar events suppress same-category spikes less than this many days away
const DEDUP_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Calendar,
    Historical,
    News,
    User,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Calendar => "calendar",
            EventSource::Historical => "historical",
            EventSource::News => "news",
            EventSource::User => "user",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calendar" => Ok(EventSource::Calendar),
            "historical" => Ok(EventSource::Historical),
            "news" => Ok(EventSource::News),
            "user" => Ok(EventSource::User),
            _ => Err(format!("Unknown event source: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Urgency {
    /// high within a week, medium within three weeks, else low
    pub fn from_days_away(days_away: i64) -> Self {
        if days_away <= 7 {
            Urgency::High
        } else if days_away <= 21 {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::High => "high",
            Urgency::Medium => "medium",
            Urgency::Low => "low",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spending observed around an event in a past year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSpending {
    pub year: i32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedEvent {
    pub id: String,
    pub event_name: String,
    pub event_date: NaiveDate,
    pub category: Category,
    pub estimated_cost: f64,
    pub source: EventSource,
    pub confidence: Confidence,
    pub historical_data: Option<Vec<HistoricalSpending>>,
    pub news_insight: Option<String>,
    pub actionable_advice: String,
    pub is_dismissed: bool,
    pub days_away: i64,
    pub urgency: Urgency,
}

/// A user-entered event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    pub event_name: String,
    pub event_date: NaiveDate,
    pub category: Category,
    pub estimated_cost: f64,
}

impl DetectedEvent {
    /// Build an event with `days_away` and `urgency` computed against `today`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: EventSource,
        confidence: Confidence,
        event_name: impl Into<String>,
        event_date: NaiveDate,
        category: Category,
        estimated_cost: f64,
        actionable_advice: impl Into<String>,
        today: NaiveDate,
    ) -> Self {
        let event_name = event_name.into();
        let days_away = (event_date - today).num_days();
        Self {
            id: event_id(source, &event_name, event_date),
            event_name,
            event_date,
            category,
            estimated_cost,
            source,
            confidence,
            historical_data: None,
            news_insight: None,
            actionable_advice: actionable_advice.into(),
            is_dismissed: false,
            days_away,
            urgency: Urgency::from_days_away(days_away),
        }
    }

    pub fn with_history(mut self, history: Vec<HistoricalSpending>) -> Self {
        if !history.is_empty() {
            self.historical_data = Some(history);
        }
        self
    }

    pub fn with_news_insight(mut self, insight: impl Into<String>) -> Self {
        self.news_insight = Some(insight.into());
        self
    }

    pub fn from_user(input: CreateEventInput, today: NaiveDate) -> Self {
        let advice = format!(
            "Set aside ${:.0} before {} to cover {}.",
            input.estimated_cost,
            input.event_date.format("%b %-d"),
            input.event_name
        );
        Self::new(
            EventSource::User,
            Confidence::High,
            input.event_name,
            input.event_date,
            input.category,
            input.estimated_cost,
            advice,
            today,
        )
    }
}

/// Stable id: source, slugged name and date
fn event_id(source: EventSource, name: &str, date: NaiveDate) -> String {
    format!("{}-{}-{}", source, slugify(name), date)
}

/// Merge calendar, historical and news events within `days_ahead` of `today`
pub fn get_all_upcoming_events(
    transactions: &[Transaction],
    news: &[AnalyzedNewsEvent],
    days_ahead: u32,
    today: NaiveDate,
) -> Vec<DetectedEvent> {
    let calendar = upcoming_calendar_events(transactions, days_ahead, today);
    let spikes = spike_events(&detect_historical_spikes(transactions), days_ahead, today);

    let mut events = calendar.clone();
    let spike_count = spikes.len();
    events.extend(spikes.into_iter().filter(|spike| {
        !calendar.iter().any(|cal| {
            cal.category == spike.category
                && (cal.event_date - spike.event_date).num_days().abs() < DEDUP_WINDOW_DAYS
        })
    }));
    let kept_spikes = events.len() - calendar.len();

    events.extend(
        news.iter()
            .map(|event| news_event_to_detected(event, today))
            .filter(|event| (0..=days_ahead as i64).contains(&event.days_away)),
    );

    events.sort_by(|a, b| a.event_date.cmp(&b.event_date));

    debug!(
        calendar = calendar.len(),
        spikes = spike_count,
        spikes_kept = kept_spikes,
        news = news.len(),
        total = events.len(),
        "Merged upcoming events"
    );
    events
}
