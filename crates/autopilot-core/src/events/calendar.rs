//! Fixed calendar of US consumer occasions

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::{Confidence, DetectedEvent, EventSource, HistoricalSpending};
use crate::models::{clamped_date, days_in_month, Category, Transaction};

/// Days either side of a past occurrence that count as "around" it
const HISTORY_WINDOW_DAYS: i64 = 7;
const HISTORY_YEARS: i32 = 3;

pub struct CalendarEvent {
    pub name: &'static str,
    pub category: &'static str,
    pub estimated_cost: f64,
    pub advice: &'static str,
    date_in: fn(i32) -> Option<NaiveDate>,
}

impl CalendarEvent {
    /// The occurrence of this event in `year`
    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        (self.date_in)(year)
    }
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    Some(last - Duration::days(back as i64))
}

fn thanksgiving(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Thu, 4)
}

static CALENDAR: [CalendarEvent; 12] = [
    CalendarEvent {
        name: "Valentine's Day",
        category: "Shopping",
        estimated_cost: 150.0,
        advice: "Consider homemade gifts or experience-based presents to save money.",
        date_in: |year| NaiveDate::from_ymd_opt(year, 2, 14),
    },
    CalendarEvent {
        name: "Super Bowl",
        category: "Dining",
        estimated_cost: 120.0,
        advice: "Host at home instead of going out. Stock up on snacks a few days early to avoid price surges.",
        date_in: |year| NaiveDate::from_weekday_of_month_opt(year, 2, Weekday::Sun, 1),
    },
    CalendarEvent {
        name: "Tax Day",
        category: "Other",
        estimated_cost: 200.0,
        advice: "Set aside money for potential tax payments. Consider free filing options.",
        date_in: |year| NaiveDate::from_ymd_opt(year, 4, 15),
    },
    CalendarEvent {
        name: "Mother's Day",
        category: "Shopping",
        estimated_cost: 100.0,
        advice: "Book restaurants early or plan a homemade brunch to save on dining costs.",
        date_in: |year| NaiveDate::from_weekday_of_month_opt(year, 5, Weekday::Sun, 2),
    },
    CalendarEvent {
        name: "Memorial Day",
        category: "Travel",
        estimated_cost: 200.0,
        advice: "Book long-weekend travel early or plan a local getaway to avoid holiday pricing.",
        date_in: |year| last_weekday(year, 5, Weekday::Mon),
    },
    CalendarEvent {
        name: "Father's Day",
        category: "Shopping",
        estimated_cost: 80.0,
        advice: "Focus on meaningful experiences rather than expensive gifts.",
        date_in: |year| NaiveDate::from_weekday_of_month_opt(year, 6, Weekday::Sun, 3),
    },
    CalendarEvent {
        name: "Independence Day",
        category: "Dining",
        estimated_cost: 100.0,
        advice: "Buy supplies for BBQ in advance. Check for firework discounts at warehouse stores.",
        date_in: |year| NaiveDate::from_ymd_opt(year, 7, 4),
    },
    CalendarEvent {
        name: "Halloween",
        category: "Shopping",
        estimated_cost: 75.0,
        advice: "DIY costumes save money. Buy candy in bulk or right after Halloween for next year.",
        date_in: |year| NaiveDate::from_ymd_opt(year, 10, 31),
    },
    CalendarEvent {
        name: "Thanksgiving",
        category: "Groceries",
        estimated_cost: 150.0,
        advice: "Shop early for non-perishables. Compare prices at multiple stores.",
        date_in: thanksgiving,
    },
    CalendarEvent {
        name: "Black Friday",
        category: "Shopping",
        estimated_cost: 300.0,
        advice: "Make a list beforehand and stick to it. Many \"deals\" are inflated before discounting.",
        date_in: |year| thanksgiving(year).and_then(|d| d.succ_opt()),
    },
    CalendarEvent {
        name: "Christmas",
        category: "Shopping",
        estimated_cost: 500.0,
        advice: "Start saving months ahead. Consider Secret Santa to reduce gift count.",
        date_in: |year| NaiveDate::from_ymd_opt(year, 12, 25),
    },
    CalendarEvent {
        name: "New Year's Eve",
        category: "Dining",
        estimated_cost: 150.0,
        advice: "Host a house party instead of expensive venue tickets.",
        date_in: |year| NaiveDate::from_ymd_opt(year, 12, 31),
    },
];

/// The full calendar table
pub fn calendar_events() -> &'static [CalendarEvent] {
    &CALENDAR
}

/// Same-category spending around the event in each of the previous three years
fn past_spending(
    transactions: &[Transaction],
    category: &Category,
    event_date: NaiveDate,
) -> Vec<HistoricalSpending> {
    let mut history = Vec::new();
    for past_year in (event_date.year() - HISTORY_YEARS..event_date.year()).rev() {
        let anchor = clamped_date(past_year, event_date.month(), event_date.day());
        let start = anchor - Duration::days(HISTORY_WINDOW_DAYS);
        let end = anchor + Duration::days(HISTORY_WINDOW_DAYS);

        let amount: f64 = transactions
            .iter()
            .filter(|tx| &tx.category == category && tx.date >= start && tx.date <= end)
            .map(|tx| tx.amount)
            .sum();
        if amount > 0.0 {
            history.push(HistoricalSpending {
                year: past_year,
                amount,
            });
        }
    }
    history
}

/// Calendar events between `today` and `today + days_ahead`, both inclusive
///
/// When the history shows spending around past occurrences, the default cost
/// is replaced by the average of those years.
pub fn upcoming_calendar_events(
    transactions: &[Transaction],
    days_ahead: u32,
    today: NaiveDate,
) -> Vec<DetectedEvent> {
    let end = today + Duration::days(days_ahead as i64);
    let mut events = Vec::new();

    for cal in calendar_events() {
        let category = Category::from_known(cal.category);
        for year in [today.year(), today.year() + 1] {
            let Some(event_date) = cal.date_in(year) else {
                continue;
            };
            if event_date < today || event_date > end {
                continue;
            }

            let history = past_spending(transactions, &category, event_date);
            let estimate = if history.is_empty() {
                cal.estimated_cost
            } else {
                history.iter().map(|h| h.amount).sum::<f64>() / history.len() as f64
            };

            events.push(
                DetectedEvent::new(
                    EventSource::Calendar,
                    Confidence::High,
                    cal.name,
                    event_date,
                    category.clone(),
                    estimate.round(),
                    cal.advice,
                    today,
                )
                .with_history(history),
            );
        }
    }

    events.sort_by(|a, b| a.event_date.cmp(&b.event_date));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Urgency;
    use crate::test_utils::{date, tx};

    fn date_of(name: &str, year: i32) -> NaiveDate {
        calendar_events()
            .iter()
            .find(|e| e.name == name)
            .unwrap()
            .date_in(year)
            .unwrap()
    }

    #[test]
    fn test_twelve_events() {
        assert_eq!(calendar_events().len(), 12);
    }

    #[test]
    fn test_floating_holidays() {
        assert_eq!(date_of("Super Bowl", 2024), date("2024-02-04"));
        assert_eq!(date_of("Super Bowl", 2026), date("2026-02-01"));
        assert_eq!(date_of("Mother's Day", 2024), date("2024-05-12"));
        assert_eq!(date_of("Memorial Day", 2024), date("2024-05-27"));
        assert_eq!(date_of("Father's Day", 2024), date("2024-06-16"));
        assert_eq!(date_of("Thanksgiving", 2024), date("2024-11-28"));
        assert_eq!(date_of("Black Friday", 2024), date("2024-11-29"));
        assert_eq!(date_of("Thanksgiving", 2025), date("2025-11-27"));
        assert_eq!(date_of("Mother's Day", 2026), date("2026-05-10"));
    }

    #[test]
    fn test_window_is_inclusive_and_spans_years() {
        let events = upcoming_calendar_events(&[], 31, date("2024-12-31"));
        let names: Vec<&str> = events.iter().map(|e| e.event_name.as_str()).collect();
        assert_eq!(names, vec!["New Year's Eve"]);
        assert_eq!(events[0].days_away, 0);
        assert_eq!(events[0].urgency, Urgency::High);

        let events = upcoming_calendar_events(&[], 45, date("2024-12-31"));
        assert!(events.iter().any(|e| e.event_date == date("2025-02-14")));
    }

    #[test]
    fn test_historical_estimate() {
        let history = vec![
            tx(400.0, "Shopping", "2023-12-20"),
            tx(200.0, "Shopping", "2023-12-30"),
            tx(300.0, "Shopping", "2022-12-24"),
            // outside the window
            tx(999.0, "Shopping", "2022-12-10"),
            // wrong category
            tx(999.0, "Dining", "2023-12-25"),
        ];
        let events = upcoming_calendar_events(&history, 30, date("2024-12-01"));
        let christmas = events.iter().find(|e| e.event_name == "Christmas").unwrap();

        let data = christmas.historical_data.as_ref().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].year, 2023);
        assert_eq!(data[0].amount, 600.0);
        assert_eq!(christmas.estimated_cost, 450.0);

        let valentines = upcoming_calendar_events(&history, 90, date("2024-12-01"))
            .into_iter()
            .find(|e| e.event_name == "Valentine's Day")
            .unwrap();
        assert_eq!(valentines.estimated_cost, 150.0);
        assert!(valentines.historical_data.is_none());
    }
}
