//! Recurring bill detection and the detailed safe-to-spend figure

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{clamped_date, Category, MonthKey, Transaction};
use crate::stats::{mean, round2};

/// Bills due within this many days are reserved by default
pub const DEFAULT_LOOK_AHEAD_DAYS: i64 = 7;

/// Amounts may differ from their mean by less than this share
const AMOUNT_TOLERANCE: f64 = 0.1;
const MIN_GAP_DAYS: i64 = 25;
const MAX_GAP_DAYS: i64 = 35;
const LOW_BALANCE_WARNING: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingBill {
    pub name: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeToSpend {
    pub amount: f64,
    pub upcoming_bills_count: usize,
    pub upcoming_bills_total: f64,
    pub upcoming_bill_names: Vec<String>,
    pub daily_budget_remaining: f64,
    pub days_remaining: u32,
    pub is_negative: bool,
    pub warning: Option<String>,
}

/// Lowercase alphanumerics only, so "NETFLIX.COM" and "Netflix com" match
fn normalize_merchant(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Find monthly bills in the history and predict their next due date
///
/// A merchant qualifies with at least two charges of consistent amount
/// (each within 10% of the mean) spaced 25 to 35 days apart. The next due
/// date keeps the day-of-month of the latest charge and must fall before the
/// end of next month.
pub fn detect_recurring_bills(transactions: &[Transaction], today: NaiveDate) -> Vec<UpcomingBill> {
    let mut by_merchant: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        by_merchant
            .entry(normalize_merchant(&tx.name))
            .or_default()
            .push(tx);
    }

    let horizon_month = MonthKey::from_date(today).next();
    let horizon = clamped_date(
        horizon_month.year,
        horizon_month.month,
        horizon_month.days_in_month(),
    );

    let mut bills = Vec::new();
    for (merchant, mut txs) in by_merchant {
        if merchant.is_empty() || txs.len() < 2 {
            continue;
        }
        txs.sort_by(|a, b| b.date.cmp(&a.date));

        let amounts: Vec<f64> = txs.iter().map(|tx| tx.amount).collect();
        let average = mean(&amounts);
        if average <= 0.0
            || amounts
                .iter()
                .any(|a| (a - average).abs() / average >= AMOUNT_TOLERANCE)
        {
            continue;
        }

        let monthly = txs.windows(2).all(|pair| {
            let gap = (pair[0].date - pair[1].date).num_days();
            (MIN_GAP_DAYS..=MAX_GAP_DAYS).contains(&gap)
        });
        if !monthly {
            continue;
        }

        let latest = txs[0];
        let day_of_month = latest.date.day();
        let due_date = if today.day() < day_of_month {
            clamped_date(today.year(), today.month(), day_of_month)
        } else {
            let next = MonthKey::from_date(today).next();
            clamped_date(next.year, next.month, day_of_month)
        };

        if due_date <= horizon {
            bills.push(UpcomingBill {
                name: latest.name.clone(),
                amount: round2(average),
                due_date,
                category: latest.category.clone(),
            });
        }
    }

    bills.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    debug!(bills = bills.len(), "Detected recurring bills");
    bills
}

/// How much can be spent today after reserving for bills and the rest of the month
pub fn calculate_safe_to_spend(
    account_balance: f64,
    monthly_budget: f64,
    spent_so_far: f64,
    bills: &[UpcomingBill],
    look_ahead_days: i64,
    today: NaiveDate,
) -> SafeToSpend {
    let days_remaining = MonthKey::from_date(today)
        .days_in_month()
        .saturating_sub(today.day())
        .max(1);

    let due_soon: Vec<&UpcomingBill> = bills
        .iter()
        .filter(|bill| {
            let days_until = (bill.due_date - today).num_days();
            (0..=look_ahead_days).contains(&days_until)
        })
        .collect();

    let bills_total: f64 = due_soon.iter().map(|bill| bill.amount).sum();
    let daily_budget_remaining = (monthly_budget - spent_so_far) / days_remaining as f64;
    let safe = account_balance - bills_total - daily_budget_remaining;
    let is_negative = safe < 0.0;

    let warning = if is_negative {
        Some("Your safe-to-spend is negative. Consider reducing discretionary spending.".to_string())
    } else if safe < LOW_BALANCE_WARNING {
        Some("Your safe-to-spend is low. Be careful with additional purchases.".to_string())
    } else if !due_soon.is_empty() {
        let plural = if due_soon.len() > 1 { "s" } else { "" };
        Some(format!("You have {} bill{} due soon.", due_soon.len(), plural))
    } else {
        None
    };

    SafeToSpend {
        amount: round2(safe).max(0.0),
        upcoming_bills_count: due_soon.len(),
        upcoming_bills_total: round2(bills_total),
        upcoming_bill_names: due_soon.iter().map(|bill| bill.name.clone()).collect(),
        daily_budget_remaining: round2(daily_budget_remaining),
        days_remaining,
        is_negative,
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{date, named_tx};

    fn bill(name: &str, amount: f64, due: &str) -> UpcomingBill {
        UpcomingBill {
            name: name.to_string(),
            amount,
            due_date: date(due),
            category: Category::parse("Utilities").unwrap(),
        }
    }

    #[test]
    fn test_detects_monthly_bill() {
        let history = vec![
            named_tx(15.99, "Subscriptions", "2024-01-20", "NETFLIX.COM"),
            named_tx(15.99, "Subscriptions", "2024-02-20", "Netflix com"),
            named_tx(16.49, "Subscriptions", "2024-03-20", "netflix.com"),
        ];
        let bills = detect_recurring_bills(&history, date("2024-04-02"));
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].name, "netflix.com");
        assert_eq!(bills[0].due_date, date("2024-04-20"));
        assert_eq!(bills[0].amount, 16.16);
    }

    #[test]
    fn test_due_next_month_when_day_passed() {
        let history = vec![
            named_tx(100.0, "Utilities", "2024-01-05", "Power Co"),
            named_tx(100.0, "Utilities", "2024-02-05", "Power Co"),
        ];
        let bills = detect_recurring_bills(&history, date("2024-03-10"));
        assert_eq!(bills[0].due_date, date("2024-04-05"));
    }

    #[test]
    fn test_rejects_irregular_merchants() {
        let history = vec![
            // inconsistent amounts
            named_tx(20.0, "Dining", "2024-01-05", "Cafe"),
            named_tx(45.0, "Dining", "2024-02-05", "Cafe"),
            // weekly, not monthly
            named_tx(60.0, "Groceries", "2024-01-01", "Market"),
            named_tx(60.0, "Groceries", "2024-01-08", "Market"),
            // single charge
            named_tx(9.99, "Subscriptions", "2024-01-03", "Music"),
        ];
        assert!(detect_recurring_bills(&history, date("2024-02-10")).is_empty());
    }

    #[test]
    fn test_safe_to_spend_with_bills() {
        let bills = vec![
            bill("Power Co", 100.0, "2024-04-12"),
            bill("Phone", 50.0, "2024-04-17"),
            bill("Gym", 40.0, "2024-04-30"),
        ];
        let result = calculate_safe_to_spend(
            2000.0,
            3000.0,
            1000.0,
            &bills,
            DEFAULT_LOOK_AHEAD_DAYS,
            date("2024-04-10"),
        );

        assert_eq!(result.days_remaining, 20);
        assert_eq!(result.upcoming_bills_count, 2);
        assert_eq!(result.upcoming_bills_total, 150.0);
        assert_eq!(result.upcoming_bill_names, vec!["Power Co", "Phone"]);
        assert_eq!(result.daily_budget_remaining, 100.0);
        assert_eq!(result.amount, 1750.0);
        assert_eq!(result.warning.as_deref(), Some("You have 2 bills due soon."));
    }

    #[test]
    fn test_safe_to_spend_negative_and_low() {
        let negative = calculate_safe_to_spend(50.0, 3000.0, 0.0, &[], 7, date("2024-04-10"));
        assert!(negative.is_negative);
        assert_eq!(negative.amount, 0.0);
        assert!(negative.warning.unwrap().contains("negative"));

        let low = calculate_safe_to_spend(130.0, 2000.0, 0.0, &[], 7, date("2024-04-10"));
        assert!(!low.is_negative);
        assert_eq!(low.amount, 30.0);
        assert!(low.warning.unwrap().contains("low"));
    }

    #[test]
    fn test_last_day_counts_as_one() {
        let result = calculate_safe_to_spend(500.0, 100.0, 0.0, &[], 7, date("2024-04-30"));
        assert_eq!(result.days_remaining, 1);
        assert_eq!(result.amount, 400.0);
        assert!(result.warning.is_none());
    }
}
