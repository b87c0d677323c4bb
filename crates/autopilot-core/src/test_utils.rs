//! Test fixtures for autopilot-core
//!
//! Compact constructors for records.

use chrono::NaiveDate;

use crate::models::{IncomeRecord, Transaction};

/// Parse a YYYY-MM-DD date, panicking on bad input
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A transaction named after its category
pub fn tx(amount: f64, category: &str, day: &str) -> Transaction {
    Transaction::new(amount, category, date(day), format!("{} purchase", category)).unwrap()
}

/// A transaction with an explicit merchant name
pub fn named_tx(amount: f64, category: &str, day: &str, name: &str) -> Transaction {
    Transaction::new(amount, category, date(day), name).unwrap()
}

pub fn income(amount: f64, day: &str) -> IncomeRecord {
    IncomeRecord::new(amount, date(day)).unwrap()
}
