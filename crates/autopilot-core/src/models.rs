//! Domain models for the budget autopilot
//!
//! Raw records (`Transaction`, `IncomeRecord`) are owned by whoever ingests
//! them; the engine only reads them and derives everything else.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Categories with a canonical spelling. Case-insensitive matches fold onto these.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "Rent",
    "Insurance",
    "Utilities",
    "Subscriptions",
    "Groceries",
    "Dining",
    "Shopping",
    "Entertainment",
    "Transportation",
    "Healthcare",
    "Travel",
    "Coffee",
    "Food",
    "Housing",
    "Income",
    "Savings",
    "Other",
];

/// A spending category
///
/// Validated at the boundary: surrounding whitespace is trimmed, empty names
/// are rejected, and well-known names are canonicalized ("rent" -> "Rent").
/// Case folding applies only to [`KNOWN_CATEGORIES`]. Anything else passes
/// through verbatim, so "food & drink" and "Food & Drink" stay two distinct
/// categories.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidData("Category must not be empty".into()));
        }

        let canonical = KNOWN_CATEGORIES
            .iter()
            .find(|known| known.eq_ignore_ascii_case(trimmed))
            .map(|known| known.to_string())
            .unwrap_or_else(|| trimmed.to_string());

        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// For compile-time names that are already canonical
    pub(crate) fn from_known(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn rent() -> Self {
        Self("Rent".to_string())
    }

    pub fn insurance() -> Self {
        Self("Insurance".to_string())
    }
}

impl TryFrom<String> for Category {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for Category {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Category {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A calendar month (YYYY-MM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn first_day(&self) -> NaiveDate {
        clamped_date(self.year, self.month, 1)
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn next(&self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// Shift by whole months; fails instead of overflowing the year
    pub fn add_months(&self, months: i32) -> Result<Self> {
        let index = self
            .year
            .checked_mul(12)
            .and_then(|i| i.checked_add(self.month as i32 - 1))
            .and_then(|i| i.checked_add(months))
            .ok_or_else(|| {
                Error::InvalidData(format!("{} shifted by {} months is out of range", self, months))
            })?;
        Ok(Self::new(index.div_euclid(12), index.rem_euclid(12) as u32 + 1))
    }

    /// Short label, e.g. "Jan 2026"
    pub fn label(&self) -> String {
        let name = MONTH_ABBREVIATIONS
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("???");
        format!("{} {}", name, self.year)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Number of days in a calendar month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// Build a date, clamping the day to the end of the month
pub fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Shift a date by whole months, clamping the day
pub fn add_months(date: NaiveDate, months: i32) -> Result<NaiveDate> {
    let target = MonthKey::from_date(date).add_months(months)?;
    let day = date.day().min(target.days_in_month());
    NaiveDate::from_ymd_opt(target.year, target.month, day)
        .ok_or_else(|| Error::InvalidDate(format!("{} shifted by {} months", date, months)))
}

fn check_amount(amount: f64, what: &str) -> Result<()> {
    if !amount.is_finite() {
        return Err(Error::InvalidData(format!("{} amount is not a number", what)));
    }
    if amount < 0.0 {
        return Err(Error::InvalidData(format!(
            "{} amount must not be negative: {}",
            what, amount
        )));
    }
    Ok(())
}

/// A historical spending record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Upstream id; a fingerprint is derived when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
    pub name: String,
}

impl Transaction {
    pub fn new(
        amount: f64,
        category: &str,
        date: NaiveDate,
        name: impl Into<String>,
    ) -> Result<Self> {
        let tx = Self {
            id: None,
            amount,
            category: Category::parse(category)?,
            date,
            name: name.into(),
        };
        tx.validate()?;
        Ok(tx)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_amount(self.amount, "Transaction")
    }

    /// Stable identifier: the upstream id, or a fingerprint of the record
    pub fn id(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.fingerprint())
    }

    /// SHA-256 over date, name, amount and category
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.date.to_string().as_bytes());
        hasher.update(self.name.as_bytes());
        hasher.update(self.amount.to_be_bytes());
        hasher.update(self.category.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// A historical income record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    pub amount: f64,
    pub date: NaiveDate,
}

impl IncomeRecord {
    pub fn new(amount: f64, date: NaiveDate) -> Result<Self> {
        let record = Self { amount, date };
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<()> {
        check_amount(self.amount, "Income")
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// Budget priority, which sets the savings skim off the discretionary pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Aggressive,
    Balanced,
    Lifestyle,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggressive => "aggressive",
            Self::Balanced => "balanced",
            Self::Lifestyle => "lifestyle",
        }
    }

    /// Fraction of the discretionary pool set aside as savings
    pub fn savings_rate(&self) -> f64 {
        match self {
            Self::Aggressive => 0.30,
            Self::Balanced => 0.20,
            Self::Lifestyle => 0.10,
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aggressive" => Ok(Self::Aggressive),
            "balanced" => Ok(Self::Balanced),
            "lifestyle" => Ok(Self::Lifestyle),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercase ASCII alphanumerics joined by single hyphens
pub fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Parse a YYYY-MM-DD date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidDate(format!("{}: {}", s.trim(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_category_canonicalization() {
        assert_eq!(Category::parse("rent").unwrap(), Category::rent());
        assert_eq!(Category::parse("  GROCERIES ").unwrap().as_str(), "Groceries");
        // Unknown names pass through untouched
        assert_eq!(Category::parse("Food & Drink").unwrap().as_str(), "Food & Drink");
        assert_ne!(
            Category::parse("Food & Drink").unwrap(),
            Category::parse("Food").unwrap()
        );
        assert_ne!(
            Category::parse("food & drink").unwrap(),
            Category::parse("Food & Drink").unwrap()
        );
        assert!(Category::parse("   ").is_err());
    }

    #[test]
    fn test_category_serde() {
        let category: Category = serde_json::from_str("\"insurance\"").unwrap();
        assert_eq!(category, Category::insurance());
        assert_eq!(serde_json::to_string(&category).unwrap(), "\"Insurance\"");
        assert!(serde_json::from_str::<Category>("\"\"").is_err());
    }

    #[test]
    fn test_transaction_validation() {
        assert!(Transaction::new(-5.0, "Dining", date("2024-01-01"), "Cafe").is_err());
        assert!(Transaction::new(f64::NAN, "Dining", date("2024-01-01"), "Cafe").is_err());
        assert!(Transaction::new(0.0, "Dining", date("2024-01-01"), "Cafe").is_ok());
        assert!(IncomeRecord::new(-1.0, date("2024-01-01")).is_err());
    }

    #[test]
    fn test_transaction_id_fallback() {
        let tx = Transaction::new(12.5, "Dining", date("2024-01-01"), "Cafe").unwrap();
        let same = Transaction::new(12.5, "dining", date("2024-01-01"), "Cafe").unwrap();
        assert_eq!(tx.id(), same.id());
        assert_eq!(tx.id().len(), 64);

        let explicit = tx.clone().with_id("plaid-123");
        assert_eq!(explicit.id(), "plaid-123");
    }

    #[test]
    fn test_transaction_json_shape() {
        let json = r#"{"amount": 42.0, "category": "Shopping", "date": "2024-03-05", "name": "Store"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.month(), MonthKey::new(2024, 3));
        assert!(tx.id.is_none());
    }

    #[test]
    fn test_month_key_arithmetic() {
        let dec = MonthKey::new(2024, 12);
        assert_eq!(dec.next(), MonthKey::new(2025, 1));
        assert_eq!(dec.add_months(-12).unwrap(), MonthKey::new(2023, 12));
        assert_eq!(MonthKey::new(2024, 1).add_months(-1).unwrap(), MonthKey::new(2023, 12));
        assert_eq!(dec.to_string(), "2024-12");
        assert_eq!(dec.label(), "Dec 2024");
        assert_eq!(MonthKey::new(2024, 2).days_in_month(), 29);
        assert_eq!(MonthKey::new(2023, 2).days_in_month(), 28);
    }

    #[test]
    fn test_add_months_clamps() {
        assert_eq!(add_months(date("2024-01-31"), 1).unwrap(), date("2024-02-29"));
        assert_eq!(add_months(date("2024-11-15"), 3).unwrap(), date("2025-02-15"));
        assert_eq!(clamped_date(2024, 4, 35), date("2024-04-30"));
    }

    #[test]
    fn test_add_months_out_of_range() {
        let month = MonthKey::new(2024, 6);
        assert!(matches!(month.add_months(i32::MAX), Err(Error::InvalidData(_))));
        assert!(matches!(
            MonthKey::new(-100, 1).add_months(i32::MIN),
            Err(Error::InvalidData(_))
        ));
        assert!(add_months(date("2024-06-15"), 4_000_000).is_err());
        assert_eq!(add_months(date("2024-06-15"), 1200).unwrap(), date("2124-06-15"));
    }

    #[test]
    fn test_priority_rates() {
        assert!(Priority::Aggressive.savings_rate() > Priority::Balanced.savings_rate());
        assert!(Priority::Balanced.savings_rate() > Priority::Lifestyle.savings_rate());
        assert_eq!("Balanced".parse::<Priority>().unwrap(), Priority::Balanced);
        assert!("reckless".parse::<Priority>().is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("New Year's Eve"), "new-year-s-eve");
        assert_eq!(slugify("  Netflix.com  "), "netflix-com");
        assert_eq!(slugify("***"), "");
    }
}
