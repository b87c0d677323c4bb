//! Counterfactual edits to the event history

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::FinancialEvent;
use crate::error::{Error, Result};
use crate::models::{add_months, Category, MonthKey};
use crate::stats::round2;

/// Longest DELAY accepted in either direction (100 years)
pub const MAX_DELAY_MONTHS: i32 = 1200;

/// One hypothetical edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    #[serde(rename_all = "camelCase")]
    Remove { event_id: String },
    #[serde(rename_all = "camelCase")]
    RemoveSeries { series_id: String },
    #[serde(rename_all = "camelCase")]
    RemoveCategoryRange {
        category: Category,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    #[serde(rename_all = "camelCase")]
    Scale { event_id: String, factor: f64 },
    #[serde(rename_all = "camelCase")]
    ScaleCategory { category: Category, factor: f64 },
    /// Scale a category down proportionally in every month it exceeds the limit
    #[serde(rename_all = "camelCase")]
    Cap { category: Category, monthly_limit: f64 },
    /// Move an event by whole months
    #[serde(rename_all = "camelCase")]
    Delay { event_id: String, months: i32 },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Remove { .. } => "REMOVE",
            Operation::RemoveSeries { .. } => "REMOVE_SERIES",
            Operation::RemoveCategoryRange { .. } => "REMOVE_CATEGORY_RANGE",
            Operation::Scale { .. } => "SCALE",
            Operation::ScaleCategory { .. } => "SCALE_CATEGORY",
            Operation::Cap { .. } => "CAP",
            Operation::Delay { .. } => "DELAY",
        }
    }

    /// What the operation targets: an event, a series or a category
    pub fn target(&self) -> String {
        match self {
            Operation::Remove { event_id }
            | Operation::Scale { event_id, .. }
            | Operation::Delay { event_id, .. } => event_id.clone(),
            Operation::RemoveSeries { series_id } => series_id.clone(),
            Operation::RemoveCategoryRange {
                category,
                start_date,
                end_date,
            } => format!("{}:{}:{}", category, start_date, end_date),
            Operation::ScaleCategory { category, .. } | Operation::Cap { category, .. } => {
                category.to_string()
            }
        }
    }

    /// Set identity: two operations with the same key replace each other
    pub fn key(&self) -> (&'static str, String) {
        (self.kind(), self.target())
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Operation::Scale { factor, .. } | Operation::ScaleCategory { factor, .. } => {
                if !factor.is_finite() || *factor < 0.0 {
                    return Err(Error::InvalidData(format!(
                        "{} factor must be a non-negative number, got {}",
                        self.kind(),
                        factor
                    )));
                }
            }
            Operation::Cap { monthly_limit, .. } => {
                if !monthly_limit.is_finite() || *monthly_limit < 0.0 {
                    return Err(Error::InvalidData(format!(
                        "CAP monthlyLimit must be a non-negative number, got {}",
                        monthly_limit
                    )));
                }
            }
            Operation::RemoveCategoryRange {
                start_date,
                end_date,
                ..
            } => {
                if start_date > end_date {
                    return Err(Error::InvalidData(format!(
                        "REMOVE_CATEGORY_RANGE starts after it ends: {} > {}",
                        start_date, end_date
                    )));
                }
            }
            Operation::Delay { months, .. } => {
                if months.unsigned_abs() > MAX_DELAY_MONTHS as u32 {
                    return Err(Error::InvalidData(format!(
                        "DELAY months must be within ±{}, got {}",
                        MAX_DELAY_MONTHS, months
                    )));
                }
            }
            Operation::Remove { .. } | Operation::RemoveSeries { .. } => {}
        }
        Ok(())
    }

    fn apply(&self, events: Vec<FinancialEvent>) -> Result<Vec<FinancialEvent>> {
        let edited = match self {
            Operation::Remove { event_id } => events.into_iter().filter(|e| &e.id != event_id).collect(),
            Operation::RemoveSeries { series_id } => events
                .into_iter()
                .filter(|e| e.series_id.as_ref() != Some(series_id))
                .collect(),
            Operation::RemoveCategoryRange {
                category,
                start_date,
                end_date,
            } => events
                .into_iter()
                .filter(|e| {
                    &e.category != category || e.date < *start_date || e.date > *end_date
                })
                .collect(),
            Operation::Scale { event_id, factor } => events
                .into_iter()
                .map(|mut e| {
                    if &e.id == event_id {
                        e.amount = round2(e.amount * factor);
                    }
                    e
                })
                .collect(),
            Operation::ScaleCategory { category, factor } => events
                .into_iter()
                .map(|mut e| {
                    if &e.category == category {
                        e.amount = round2(e.amount * factor);
                    }
                    e
                })
                .collect(),
            Operation::Cap {
                category,
                monthly_limit,
            } => {
                let mut totals: BTreeMap<MonthKey, f64> = BTreeMap::new();
                for e in events.iter().filter(|e| &e.category == category) {
                    *totals.entry(MonthKey::from_date(e.date)).or_insert(0.0) += e.amount;
                }
                events
                    .into_iter()
                    .map(|mut e| {
                        if &e.category == category {
                            let total = totals
                                .get(&MonthKey::from_date(e.date))
                                .copied()
                                .unwrap_or(0.0);
                            if total > *monthly_limit {
                                e.amount = round2(e.amount * monthly_limit / total);
                            }
                        }
                        e
                    })
                    .collect()
            }
            Operation::Delay { event_id, months } => events
                .into_iter()
                .map(|mut e| {
                    if &e.id == event_id {
                        e.date = add_months(e.date, *months)?;
                    }
                    Ok(e)
                })
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(edited)
    }
}

/// Operations keyed by (type, target)
///
/// Inserting an operation whose key is already present replaces it in
/// place, so applying the same edit twice is the same as applying it once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Operation>", into = "Vec<Operation>")]
pub struct OperationSet {
    ops: Vec<Operation>,
}

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace; returns true if the key was new
    pub fn insert(&mut self, op: Operation) -> bool {
        let key = op.key();
        match self.ops.iter_mut().find(|existing| existing.key() == key) {
            Some(existing) => {
                *existing = op;
                false
            }
            None => {
                self.ops.push(op);
                true
            }
        }
    }

    pub fn with(mut self, op: Operation) -> Self {
        self.insert(op);
        self
    }

    /// Remove by key; returns the removed operation
    pub fn remove(&mut self, kind: &str, target: &str) -> Option<Operation> {
        let index = self
            .ops
            .iter()
            .position(|op| op.kind() == kind && op.target() == target)?;
        Some(self.ops.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        self.ops.iter().try_for_each(Operation::validate)
    }
}

impl From<Vec<Operation>> for OperationSet {
    fn from(ops: Vec<Operation>) -> Self {
        let mut set = Self::new();
        for op in ops {
            set.insert(op);
        }
        set
    }
}

impl From<OperationSet> for Vec<Operation> {
    fn from(set: OperationSet) -> Self {
        set.ops
    }
}

impl FromIterator<Operation> for OperationSet {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

/// Apply every operation in order, returning the edited events sorted by date
pub fn apply_operations(events: &[FinancialEvent], ops: &OperationSet) -> Result<Vec<FinancialEvent>> {
    let mut edited = ops.iter().try_fold(events.to_vec(), |acc, op| op.apply(acc))?;
    edited.sort_by_key(|e| e.date);
    Ok(edited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::date;

    #[test]
    fn test_insert_replaces_same_key() {
        let mut set = OperationSet::new();
        assert!(set.insert(Operation::ScaleCategory {
            category: Category::parse("Dining").unwrap(),
            factor: 0.5,
        }));
        assert!(!set.insert(Operation::ScaleCategory {
            category: Category::parse("dining").unwrap(),
            factor: 0.8,
        }));
        assert!(set.insert(Operation::Cap {
            category: Category::parse("Dining").unwrap(),
            monthly_limit: 100.0,
        }));

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.iter().next(),
            Some(&Operation::ScaleCategory {
                category: Category::parse("Dining").unwrap(),
                factor: 0.8,
            })
        );

        assert!(set.remove("CAP", "Dining").is_some());
        assert!(set.remove("CAP", "Dining").is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_deserialize_dedupes() {
        let set: OperationSet = serde_json::from_str(
            r#"[
                {"type": "REMOVE", "eventId": "tx-1"},
                {"type": "REMOVE", "eventId": "tx-1"},
                {"type": "DELAY", "eventId": "tx-1", "months": 2},
                {"type": "REMOVE_CATEGORY_RANGE", "category": "Dining",
                 "startDate": "2024-02-01", "endDate": "2024-03-31"}
            ]"#,
        )
        .unwrap();
        assert_eq!(set.len(), 3);

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json[0]["type"], "REMOVE");
        assert_eq!(json[1]["months"], 2);
        assert_eq!(json[2]["startDate"], "2024-02-01");
    }

    #[test]
    fn test_validate() {
        let bad = [
            Operation::Scale {
                event_id: "x".to_string(),
                factor: -1.0,
            },
            Operation::Cap {
                category: Category::parse("Dining").unwrap(),
                monthly_limit: f64::NAN,
            },
            Operation::RemoveCategoryRange {
                category: Category::parse("Dining").unwrap(),
                start_date: date("2024-03-01"),
                end_date: date("2024-02-01"),
            },
            Operation::Delay {
                event_id: "x".to_string(),
                months: 4_000_000,
            },
            Operation::Delay {
                event_id: "x".to_string(),
                months: i32::MIN,
            },
        ];
        for op in bad {
            assert!(matches!(op.validate(), Err(Error::InvalidData(_))), "{:?}", op);
        }
        for months in [-2, MAX_DELAY_MONTHS, -MAX_DELAY_MONTHS] {
            assert!(Operation::Delay {
                event_id: "x".to_string(),
                months,
            }
            .validate()
            .is_ok());
        }
    }
}
