//! Monthly income estimation

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{IncomeRecord, MonthKey};
use crate::stats::{mean, percentile, std_dev};

/// Coefficient of variation above which income counts as volatile
const VOLATILITY_CV: f64 = 0.2;
/// Percentile used for volatile income
const CONSERVATIVE_PERCENTILE: f64 = 0.8;

/// Estimate a stable monthly income from income records
///
/// Sums each calendar month and averages the sums. When the monthly sums
/// vary by more than 20% (coefficient of variation), the 80th percentile is
/// used instead so that a one-off spike does not inflate the budget.
/// Returns 0 when there are no records.
pub fn calculate_monthly_income(records: &[IncomeRecord]) -> f64 {
    let mut monthly: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for record in records {
        *monthly.entry(record.month()).or_insert(0.0) += record.amount;
    }

    let totals: Vec<f64> = monthly.into_values().collect();
    if totals.is_empty() {
        return 0.0;
    }

    let average = mean(&totals);
    if average <= 0.0 {
        return 0.0;
    }

    let cv = std_dev(&totals) / average;
    if cv > VOLATILITY_CV {
        let conservative = percentile(&totals, CONSERVATIVE_PERCENTILE);
        debug!(cv, average, conservative, "Income is volatile, using percentile");
        return conservative;
    }

    average
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::income;

    #[test]
    fn test_steady_income_uses_mean() {
        let records = vec![
            income(1000.0, "2024-01-05"),
            income(1000.0, "2024-02-05"),
            income(1000.0, "2024-03-05"),
        ];
        assert_eq!(calculate_monthly_income(&records), 1000.0);
    }

    #[test]
    fn test_records_summed_per_month() {
        let records = vec![
            income(500.0, "2024-01-05"),
            income(500.0, "2024-01-20"),
            income(1000.0, "2024-02-05"),
        ];
        assert_eq!(calculate_monthly_income(&records), 1000.0);
    }

    #[test]
    fn test_volatile_income_uses_percentile() {
        // mean 2000, stddev ~816 -> cv 0.41
        let records = vec![
            income(1000.0, "2024-01-05"),
            income(2000.0, "2024-02-05"),
            income(3000.0, "2024-03-05"),
        ];
        assert_eq!(calculate_monthly_income(&records), 3000.0);
    }

    #[test]
    fn test_empty_and_zero_income() {
        assert_eq!(calculate_monthly_income(&[]), 0.0);
        assert_eq!(calculate_monthly_income(&[income(0.0, "2024-01-05")]), 0.0);
    }
}
