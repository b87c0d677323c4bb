//! Budget allocation
//!
//! Fixed and protected categories pass through at their monthly average.
//! What is left of income becomes the discretionary pool: a savings skim is
//! taken according to the priority and the rest is split across the
//! discretionary categories in proportion to their historical share.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{BudgetStatus, CategoryBudget, CategorySpending, ALWAYS_PROTECTED};
use crate::models::{Category, Priority};
use crate::stats::round2;

/// Variance above this share of the monthly average earns the buffer
const VOLATILITY_RATIO: f64 = 0.3;
const VOLATILITY_BUFFER: f64 = 1.1;

/// Allocations together with the pool arithmetic that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
    pub monthly_income: f64,
    pub fixed_costs: f64,
    pub discretionary_pool: f64,
    pub savings_target: f64,
    pub spending_pool: f64,
    /// Fixed costs exceed income; discretionary allocations are negative
    pub over_committed: bool,
    pub budgets: Vec<CategoryBudget>,
}

/// Rent and Insurance first, then the user's additions without duplicates
pub fn protected_categories(non_negotiables: &[Category]) -> Vec<Category> {
    let mut protected: Vec<Category> = ALWAYS_PROTECTED
        .iter()
        .filter_map(|name| Category::parse(name).ok())
        .collect();
    for category in non_negotiables {
        if !protected.contains(category) {
            protected.push(category.clone());
        }
    }
    protected
}

/// Compute category allocations for a month
///
/// A negative discretionary pool is not clamped: discretionary allocations
/// go negative and the plan is marked `over_committed`.
pub fn plan_allocations(
    monthly_income: f64,
    spending: &[CategorySpending],
    priority: Priority,
    non_negotiables: &[Category],
) -> AllocationPlan {
    let protected = protected_categories(non_negotiables);
    let is_locked = |cs: &CategorySpending| cs.is_fixed || protected.contains(&cs.category);

    let fixed_costs: f64 = spending
        .iter()
        .filter(|cs| is_locked(*cs))
        .map(|cs| cs.monthly_average)
        .sum();

    let discretionary_pool = monthly_income - fixed_costs;
    let savings_target = discretionary_pool * priority.savings_rate();
    let spending_pool = discretionary_pool - savings_target;

    let discretionary_spending: f64 = spending
        .iter()
        .filter(|cs| !is_locked(*cs))
        .map(|cs| cs.monthly_average)
        .sum();

    let budgets = spending
        .iter()
        .map(|cs| {
            let locked = is_locked(cs);
            let allocated = if locked {
                cs.monthly_average
            } else if discretionary_spending > 0.0 {
                let share = spending_pool * (cs.monthly_average / discretionary_spending);
                if cs.variance > cs.monthly_average * VOLATILITY_RATIO {
                    share * VOLATILITY_BUFFER
                } else {
                    share
                }
            } else {
                0.0
            };

            let allocated = round2(allocated);
            CategoryBudget {
                category: cs.category.clone(),
                allocated,
                spent: 0.0,
                remaining: allocated,
                percent_used: 0.0,
                is_fixed: locked,
                status: BudgetStatus::Healthy,
            }
        })
        .collect();

    let over_committed = discretionary_pool < 0.0;
    if over_committed {
        warn!(
            income = monthly_income,
            fixed_costs, discretionary_pool, "Fixed costs exceed income"
        );
    }
    debug!(
        fixed_costs,
        discretionary_pool,
        savings_target,
        spending_pool,
        priority = %priority,
        "Planned allocations"
    );

    AllocationPlan {
        monthly_income,
        fixed_costs,
        discretionary_pool,
        savings_target,
        spending_pool,
        over_committed,
        budgets,
    }
}

/// Category allocations only
pub fn calculate_budget_allocations(
    monthly_income: f64,
    spending: &[CategorySpending],
    priority: Priority,
    non_negotiables: &[Category],
) -> Vec<CategoryBudget> {
    plan_allocations(monthly_income, spending, priority, non_negotiables).budgets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::analyze_spending_by_category;
    use crate::test_utils::tx;

    fn spending(category: &str, average: f64, variance: f64, is_fixed: bool) -> CategorySpending {
        CategorySpending {
            category: Category::parse(category).unwrap(),
            total: average,
            transactions: Vec::new(),
            monthly_average: average,
            variance,
            is_fixed,
        }
    }

    fn allocated(budgets: &[CategoryBudget], name: &str) -> f64 {
        budgets.iter().find(|b| b.category == name).unwrap().allocated
    }

    #[test]
    fn test_proportional_split() {
        let profile = vec![
            spending("Rent", 1500.0, 0.0, true),
            spending("Dining", 300.0, 10.0, false),
            spending("Shopping", 100.0, 10.0, false),
        ];
        let plan = plan_allocations(4000.0, &profile, Priority::Balanced, &[]);

        assert_eq!(plan.fixed_costs, 1500.0);
        assert_eq!(plan.discretionary_pool, 2500.0);
        assert_eq!(plan.savings_target, 500.0);
        assert_eq!(plan.spending_pool, 2000.0);
        assert_eq!(allocated(&plan.budgets, "Rent"), 1500.0);
        assert_eq!(allocated(&plan.budgets, "Dining"), 1500.0);
        assert_eq!(allocated(&plan.budgets, "Shopping"), 500.0);
        assert!(!plan.over_committed);
    }

    #[test]
    fn test_volatility_buffer() {
        let profile = vec![
            spending("Dining", 100.0, 31.0, false),
            spending("Shopping", 100.0, 10.0, false),
        ];
        let budgets = calculate_budget_allocations(1000.0, &profile, Priority::Lifestyle, &[]);
        // pool 1000, spending pool 900, 450 each, Dining gets 10% more
        assert_eq!(allocated(&budgets, "Dining"), 495.0);
        assert_eq!(allocated(&budgets, "Shopping"), 450.0);
    }

    #[test]
    fn test_protected_always_pass_through() {
        // Rent marked variable and not listed by the user: still protected
        let profile = vec![
            spending("Rent", 1200.0, 90000.0, false),
            spending("Insurance", 150.0, 900.0, false),
            spending("Dining", 400.0, 500.0, false),
        ];
        for priority in [Priority::Aggressive, Priority::Balanced, Priority::Lifestyle] {
            let budgets = calculate_budget_allocations(1000.0, &profile, priority, &[]);
            assert_eq!(allocated(&budgets, "Rent"), 1200.0);
            assert_eq!(allocated(&budgets, "Insurance"), 150.0);
            assert!(budgets.iter().filter(|b| b.category != "Dining").all(|b| b.is_fixed));
        }
    }

    #[test]
    fn test_user_non_negotiables() {
        let profile = vec![
            spending("Groceries", 600.0, 5000.0, false),
            spending("Dining", 200.0, 5000.0, false),
        ];
        let groceries = Category::parse("Groceries").unwrap();
        let budgets =
            calculate_budget_allocations(3000.0, &profile, Priority::Balanced, &[groceries]);
        assert_eq!(allocated(&budgets, "Groceries"), 600.0);
        assert!(budgets[0].is_fixed);
    }

    #[test]
    fn test_negative_pool_not_clamped() {
        let profile = vec![
            spending("Rent", 2000.0, 0.0, true),
            spending("Dining", 100.0, 0.0, false),
        ];
        let plan = plan_allocations(1500.0, &profile, Priority::Balanced, &[]);
        assert!(plan.over_committed);
        assert_eq!(plan.discretionary_pool, -500.0);
        assert!(allocated(&plan.budgets, "Dining") < 0.0);
        assert_eq!(allocated(&plan.budgets, "Rent"), 2000.0);
    }

    #[test]
    fn test_no_discretionary_spending() {
        let profile = vec![
            spending("Rent", 1000.0, 0.0, true),
            spending("Dining", 0.0, 0.0, false),
        ];
        let budgets = calculate_budget_allocations(3000.0, &profile, Priority::Balanced, &[]);
        assert_eq!(allocated(&budgets, "Dining"), 0.0);
    }

    #[test]
    fn test_savings_target_monotonic_in_priority() {
        let transactions = vec![
            tx(1000.0, "Rent", "2024-01-01"),
            tx(1000.0, "Rent", "2024-02-01"),
            tx(120.0, "Dining", "2024-01-03"),
            tx(340.0, "Dining", "2024-02-03"),
        ];
        let profile = analyze_spending_by_category(&transactions);
        let target = |p| plan_allocations(4000.0, &profile, p, &[]).savings_target;

        assert!(target(Priority::Lifestyle) < target(Priority::Balanced));
        assert!(target(Priority::Balanced) < target(Priority::Aggressive));
    }

    #[test]
    fn test_allocations_within_income() {
        let profile = vec![
            spending("Rent", 1000.0, 0.0, true),
            spending("Dining", 300.0, 80.0, false),
            spending("Shopping", 200.0, 10.0, false),
            spending("Travel", 50.0, 1.0, false),
        ];
        for priority in [Priority::Aggressive, Priority::Balanced, Priority::Lifestyle] {
            let plan = plan_allocations(3000.0, &profile, priority, &[]);
            let total: f64 = plan.budgets.iter().map(|b| b.allocated).sum();
            assert!(total + plan.savings_target <= 3000.0 + 0.01);
        }
    }
}
