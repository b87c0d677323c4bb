//! Regret leaderboard
//!
//! Replays history without each candidate decision and ranks the decisions
//! by how much better off the user would be today.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::operations::{Operation, OperationSet};
use super::{EventTag, TimeMachine};
use crate::budget::ALWAYS_PROTECTED;
use crate::models::Category;

/// How many of the largest single purchases are replayed
const MAX_EVENT_CANDIDATES: usize = 20;
/// Categories averaging less than this per month are not worth a reduction
const MIN_CATEGORY_MONTHLY: f64 = 100.0;
/// Series costing less than this in total are not worth cancelling
const MIN_SERIES_TOTAL: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegretCandidate {
    /// 1-based
    pub rank: usize,
    /// Event id, series id or `cat-<Category>`
    pub id: String,
    pub operation: Operation,
    /// Net worth gained today had the decision been undone
    pub potential_savings: f64,
    /// Months sooner the savings goal would be reached
    pub goal_time_reduction: Option<f64>,
    pub description: String,
    pub category: Category,
}

fn is_protected(category: &Category) -> bool {
    ALWAYS_PROTECTED.iter().any(|p| category == p)
}

/// Rank decisions whose reversal would have improved net worth today
///
/// Candidates come from the largest discretionary or one-off purchases,
/// a proportional cut to each discretionary category, and cancelling each
/// recurring series outside the protected categories. Ordered by potential
/// savings, then by goal time reduction.
pub fn find_top_regrets(machine: &TimeMachine, limit: usize) -> Vec<RegretCandidate> {
    let settings = machine.settings();
    let baseline = machine.baseline();
    let mut candidates = Vec::new();

    let mut evaluate = |id: String, op: Operation, description: String, category: Category| {
        let ops = OperationSet::new().with(op.clone());
        let comparison = match machine.compare(&ops) {
            Ok(comparison) => comparison,
            Err(e) => {
                warn!(candidate = %id, error = %e, "Skipping regret candidate");
                return;
            }
        };
        let delta = comparison.delta;
        if delta.net_worth_delta > 0.0 {
            candidates.push(RegretCandidate {
                rank: 0,
                id,
                operation: op,
                potential_savings: delta.net_worth_delta,
                goal_time_reduction: delta.goal_time_delta,
                description,
                category,
            });
        }
    };

    let mut large: Vec<_> = machine
        .events()
        .iter()
        .filter(|e| e.has_tag(EventTag::Discretionary) || e.has_tag(EventTag::OneOff))
        .filter(|e| e.amount > settings.min_event_amount)
        .collect();
    large.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    for event in large.into_iter().take(MAX_EVENT_CANDIDATES) {
        evaluate(
            event.id.clone(),
            Operation::Remove {
                event_id: event.id.clone(),
            },
            format!("Undo \"{}\" (${:.0})", event.merchant, event.amount),
            event.category.clone(),
        );
    }

    let cut_percent = ((1.0 - settings.category_scale_factor) * 100.0).round();
    for pattern in machine.behavior_patterns() {
        if !super::is_discretionary(&pattern.category) || pattern.avg_monthly <= MIN_CATEGORY_MONTHLY {
            continue;
        }
        evaluate(
            format!("cat-{}", pattern.category),
            Operation::ScaleCategory {
                category: pattern.category.clone(),
                factor: settings.category_scale_factor,
            },
            format!("Reduce {} by {:.0}%", pattern.category, cut_percent),
            pattern.category.clone(),
        );
    }

    for series in machine.series() {
        if series.event_ids.len() < 3 || series.total_cost <= MIN_SERIES_TOTAL || is_protected(&series.category) {
            continue;
        }
        evaluate(
            series.id.clone(),
            Operation::RemoveSeries {
                series_id: series.id.clone(),
            },
            format!("Cancel {} subscription", series.merchant),
            series.category.clone(),
        );
    }

    candidates.sort_by(|a, b| {
        b.potential_savings
            .total_cmp(&a.potential_savings)
            .then_with(|| {
                b.goal_time_reduction
                    .unwrap_or(0.0)
                    .total_cmp(&a.goal_time_reduction.unwrap_or(0.0))
            })
    });
    candidates.truncate(limit);
    for (i, candidate) in candidates.iter_mut().enumerate() {
        candidate.rank = i + 1;
    }

    debug!(
        baseline_net_worth = baseline.net_worth_today,
        candidates = candidates.len(),
        "Ranked regret candidates"
    );
    candidates
}
