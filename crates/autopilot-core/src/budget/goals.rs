//! Savings goal progress

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Category;
use crate::stats::round2;

/// Progress below this share of the expected pace is behind schedule
const BEHIND_RATIO: f64 = 0.85;
/// Progress above this share of the expected pace is ahead of schedule
const AHEAD_RATIO: f64 = 1.15;
const WEEKS_PER_MONTH: f64 = 4.33;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    OnTrack,
    Behind,
    Ahead,
    Completed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::Behind => "behind",
            Self::Ahead => "ahead",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_track" => Ok(Self::OnTrack),
            "behind" => Ok(Self::Behind),
            "ahead" => Ok(Self::Ahead),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown goal status: {}", s)),
        }
    }
}

/// A user-created savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub linked_event_id: Option<String>,
    #[serde(default)]
    pub weekly_contribution: Option<f64>,
    pub created_at: NaiveDate,
}

/// Computed progress for a goal as of a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalEvaluation {
    pub name: String,
    pub status: GoalStatus,
    pub percent_complete: f64,
    pub remaining_amount: f64,
    /// None without a deadline
    pub days_remaining: Option<i64>,
    pub required_weekly: Option<f64>,
    /// Linear progress expected by now, in percent
    pub expected_progress: Option<f64>,
    /// Extra monthly saving needed when behind
    pub monthly_deficit: Option<f64>,
    /// Approximate days ahead of the linear pace
    pub days_ahead: Option<i64>,
}

/// Evaluate a goal against linear progress from creation to deadline
pub fn evaluate_goal(goal: &SavingsGoal, today: NaiveDate) -> GoalEvaluation {
    let percent_complete = if goal.target_amount > 0.0 {
        goal.current_amount / goal.target_amount * 100.0
    } else {
        100.0
    };
    let remaining_amount = (goal.target_amount - goal.current_amount).max(0.0);

    let mut evaluation = GoalEvaluation {
        name: goal.name.clone(),
        status: GoalStatus::OnTrack,
        percent_complete: round2(percent_complete),
        remaining_amount: round2(remaining_amount),
        days_remaining: None,
        required_weekly: None,
        expected_progress: None,
        monthly_deficit: None,
        days_ahead: None,
    };

    if percent_complete >= 100.0 {
        evaluation.status = GoalStatus::Completed;
        evaluation.days_remaining = goal.deadline.map(|d| (d - today).num_days().max(0));
        return evaluation;
    }

    let Some(deadline) = goal.deadline else {
        return evaluation;
    };

    let days_remaining = (deadline - today).num_days().max(1);
    let weeks_remaining = (days_remaining as f64 / 7.0).max(1.0);
    let required_weekly = remaining_amount / weeks_remaining;
    let days_elapsed = (today - goal.created_at).num_days().max(1);
    let expected =
        days_elapsed as f64 / (days_elapsed + days_remaining) as f64 * 100.0;

    evaluation.days_remaining = Some(days_remaining);
    evaluation.required_weekly = Some(round2(required_weekly));
    evaluation.expected_progress = Some(round2(expected));

    if percent_complete < expected * BEHIND_RATIO {
        evaluation.status = GoalStatus::Behind;
        let weekly_deficit = required_weekly - goal.weekly_contribution.unwrap_or(0.0);
        evaluation.monthly_deficit = Some((weekly_deficit * WEEKS_PER_MONTH).round());
    } else if percent_complete > expected * AHEAD_RATIO {
        evaluation.status = GoalStatus::Ahead;
        let span = (days_elapsed + days_remaining) as f64;
        evaluation.days_ahead = Some(((percent_complete - expected) / 100.0 * span).round() as i64);
    }

    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::date;

    fn goal(current: f64, created: &str, deadline: Option<&str>) -> SavingsGoal {
        SavingsGoal {
            id: None,
            name: "Vacation".to_string(),
            target_amount: 1000.0,
            current_amount: current,
            deadline: deadline.map(date),
            category: None,
            linked_event_id: None,
            weekly_contribution: Some(20.0),
            created_at: date(created),
        }
    }

    #[test]
    fn test_completed() {
        let eval = evaluate_goal(&goal(1000.0, "2024-01-01", Some("2024-12-31")), date("2024-06-01"));
        assert_eq!(eval.status, GoalStatus::Completed);
        assert_eq!(eval.percent_complete, 100.0);
        assert_eq!(eval.remaining_amount, 0.0);
    }

    #[test]
    fn test_on_track_at_linear_pace() {
        // 50 of 100 days elapsed, 50% saved
        let eval = evaluate_goal(&goal(500.0, "2024-01-01", Some("2024-04-10")), date("2024-02-20"));
        assert_eq!(eval.status, GoalStatus::OnTrack);
        assert_eq!(eval.days_remaining, Some(50));
        assert_eq!(eval.expected_progress, Some(50.0));
        // 500 remaining over 50/7 weeks
        assert_eq!(eval.required_weekly, Some(70.0));
    }

    #[test]
    fn test_behind_and_ahead() {
        let behind = evaluate_goal(&goal(200.0, "2024-01-01", Some("2024-04-10")), date("2024-02-20"));
        assert_eq!(behind.status, GoalStatus::Behind);
        assert!(behind.monthly_deficit.unwrap() > 0.0);

        let ahead = evaluate_goal(&goal(800.0, "2024-01-01", Some("2024-04-10")), date("2024-02-20"));
        assert_eq!(ahead.status, GoalStatus::Ahead);
        assert_eq!(ahead.days_ahead, Some(30));
    }

    #[test]
    fn test_no_deadline_stays_on_track() {
        let eval = evaluate_goal(&goal(10.0, "2024-01-01", None), date("2024-12-01"));
        assert_eq!(eval.status, GoalStatus::OnTrack);
        assert!(eval.days_remaining.is_none());
        assert!(eval.required_weekly.is_none());
    }

    #[test]
    fn test_past_deadline_needs_everything_this_week() {
        let eval = evaluate_goal(&goal(400.0, "2024-01-01", Some("2024-03-01")), date("2024-03-15"));
        assert_eq!(eval.days_remaining, Some(1));
        assert_eq!(eval.required_weekly, Some(600.0));
        assert_eq!(eval.status, GoalStatus::Behind);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&GoalStatus::OnTrack).unwrap(), "\"on_track\"");
        assert_eq!("behind".parse::<GoalStatus>().unwrap(), GoalStatus::Behind);
    }
}
