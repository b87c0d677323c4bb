//! Savings goal handler

use axum::Json;
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::AppError;
use autopilot_core::{evaluate_goal, GoalEvaluation, SavingsGoal};

/// Request body for goal evaluation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsRequest {
    pub goals: Vec<SavingsGoal>,
    pub today: Option<NaiveDate>,
}

/// POST /api/goals/evaluate - Progress and status for each goal
pub async fn evaluate_goals(
    Json(req): Json<GoalsRequest>,
) -> Result<Json<Vec<GoalEvaluation>>, AppError> {
    if let Some(goal) = req
        .goals
        .iter()
        .find(|g| !g.target_amount.is_finite() || g.target_amount < 0.0)
    {
        return Err(AppError::bad_request(&format!(
            "Invalid targetAmount for goal {}",
            goal.name
        )));
    }

    let today = req.today.unwrap_or_else(|| Local::now().date_naive());
    Ok(Json(
        req.goals.iter().map(|g| evaluate_goal(g, today)).collect(),
    ))
}
