//! Time machine handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use super::Records;
use crate::{AppError, AppState};
use autopilot_core::timemachine::{find_top_regrets, BranchComparison};
use autopilot_core::{OperationSet, RegretCandidate, TimeMachine};

/// Optional replay window, both ends or neither
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayWindow {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReplayWindow {
    fn range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, AppError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start <= end => Ok(Some((start, end))),
            (Some(_), Some(_)) => Err(AppError::bad_request("startDate is after endDate")),
            (None, None) => Ok(None),
            _ => Err(AppError::bad_request(
                "startDate and endDate must be given together",
            )),
        }
    }
}

fn machine(
    state: &AppState,
    records: &Records,
    window: &ReplayWindow,
) -> Result<TimeMachine, AppError> {
    records.validate()?;
    Ok(TimeMachine::new(
        &records.transactions,
        &records.income,
        window.range()?,
        state.settings.timemachine.clone(),
    ))
}

/// Request body for a branch replay
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRequest {
    #[serde(flatten)]
    pub records: Records,
    #[serde(flatten)]
    pub window: ReplayWindow,
    pub operations: OperationSet,
}

/// POST /api/timemachine/branch - Replay history with edits and compare
pub async fn branch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BranchRequest>,
) -> Result<Json<BranchComparison>, AppError> {
    let machine = machine(&state, &req.records, &req.window)?;
    let comparison = machine.compare(&req.operations).map_err(AppError::engine)?;
    Ok(Json(comparison))
}

/// Request body for the regret leaderboard
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegretsRequest {
    #[serde(flatten)]
    pub records: Records,
    #[serde(flatten)]
    pub window: ReplayWindow,
    /// Defaults to the configured limit
    pub limit: Option<usize>,
}

/// POST /api/timemachine/regrets - Rank past decisions by potential savings
pub async fn regrets(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegretsRequest>,
) -> Result<Json<Vec<RegretCandidate>>, AppError> {
    let machine = machine(&state, &req.records, &req.window)?;
    let limit = req.limit.unwrap_or(state.settings.timemachine.regret_limit);
    Ok(Json(find_top_regrets(&machine, limit)))
}
