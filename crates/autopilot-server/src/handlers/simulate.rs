//! Simulation handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use super::Records;
use crate::{AppError, AppState};
use autopilot_core::events::impacts_from_news;
use autopilot_core::{run_simulation, AnalyzedNewsEvent, SimulationInput, SimulationResult};

/// Request body for a simulation run
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    #[serde(flatten)]
    pub records: Records,
    pub scenario: SimulationInput,
    /// Analyzed news folded into the scenario's impacts
    #[serde(default)]
    pub news: Vec<AnalyzedNewsEvent>,
}

/// POST /api/simulate - Project balances forward under a scenario
pub async fn simulate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulationResult>, AppError> {
    req.records.validate()?;
    let today = req.records.today();

    let mut scenario = req.scenario;
    scenario
        .news_impacts
        .extend(impacts_from_news(&req.news, today));

    let result = run_simulation(
        &scenario,
        &req.records.transactions,
        &req.records.income,
        &state.settings.simulation,
        today,
    )
    .map_err(AppError::engine)?;

    Ok(Json(result))
}
