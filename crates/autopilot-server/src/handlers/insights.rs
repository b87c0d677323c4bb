//! Spending pattern handlers

use axum::Json;
use serde::{Deserialize, Serialize};

use super::Records;
use crate::AppError;
use autopilot_core::{analyze_all_patterns, top_spending_insights, Insight, SpendingPattern};

/// Request body for pattern analysis
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternsRequest {
    #[serde(flatten)]
    pub records: Records,
    /// Number of top patterns to return as insights (default 5)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    5
}

/// Response for pattern analysis
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternsResponse {
    /// Every detected pattern, largest savings opportunity first
    pub patterns: Vec<SpendingPattern>,
    /// The top patterns as display-ready insights
    pub insights: Vec<Insight>,
}

/// POST /api/insights/patterns - Detect spending patterns
pub async fn patterns(Json(req): Json<PatternsRequest>) -> Result<Json<PatternsResponse>, AppError> {
    req.records.validate()?;

    let patterns = analyze_all_patterns(&req.records.transactions);
    let insights = top_spending_insights(&patterns, req.limit)
        .iter()
        .map(Insight::from)
        .collect();

    Ok(Json(PatternsResponse { patterns, insights }))
}
