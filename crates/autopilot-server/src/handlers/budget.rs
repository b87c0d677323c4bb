//! Budget handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use super::Records;
use crate::{AppError, AppState};
use autopilot_core::{
    calculate_safe_to_spend, detect_recurring_bills, initialize_budget, month_to_date,
    BudgetInitialization, Category, MonthToDate, Priority, SafeToSpend, Transaction,
};
use autopilot_core::budget::DEFAULT_LOOK_AHEAD_DAYS;

/// Request body for budget initialization
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    #[serde(flatten)]
    pub records: Records,
    /// Defaults to the configured priority
    pub priority: Option<Priority>,
    #[serde(default)]
    pub non_negotiable_categories: Vec<Category>,
}

/// POST /api/budget/initialize - Derive config and allocations from history
pub async fn initialize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitializeRequest>,
) -> Result<Json<BudgetInitialization>, AppError> {
    req.records.validate()?;
    let priority = req
        .priority
        .unwrap_or(state.settings.budget.default_priority);

    Ok(Json(initialize_budget(
        &req.records.transactions,
        &req.records.income,
        priority,
        &req.non_negotiable_categories,
    )))
}

/// Request body for the month-to-date summary
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    #[serde(flatten)]
    pub records: Records,
    pub priority: Option<Priority>,
    #[serde(default)]
    pub non_negotiable_categories: Vec<Category>,
    #[serde(default)]
    pub account_balance: f64,
}

/// POST /api/budget/summary - Track the current month against derived budgets
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<MonthToDate>, AppError> {
    req.records.validate()?;
    let priority = req
        .priority
        .unwrap_or(state.settings.budget.default_priority);

    Ok(Json(month_to_date(
        &req.records.transactions,
        &req.records.income,
        priority,
        &req.non_negotiable_categories,
        req.account_balance,
        req.records.today(),
    )))
}

/// Request body for safe-to-spend
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeToSpendRequest {
    /// History used to detect recurring bills
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub account_balance: f64,
    pub monthly_budget: f64,
    #[serde(default)]
    pub spent_so_far: f64,
    #[serde(default = "default_look_ahead")]
    pub look_ahead_days: i64,
    pub today: Option<NaiveDate>,
}

fn default_look_ahead() -> i64 {
    DEFAULT_LOOK_AHEAD_DAYS
}

/// POST /api/budget/safe-to-spend - What can be spent today
pub async fn safe_to_spend(
    Json(req): Json<SafeToSpendRequest>,
) -> Result<Json<SafeToSpend>, AppError> {
    if req.look_ahead_days < 0 {
        return Err(AppError::bad_request("lookAheadDays must not be negative"));
    }
    let records = Records {
        transactions: req.transactions,
        today: req.today,
        ..Default::default()
    };
    records.validate()?;
    let today = records.today();

    let bills = detect_recurring_bills(&records.transactions, today);
    Ok(Json(calculate_safe_to_spend(
        req.account_balance,
        req.monthly_budget,
        req.spent_so_far,
        &bills,
        req.look_ahead_days,
        today,
    )))
}
