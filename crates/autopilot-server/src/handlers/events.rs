//! Upcoming event handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use super::Records;
use crate::{AppError, AppState};
use autopilot_core::{get_all_upcoming_events, AnalyzedNewsEvent, CreateEventInput, DetectedEvent};

/// Request body for upcoming events
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsRequest {
    #[serde(flatten)]
    pub records: Records,
    /// News already analyzed upstream
    #[serde(default)]
    pub news: Vec<AnalyzedNewsEvent>,
    /// Events the user entered by hand
    #[serde(default)]
    pub user_events: Vec<CreateEventInput>,
    /// Defaults to the configured window
    pub days_ahead: Option<u32>,
}

/// POST /api/events - Calendar, historical, news and user events, soonest first
pub async fn upcoming_events(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EventsRequest>,
) -> Result<Json<Vec<DetectedEvent>>, AppError> {
    req.records.validate()?;
    if let Some(event) = req.user_events.iter().find(|e| !e.estimated_cost.is_finite()) {
        return Err(AppError::bad_request(&format!(
            "Invalid estimatedCost for {}",
            event.event_name
        )));
    }

    let today = req.records.today();
    let days_ahead = req.days_ahead.unwrap_or(state.settings.events.days_ahead);

    let mut events = get_all_upcoming_events(&req.records.transactions, &req.news, days_ahead, today);
    events.extend(
        req.user_events
            .into_iter()
            .map(|input| DetectedEvent::from_user(input, today)),
    );
    events.sort_by(|a, b| a.event_date.cmp(&b.event_date));

    Ok(Json(events))
}
