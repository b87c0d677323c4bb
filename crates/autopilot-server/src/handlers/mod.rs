//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area. Request bodies
//! carry the caller's records; nothing is stored between requests.

pub mod budget;
pub mod events;
pub mod goals;
pub mod insights;
pub mod simulate;
pub mod timemachine;

// Re-export all handlers for use in router
pub use budget::*;
pub use events::*;
pub use goals::*;
pub use insights::*;
pub use simulate::*;
pub use timemachine::*;

use axum::Json;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::AppError;
use autopilot_core::{IncomeRecord, Transaction};

/// Records and evaluation date shared by most request bodies
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Records {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default, alias = "incomeRecords")]
    pub income: Vec<IncomeRecord>,
    /// Defaults to the server's local date
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

impl Records {
    /// Reject the whole request on the first invalid record
    pub fn validate(&self) -> Result<(), AppError> {
        for (i, tx) in self.transactions.iter().enumerate() {
            tx.validate()
                .map_err(|e| AppError::bad_request(&format!("transactions[{}]: {}", i, e)))?;
        }
        for (i, record) in self.income.iter().enumerate() {
            record
                .validate()
                .map_err(|e| AppError::bad_request(&format!("income[{}]: {}", i, e)))?;
        }
        Ok(())
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Response for health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
