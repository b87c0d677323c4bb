//! Engine settings
//!
//! Holds the tunable defaults the engine falls back on when a caller does not
//! supply a value (look-ahead window, starting balances, savings goals).
//! Detection thresholds are not settings; they live next to the code that
//! uses them.
//!
//! ## Configuration Resolution
//!
//! Settings are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/autopilot/config/autopilot.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Priority;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/autopilot.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    pub default_priority: Priority,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            default_priority: Priority::Balanced,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Look-ahead window for upcoming events
    pub days_ahead: u32,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self { days_ahead: 90 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub starting_balance: f64,
    pub savings_goal: f64,
    /// Months of history used to build the projection baseline
    pub history_months: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            starting_balance: 5000.0,
            savings_goal: 50000.0,
            history_months: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeMachineSettings {
    pub starting_balance: f64,
    pub savings_goal: f64,
    pub regret_limit: usize,
    pub min_event_amount: f64,
    pub category_scale_factor: f64,
}

impl Default for TimeMachineSettings {
    fn default() -> Self {
        Self {
            starting_balance: 5000.0,
            savings_goal: 50000.0,
            regret_limit: 10,
            min_event_amount: 100.0,
            category_scale_factor: 0.8,
        }
    }
}

/// All engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub budget: BudgetSettings,
    pub events: EventSettings,
    pub simulation: SimulationSettings,
    pub timemachine: TimeMachineSettings,
}

impl EngineSettings {
    /// Load settings (override file if present, else embedded defaults)
    pub fn load() -> Result<Self> {
        load_settings(None)
    }

    /// Load settings from an explicit file
    pub fn from_file(path: &Path) -> Result<Self> {
        load_settings(Some(path))
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: EngineSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The defaults compiled into the binary
    pub fn embedded() -> Self {
        Self::from_toml(DEFAULT_CONFIG).unwrap_or_else(|e| {
            warn!(error = %e, "Embedded settings invalid, using built-in defaults");
            Self::default()
        })
    }

    fn validate(&self) -> Result<()> {
        if self.events.days_ahead == 0 {
            return Err(Error::Config("events.days_ahead must be positive".into()));
        }
        if self.simulation.savings_goal <= 0.0 || self.timemachine.savings_goal <= 0.0 {
            return Err(Error::Config("savings_goal must be positive".into()));
        }
        if self.simulation.history_months == 0 {
            return Err(Error::Config(
                "simulation.history_months must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.timemachine.category_scale_factor) {
            return Err(Error::Config(
                "timemachine.category_scale_factor must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

/// Default settings override path
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("autopilot").join("config").join("autopilot.toml"))
}

fn load_settings(override_path: Option<&Path>) -> Result<EngineSettings> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_settings_path().filter(|p| p.exists()),
    };

    match path {
        Some(path) => {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            debug!(path = %path.display(), "Loaded settings override");
            EngineSettings::from_toml(&content)
        }
        None => EngineSettings::from_toml(DEFAULT_CONFIG),
    }
}
