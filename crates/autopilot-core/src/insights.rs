//! Tagged insight values
//!
//! An insight is either a statistical observation about past data or a
//! projection about the future. Consumers match on the variant instead of
//! probing optional fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Category;
use crate::patterns::{PatternType, SpendingPattern};

/// Whether an insight is good news, bad news or neither
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Neutral,
    Negative,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Positive => "positive",
            Tone::Neutral => "neutral",
            Tone::Negative => "negative",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    /// Derived from historical records
    #[serde(rename_all = "camelCase")]
    Statistical {
        metric: String,
        category: Option<Category>,
        observed: f64,
        baseline: Option<f64>,
        tone: Tone,
        message: String,
    },
    /// Derived from a forward projection
    #[serde(rename_all = "camelCase")]
    Projection {
        metric: String,
        horizon_months: u32,
        projected: f64,
        tone: Tone,
        message: String,
    },
}

impl Insight {
    pub fn statistical(metric: &str, observed: f64, tone: Tone, message: impl Into<String>) -> Self {
        Insight::Statistical {
            metric: metric.to_string(),
            category: None,
            observed,
            baseline: None,
            tone,
            message: message.into(),
        }
    }

    pub fn projection(
        metric: &str,
        horizon_months: u32,
        projected: f64,
        tone: Tone,
        message: impl Into<String>,
    ) -> Self {
        Insight::Projection {
            metric: metric.to_string(),
            horizon_months,
            projected,
            tone,
            message: message.into(),
        }
    }

    /// Attach a baseline to a statistical insight; no-op for projections
    pub fn with_baseline(mut self, value: f64) -> Self {
        if let Insight::Statistical { baseline, .. } = &mut self {
            *baseline = Some(value);
        }
        self
    }

    /// Attach a category to a statistical insight; no-op for projections
    pub fn with_category(mut self, value: Category) -> Self {
        if let Insight::Statistical { category, .. } = &mut self {
            *category = Some(value);
        }
        self
    }

    pub fn metric(&self) -> &str {
        match self {
            Insight::Statistical { metric, .. } | Insight::Projection { metric, .. } => metric,
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Insight::Statistical { tone, .. } | Insight::Projection { tone, .. } => *tone,
        }
    }

    /// One line suitable for a list view
    pub fn headline(&self) -> String {
        match self {
            Insight::Statistical {
                category: Some(category),
                message,
                ..
            } => format!("{}: {}", category, message),
            Insight::Statistical { message, .. } => message.clone(),
            Insight::Projection {
                horizon_months,
                message,
                ..
            } => format!("Next {} months: {}", horizon_months, message),
        }
    }
}

impl From<&SpendingPattern> for Insight {
    fn from(pattern: &SpendingPattern) -> Self {
        // Impulse metrics are percentages, the rest are multipliers of 1.0
        let baseline = match pattern.pattern_type {
            PatternType::Impulse => 0.0,
            _ => 1.0,
        };
        Insight::Statistical {
            metric: pattern.pattern_type.as_str().to_string(),
            category: pattern.category.clone(),
            observed: pattern.metric,
            baseline: Some(baseline),
            tone: Tone::Negative,
            message: pattern.insight.clone(),
        }
    }
}
