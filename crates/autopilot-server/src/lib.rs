//! Autopilot Web Server
//!
//! Axum-based JSON API over the budget autopilot engine. Every endpoint is
//! stateless: callers post their records and get derived values back.
//!
//! - Restrictive CORS policy
//! - Record validation before any engine call
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info};

use autopilot_core::EngineSettings;

mod handlers;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub settings: EngineSettings,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(settings: EngineSettings, config: ServerConfig) -> Router {
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    let state = Arc::new(AppState { settings, config });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Budget
        .route("/budget/initialize", post(handlers::initialize))
        .route("/budget/summary", post(handlers::summary))
        .route("/budget/safe-to-spend", post(handlers::safe_to_spend))
        // Insights and events
        .route("/insights/patterns", post(handlers::patterns))
        .route("/events", post(handlers::upcoming_events))
        // Simulation
        .route("/simulate", post(handlers::simulate))
        // Time machine
        .route("/timemachine/branch", post(handlers::branch))
        .route("/timemachine/regrets", post(handlers::regrets))
        // Goals
        .route("/goals/evaluate", post(handlers::evaluate_goals));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(settings: EngineSettings, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(settings, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    settings: EngineSettings,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let app = create_router(settings, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Engine errors caused by the caller's input are 400s; the rest are sanitized 500s
    pub fn engine(err: autopilot_core::Error) -> Self {
        use autopilot_core::Error;
        match err {
            Error::InvalidData(_) | Error::InvalidDate(_) | Error::Import(_) => {
                Self::bad_request(&err.to_string())
            }
            other => Self::from(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
