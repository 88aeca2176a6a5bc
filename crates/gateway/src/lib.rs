//! HTTP API gateway for SalesPulse.
//!
//! Exposes the three read-only analytics endpoints plus a health check:
//!
//! - `GET /rep_performance/{employee_id}`
//! - `GET /team_performance`
//! - `GET /performance_trends/{time_period}` (`monthly` or `quaterly`)
//! - `GET /health`
//!
//! Narratives are returned as JSON strings. Query failures keep their
//! human-readable text as the body and carry a matching status code.

use axum::{
    Router,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use salespulse_analytics::{AnalyticsService, QueryError};
use salespulse_core::Error;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

type SharedState = Arc<AnalyticsService>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/rep_performance/{employee_id}", get(rep_performance_handler))
        .route("/team_performance", get(team_performance_handler))
        .route(
            "/performance_trends/{time_period}",
            get(performance_trends_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// The dataset is loaded and the provider built once, then shared by every
/// request.
pub async fn start(config: salespulse_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if !config.has_api_key() {
        warn!("No API key configured; LLM calls will fail until one is set");
    }

    let service = AnalyticsService::from_config(&config)?;
    let app = build_router(Arc::new(service));

    info!(addr = %addr, dataset = %config.dataset.path.display(), "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Errors ---

/// A [`QueryError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub QueryError);

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self(err)
    }
}

/// 404 for unknown employees, 400 for bad periods, 502 when the LLM backend
/// fails and 500 for everything else.
pub fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::NotFound(_) => StatusCode::NOT_FOUND,
        QueryError::InvalidTimePeriod(_) => StatusCode::BAD_REQUEST,
        QueryError::Pipeline(Error::Provider(_)) => StatusCode::BAD_GATEWAY,
        QueryError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Query failed");
        }
        (status, Json(self.0.to_string())).into_response()
    }
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    records: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        records: state.dataset().len(),
    })
}

async fn rep_performance_handler(
    State(state): State<SharedState>,
    Path(employee_id): Path<i64>,
) -> Result<Json<String>, ApiError> {
    Ok(Json(state.rep_performance(employee_id).await?))
}

async fn team_performance_handler(
    State(state): State<SharedState>,
) -> Result<Json<String>, ApiError> {
    Ok(Json(state.team_performance().await?))
}

async fn performance_trends_handler(
    State(state): State<SharedState>,
    Path(time_period): Path<String>,
) -> Result<Json<String>, ApiError> {
    Ok(Json(state.performance_trends(&time_period).await?))
}
