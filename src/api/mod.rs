//! HTTP API: Axum JSON server for the calculators and parlay validation.
//!
//! CORS enabled for browser front ends.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::types::PricingError;
use routes::AppState;

/// Serve the API until Ctrl+C.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API address {addr}"))?;
    info!(addr, "API server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/calculators/devig", post(routes::devig))
        .route("/api/calculators/parlay-odds", post(routes::parlay_odds))
        .route("/api/calculators/parlay-types", get(routes::parlay_types))
        .route("/api/parlay/validate", post(routes::validate_parlay))
        .route("/api/parlay/ev-lines", post(routes::ev_lines))
        .route("/api/discrepancies", post(routes::discrepancies))
        .route("/api/compare", post(routes::compare))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Pricing failure rendered as JSON. Bad input maps to 400, a computation
/// that could not converge to 422.
#[derive(Debug)]
pub struct ApiError(PricingError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_types: Option<Vec<String>>,
}

impl From<PricingError> for ApiError {
    fn from(e: PricingError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_input_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        let valid_types = match &self.0 {
            PricingError::UnknownParlayType { valid, .. } => Some(valid.clone()),
            _ => None,
        };

        warn!(status = status.as_u16(), error = %self.0, "Request rejected");

        let body = ErrorBody {
            error: self.0.to_string(),
            valid_types,
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
