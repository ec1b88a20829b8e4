//! HTTP API
//!
//! Exposes the cached daily puzzle and a page-inspection endpoint used to
//! diagnose upstream layout changes. Browser access is limited to an origin
//! allow-list.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::error;

use crate::puzzle::GamePayload;
use crate::service::{DebugReport, PuzzleService, RefreshError, SharedRefreshError};

/// Shared state for request handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<PuzzleService>,
}

/// Body returned when a request fails
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
}

/// Errors surfaced to API clients
#[derive(Debug)]
pub enum ApiError {
    /// The puzzle could not be refreshed
    Puzzle(SharedRefreshError),
    /// The debug fetch failed
    Debug(RefreshError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::Puzzle(e) => ErrorBody {
                error: "Failed to fetch NYT data",
                details: e.to_string(),
                timestamp: Some(Utc::now()),
            },
            ApiError::Debug(e) => ErrorBody {
                error: "Debug error",
                details: e.to_string(),
                timestamp: None,
            },
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Builds the router with CORS restricted to `allowed_origins`
pub fn router(service: Arc<PuzzleService>, allowed_origins: Vec<HeaderValue>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET]);

    Router::new()
        .route("/api/nyt", get(get_puzzle))
        .route("/api/debug-content", get(get_debug_content))
        .layer(cors)
        .with_state(AppState { service })
}

/// GET /api/nyt - Today's puzzle payload.
async fn get_puzzle(State(state): State<AppState>) -> Result<Json<GamePayload>, ApiError> {
    match state.service.today(Utc::now()).await {
        Ok(payload) => Ok(Json(payload)),
        Err(e) => {
            error!(error = %e, "Puzzle request failed");
            Err(ApiError::Puzzle(e))
        }
    }
}

/// GET /api/debug-content - Where the data marker sits in the live page.
async fn get_debug_content(State(state): State<AppState>) -> Result<Json<DebugReport>, ApiError> {
    state
        .service
        .debug_content(Utc::now())
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Debug request failed");
            ApiError::Debug(e)
        })
}
