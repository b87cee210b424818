//! HTTP route handlers for the planner API.

use std::path::Path;

use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info};

use planner::core::types::PlannedTask;
use planner::history::{GoalSummary, list_goals, save_plan};
use planner::plan::generate_plan;

use crate::state::AppState;

/// Build the full application router: API routes plus the static front end.
pub fn app_router(static_dir: &Path) -> Router<AppState> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/generate-plan", post(generate_plan_handler))
        .route("/api/get-all-goals", get(get_all_goals))
        .route_service("/", ServeFile::new(static_dir.join("index.html")));

    if static_dir.exists() {
        router.fallback_service(ServeDir::new(static_dir))
    } else {
        router
    }
}

/// JSON error body (`{"error": "..."}`) with a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct GeneratePlanRequest {
    pub goal: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePlanResponse {
    pub goal_id: String,
    pub goal_text: String,
    pub tasks: Vec<PlannedTask>,
    pub used_fallback: bool,
}

/// POST /api/generate-plan - plan a goal and store it.
async fn generate_plan_handler(
    State(state): State<AppState>,
    payload: Result<Json<GeneratePlanRequest>, JsonRejection>,
) -> Result<Json<GeneratePlanResponse>, ApiError> {
    let goal = payload
        .ok()
        .and_then(|Json(body)| body.goal)
        .ok_or_else(|| ApiError::bad_request("JSON must contain 'goal'"))?;
    let goal_text = goal.trim();
    if goal_text.is_empty() {
        return Err(ApiError::bad_request("Goal cannot be empty"));
    }
    info!(goal = %goal_text, "received goal");

    let outcome = generate_plan(&state.planner, goal_text).await;
    let saved = save_plan(state.store.as_ref(), goal_text, &outcome.tasks).map_err(|err| {
        error!(error = %format!("{err:#}"), "failed to save plan");
        ApiError::internal("Failed to save plan")
    })?;

    Ok(Json(GeneratePlanResponse {
        goal_id: saved.id,
        goal_text: saved.goal_text,
        tasks: outcome.tasks,
        used_fallback: outcome.used_fallback,
    }))
}

/// GET /api/get-all-goals - goal history, newest first.
async fn get_all_goals(State(state): State<AppState>) -> Result<Json<Vec<GoalSummary>>, ApiError> {
    list_goals(state.store.as_ref()).map(Json).map_err(|err| {
        error!(error = %format!("{err:#}"), "failed to fetch goals");
        ApiError::internal("Failed to fetch goals")
    })
}
