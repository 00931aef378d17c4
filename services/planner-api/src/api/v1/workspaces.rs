//! Workspace-level endpoints: full view, capacity, reallocation, schedule, stats.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::today_weekday;
use super::views::{ScheduleResponse, WorkspaceResponse};
use crate::api::error::ApiError;
use crate::state::AppState;
use crate::workspace::JobKind;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(show_workspace))
        .route("/capacity", put(set_capacity))
        .route("/reallocate", post(reallocate))
        .route("/schedule", get(show_schedule))
        .route("/stats", get(show_stats))
}

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TodayQuery {
    /// Overrides the server date (`YYYY-MM-DD`).
    pub today: Option<NaiveDate>,
}

/// Either a strict integer or raw form input.
#[derive(Debug, Deserialize)]
pub struct CapacityRequest {
    /// Signed so that zero and negative values reach validation.
    pub daily_capacity: Option<i64>,
    /// Anything other than a positive integer resets capacity to the default.
    pub input: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn show_workspace(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    query: Result<Query<TodayQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let handle = state.workspace(&workspace).await?;
    let today = today_weekday(query.today);
    let name = handle.name().to_string();

    let view = handle
        .run(JobKind::Read, move |planner| {
            WorkspaceResponse::build(name, planner, today)
        })
        .await?;

    Ok(Json(view))
}

async fn set_capacity(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    payload: Result<Json<CapacityRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let handle = state.workspace(&workspace).await?;

    let schedule = match (req.daily_capacity, req.input) {
        (Some(capacity), _) => handle
            .run(JobKind::Reorganize, move |planner| {
                planner
                    .set_capacity(capacity)
                    .map(|_| ScheduleResponse::from(&*planner))
            })
            .await??,
        (None, Some(input)) => {
            handle
                .run(JobKind::Reorganize, move |planner| {
                    planner.set_capacity_lenient(&input);
                    ScheduleResponse::from(&*planner)
                })
                .await?
        }
        (None, None) => {
            return Err(ApiError::bad_request(
                "missing_capacity",
                "Provide daily_capacity or input",
            ))
        }
    };

    Ok(Json(schedule))
}

async fn reallocate(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state.workspace(&workspace).await?;

    let schedule = handle
        .run(JobKind::Reorganize, |planner| {
            planner.reallocate();
            ScheduleResponse::from(&*planner)
        })
        .await?;

    Ok(Json(schedule))
}

async fn show_schedule(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state.workspace(&workspace).await?;
    let schedule = handle
        .run(JobKind::Read, |planner| ScheduleResponse::from(&*planner))
        .await?;
    Ok(Json(schedule))
}

async fn show_stats(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    query: Result<Query<TodayQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let handle = state.workspace(&workspace).await?;
    let today = today_weekday(query.today);
    let stats = handle
        .run(JobKind::Read, move |planner| planner.stats(today))
        .await?;
    Ok(Json(stats))
}
