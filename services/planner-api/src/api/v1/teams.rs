//! Team endpoints.
//!
//! Create and replace accept the full team record, including the roster by
//! member name. Every change here reallocates the workspace before replying.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use deskplan_planner::{NewTeam, PlannerResult, TeamPatch};

use super::parse_team_id;
use super::views::{DeleteResponse, ListTeamsResponse, TeamResponse};
use crate::api::error::ApiError;
use crate::state::AppState;
use crate::workspace::JobKind;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route(
            "/{team_id}",
            get(get_team)
                .put(replace_team)
                .patch(update_team)
                .delete(delete_team),
        )
}

async fn list_teams(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state.workspace(&workspace).await?;
    let teams = handle
        .run(JobKind::Read, |planner| ListTeamsResponse::from(&*planner))
        .await?;
    Ok(Json(teams))
}

async fn create_team(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    payload: Result<Json<NewTeam>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let handle = state.workspace(&workspace).await?;

    let team = handle
        .run(JobKind::Reorganize, move |planner| -> PlannerResult<TeamResponse> {
            let id = planner.add_team(req)?;
            planner.team(id).map(TeamResponse::from)
        })
        .await??;

    Ok((StatusCode::CREATED, Json(team)))
}

async fn get_team(
    State(state): State<AppState>,
    Path((workspace, team_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let team_id = parse_team_id(&team_id)?;
    let handle = state.workspace(&workspace).await?;

    let team = handle
        .run(JobKind::Read, move |planner| {
            planner.team(team_id).map(TeamResponse::from)
        })
        .await??;

    Ok(Json(team))
}

async fn replace_team(
    State(state): State<AppState>,
    Path((workspace, team_id)): Path<(String, String)>,
    payload: Result<Json<NewTeam>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let team_id = parse_team_id(&team_id)?;
    let handle = state.workspace(&workspace).await?;

    let team = handle
        .run(JobKind::Reorganize, move |planner| -> PlannerResult<TeamResponse> {
            planner.replace_team(team_id, req)?;
            planner.team(team_id).map(TeamResponse::from)
        })
        .await??;

    Ok(Json(team))
}

async fn update_team(
    State(state): State<AppState>,
    Path((workspace, team_id)): Path<(String, String)>,
    payload: Result<Json<TeamPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patch) = payload?;
    let team_id = parse_team_id(&team_id)?;
    if patch.is_empty() {
        return Err(ApiError::bad_request(
            "empty_patch",
            "Provide at least one of name, size, days_per_week",
        ));
    }
    let handle = state.workspace(&workspace).await?;

    let team = handle
        .run(JobKind::Reorganize, move |planner| -> PlannerResult<TeamResponse> {
            planner.edit_team(team_id, patch)?;
            planner.team(team_id).map(TeamResponse::from)
        })
        .await??;

    Ok(Json(team))
}

async fn delete_team(
    State(state): State<AppState>,
    Path((workspace, team_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let team_id = parse_team_id(&team_id)?;
    let handle = state.workspace(&workspace).await?;

    handle
        .run(JobKind::Reorganize, move |planner| {
            planner.remove_team(team_id).map(|_| ())
        })
        .await??;

    Ok(Json(DeleteResponse { ok: true }))
}
