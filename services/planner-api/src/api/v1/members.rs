//! Roster endpoints. Roster changes never reallocate.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use deskplan_planner::PlannerResult;
use serde::Deserialize;

use super::views::{DeleteResponse, MemberResponse};
use super::{parse_member_id, parse_team_id};
use crate::api::error::ApiError;
use crate::state::AppState;
use crate::workspace::JobKind;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(add_member))
        .route("/{member_id}", patch(rename_member).delete(remove_member))
}

#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub name: String,
}

async fn add_member(
    State(state): State<AppState>,
    Path((workspace, team_id)): Path<(String, String)>,
    payload: Result<Json<MemberRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let team_id = parse_team_id(&team_id)?;
    let handle = state.workspace(&workspace).await?;

    let member = handle
        .run(JobKind::Roster, move |planner| -> PlannerResult<MemberResponse> {
            let member_id = planner.add_member(team_id, &req.name)?;
            planner.member(team_id, member_id).map(MemberResponse::from)
        })
        .await??;

    Ok((StatusCode::CREATED, Json(member)))
}

async fn rename_member(
    State(state): State<AppState>,
    Path((workspace, team_id, member_id)): Path<(String, String, String)>,
    payload: Result<Json<MemberRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let team_id = parse_team_id(&team_id)?;
    let member_id = parse_member_id(&member_id)?;
    let handle = state.workspace(&workspace).await?;

    let member = handle
        .run(JobKind::Roster, move |planner| -> PlannerResult<MemberResponse> {
            planner.rename_member(team_id, member_id, &req.name)?;
            planner.member(team_id, member_id).map(MemberResponse::from)
        })
        .await??;

    Ok(Json(member))
}

async fn remove_member(
    State(state): State<AppState>,
    Path((workspace, team_id, member_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let team_id = parse_team_id(&team_id)?;
    let member_id = parse_member_id(&member_id)?;
    let handle = state.workspace(&workspace).await?;

    handle
        .run(JobKind::Roster, move |planner| {
            planner.remove_member(team_id, member_id).map(|_| ())
        })
        .await??;

    Ok(Json(DeleteResponse { ok: true }))
}
