//! API v1 routes.

mod members;
mod teams;
mod views;
mod workspaces;

use axum::Router;
use chrono::{Datelike, Local, NaiveDate};
use deskplan_id::{MemberId, TeamId};

use crate::api::error::ApiError;
use crate::state::AppState;

/// Create API v1 routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/workspaces/{workspace}", workspaces::routes())
        // Teams are nested under workspaces: /v1/workspaces/{workspace}/teams
        .nest("/workspaces/{workspace}/teams", teams::routes())
        // Members are nested under teams: /v1/workspaces/{workspace}/teams/{team_id}/members
        .nest(
            "/workspaces/{workspace}/teams/{team_id}/members",
            members::routes(),
        )
}

fn parse_team_id(raw: &str) -> Result<TeamId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("invalid_team_id", "Invalid team ID format"))
}

fn parse_member_id(raw: &str) -> Result<MemberId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("invalid_member_id", "Invalid member ID format"))
}

/// Weekday used for "today" statistics; defaults to the server's local date.
fn today_weekday(today: Option<NaiveDate>) -> chrono::Weekday {
    today
        .unwrap_or_else(|| Local::now().date_naive())
        .weekday()
}
