//! Response bodies shared by the v1 handlers.
//!
//! Views are built inside the workspace actor from a borrowed planner, so a
//! response always reflects one consistent state.

use chrono::NaiveDate;
use deskplan_planner::{
    Member, MemberId, OccupancyLevel, Planner, PlannerStats, Shortfall, Team, TeamId, Weekday,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: MemberId,
    pub name: String,
}

impl From<&Member> for MemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            name: member.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: TeamId,
    pub name: String,
    pub size: u32,
    pub days_per_week: u8,
    pub assigned_days: Vec<Weekday>,
    /// Fewer days granted than requested.
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub members: Vec<MemberResponse>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().to_string(),
            size: team.size(),
            days_per_week: team.days_per_week(),
            assigned_days: team.assigned_days().to_vec(),
            degraded: team.is_degraded(),
            office: team.office().map(str::to_string),
            date: team.date(),
            members: team.members().iter().map(MemberResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListTeamsResponse {
    pub items: Vec<TeamResponse>,
}

impl From<&Planner> for ListTeamsResponse {
    fn from(planner: &Planner) -> Self {
        Self {
            items: planner.teams().iter().map(TeamResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DayTeam {
    pub id: TeamId,
    pub name: String,
    pub size: u32,
}

#[derive(Debug, Serialize)]
pub struct DayResponse {
    pub day: Weekday,
    pub teams: Vec<DayTeam>,
    pub headcount: u32,
    pub capacity: u32,
    pub percent: u32,
    pub level: OccupancyLevel,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub daily_capacity: u32,
    pub days: Vec<DayResponse>,
    pub degraded: Vec<Shortfall>,
}

impl From<&Planner> for ScheduleResponse {
    fn from(planner: &Planner) -> Self {
        let days = planner
            .occupancy()
            .into_iter()
            .map(|day| DayResponse {
                day: day.day,
                teams: day
                    .teams
                    .iter()
                    .filter_map(|id| planner.team(*id).ok())
                    .map(|team| DayTeam {
                        id: team.id(),
                        name: team.name().to_string(),
                        size: team.size(),
                    })
                    .collect(),
                headcount: day.headcount,
                capacity: day.capacity,
                percent: day.percent,
                level: day.level,
            })
            .collect();

        Self {
            daily_capacity: planner.capacity().get(),
            days,
            degraded: planner.last_report().degraded.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkspaceResponse {
    pub workspace: String,
    pub daily_capacity: u32,
    pub teams: Vec<TeamResponse>,
    pub schedule: ScheduleResponse,
    pub stats: PlannerStats,
}

impl WorkspaceResponse {
    pub fn build(workspace: String, planner: &Planner, today: chrono::Weekday) -> Self {
        Self {
            workspace,
            daily_capacity: planner.capacity().get(),
            teams: ListTeamsResponse::from(planner).items,
            schedule: ScheduleResponse::from(planner),
            stats: planner.stats(today),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}
