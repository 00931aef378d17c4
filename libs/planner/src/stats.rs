//! Derived views over planner state. Nothing here is stored.

use deskplan_id::TeamId;
use serde::{Deserialize, Serialize};

use crate::allocator::WeekSchedule;
use crate::capacity::DailyCapacity;
use crate::team::Team;
use crate::weekday::Weekday;

/// Load band for a day's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyLevel {
    Ok,
    Warning,
    Danger,
}

impl OccupancyLevel {
    /// Above 90% is danger, above 70% is warning.
    pub fn from_percent(percent: u32) -> Self {
        if percent > 90 {
            OccupancyLevel::Danger
        } else if percent > 70 {
            OccupancyLevel::Warning
        } else {
            OccupancyLevel::Ok
        }
    }
}

/// Occupancy of a single weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOccupancy {
    pub day: Weekday,
    pub teams: Vec<TeamId>,
    pub headcount: u32,
    pub capacity: u32,
    pub percent: u32,
    pub level: OccupancyLevel,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerStats {
    pub team_count: usize,
    /// Sum of declared team sizes.
    pub declared_headcount: u64,
    /// Sum of roster lengths; may trail `declared_headcount`.
    pub rostered_headcount: u64,
    /// `None` on weekends.
    pub today: Option<Weekday>,
    pub today_occupancy: u32,
    pub daily_capacity: u32,
}

/// `round(100 * headcount / capacity)`.
pub fn occupancy_percent(headcount: u32, capacity: DailyCapacity) -> u32 {
    (100.0 * f64::from(headcount) / f64::from(capacity.get())).round() as u32
}

pub fn day_occupancy(
    schedule: &WeekSchedule,
    capacity: DailyCapacity,
    day: Weekday,
) -> DayOccupancy {
    let slot = schedule.slot(day);
    let percent = occupancy_percent(slot.headcount, capacity);
    DayOccupancy {
        day,
        teams: slot.teams.clone(),
        headcount: slot.headcount,
        capacity: capacity.get(),
        percent,
        level: OccupancyLevel::from_percent(percent),
    }
}

pub fn week_occupancy(schedule: &WeekSchedule, capacity: DailyCapacity) -> Vec<DayOccupancy> {
    Weekday::ALL
        .into_iter()
        .map(|day| day_occupancy(schedule, capacity, day))
        .collect()
}

pub fn compute_stats(
    teams: &[Team],
    schedule: &WeekSchedule,
    capacity: DailyCapacity,
    today: chrono::Weekday,
) -> PlannerStats {
    let today = Weekday::from_chrono(today);
    let today_occupancy = today.map_or(0, |day| {
        schedule
            .slot(day)
            .teams
            .iter()
            .filter_map(|id| teams.iter().find(|t| t.id() == *id))
            .map(Team::size)
            .sum()
    });

    PlannerStats {
        team_count: teams.len(),
        declared_headcount: teams.iter().map(|t| u64::from(t.size())).sum(),
        rostered_headcount: teams.iter().map(|t| t.members().len() as u64).sum(),
        today,
        today_occupancy,
        daily_capacity: capacity.get(),
    }
}
