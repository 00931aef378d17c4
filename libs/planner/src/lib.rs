//! # deskplan-planner
//!
//! Assigns teams to weekdays under a shared daily headcount limit.
//!
//! ## Model
//!
//! - A [`Team`] declares a `size` and how many days a week it wants on site.
//! - The [`DailyCapacity`] caps the summed size of teams present on any day.
//! - The [`WeekSchedule`] maps Monday to Friday onto the teams present.
//!
//! The [`Planner`] owns all three and rebuilds the schedule after every team
//! or capacity change. Rosters ([`Member`]) hang off teams but never feed the
//! allocator: scheduling uses the declared size only.
//!
//! ## Example
//!
//! ```
//! use deskplan_planner::{DailyCapacity, NewTeam, Planner};
//!
//! let mut planner = Planner::seeded(DailyCapacity::new(20).unwrap(), 7);
//! let team = planner.add_team(NewTeam::new("Payments", 12).days_per_week(3)).unwrap();
//! planner.add_team(NewTeam::new("Search", 10).days_per_week(3)).unwrap();
//!
//! for (_, slot) in planner.schedule().iter() {
//!     assert!(slot.headcount <= 20);
//! }
//! assert!(planner.team(team).unwrap().assigned_days().len() <= 3);
//! ```

mod allocator;
mod capacity;
mod error;
mod planner;
mod snapshot;
mod stats;
mod team;
mod weekday;

pub use allocator::{
    allocate, Allocation, AllocationReport, CalendarOrder, DayShuffler, DaySlot, RandomShuffler,
    Shortfall, WeekSchedule,
};
pub use capacity::DailyCapacity;
pub use error::{PlannerError, PlannerResult};
pub use planner::Planner;
pub use snapshot::{Snapshot, SnapshotError, DEFAULT_NAMESPACE, SNAPSHOT_VERSION};
pub use stats::{
    compute_stats, day_occupancy, occupancy_percent, week_occupancy, DayOccupancy, OccupancyLevel,
    PlannerStats,
};
pub use team::{
    random_days_per_week, Member, NewTeam, Team, TeamPatch, MAX_DAYS_PER_WEEK, MIN_DAYS_PER_WEEK,
};
pub use weekday::Weekday;

pub use deskplan_id::{MemberId, TeamId};
