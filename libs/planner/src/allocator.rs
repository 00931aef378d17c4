//! Weekly allocator: shuffle-then-greedy-pack of teams onto weekdays.
//!
//! Each run walks the teams in registry order. For every team the five
//! weekdays are permuted by a [`DayShuffler`], then walked in that order; the
//! team is committed to a day whenever the day's running headcount plus the
//! team's size stays within the daily capacity. The walk stops once the team
//! has its requested number of days or all five days were tried.
//!
//! # Invariants
//!
//! - No day's headcount exceeds the capacity
//! - A team appears at most once per day
//! - A team never receives more days than it asked for
//!
//! Teams that cannot be fully served are left with fewer days (possibly none)
//! and are listed in the [`AllocationReport`]; allocation itself never fails.

use std::collections::HashSet;

use deskplan_id::TeamId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capacity::DailyCapacity;
use crate::team::Team;
use crate::weekday::Weekday;

/// Orders the weekdays a team will be offered during an allocation run.
pub trait DayShuffler {
    /// Reorders `days` in place for `team`.
    fn shuffle_days(&mut self, team: &Team, days: &mut [Weekday]);
}

impl<F> DayShuffler for F
where
    F: FnMut(&Team, &mut [Weekday]),
{
    fn shuffle_days(&mut self, team: &Team, days: &mut [Weekday]) {
        self(team, days)
    }
}

/// Uniform random permutation per team.
#[derive(Debug, Clone)]
pub struct RandomShuffler<R = StdRng> {
    rng: R,
}

impl RandomShuffler<StdRng> {
    /// Seeds from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible shuffles for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomShuffler<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomShuffler<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> DayShuffler for RandomShuffler<R> {
    fn shuffle_days(&mut self, _team: &Team, days: &mut [Weekday]) {
        days.shuffle(&mut self.rng);
    }
}

/// Leaves the days in calendar order, so Monday is always tried first.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarOrder;

impl DayShuffler for CalendarOrder {
    fn shuffle_days(&mut self, _team: &Team, _days: &mut [Weekday]) {}
}

/// Teams present on one weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlot {
    /// Teams in the order they were committed.
    pub teams: Vec<TeamId>,
    /// Sum of the declared sizes of `teams`.
    pub headcount: u32,
}

/// Monday-to-Friday assignment produced by an allocation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSchedule {
    #[serde(default)]
    monday: DaySlot,
    #[serde(default)]
    tuesday: DaySlot,
    #[serde(default)]
    wednesday: DaySlot,
    #[serde(default)]
    thursday: DaySlot,
    #[serde(default)]
    friday: DaySlot,
}

impl WeekSchedule {
    pub fn slot(&self, day: Weekday) -> &DaySlot {
        match day {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
        }
    }

    fn slot_mut(&mut self, day: Weekday) -> &mut DaySlot {
        match day {
            Weekday::Monday => &mut self.monday,
            Weekday::Tuesday => &mut self.tuesday,
            Weekday::Wednesday => &mut self.wednesday,
            Weekday::Thursday => &mut self.thursday,
            Weekday::Friday => &mut self.friday,
        }
    }

    /// Iterates days in calendar order.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &DaySlot)> {
        Weekday::ALL.into_iter().map(move |day| (day, self.slot(day)))
    }

    /// Checks that this schedule satisfies every allocation invariant for
    /// `teams` at `capacity`, and agrees with each team's `assigned_days`.
    pub fn is_consistent_with(&self, teams: &[Team], capacity: DailyCapacity) -> bool {
        for (day, slot) in self.iter() {
            let mut seen = HashSet::new();
            let mut total: u64 = 0;
            for id in &slot.teams {
                if !seen.insert(*id) {
                    return false;
                }
                let Some(team) = teams.iter().find(|t| t.id() == *id) else {
                    return false;
                };
                if !team.assigned_days().contains(&day) {
                    return false;
                }
                total += u64::from(team.size());
            }
            if total != u64::from(slot.headcount) || total > u64::from(capacity.get()) {
                return false;
            }
        }

        teams.iter().all(|team| {
            let days: HashSet<_> = team.assigned_days().iter().collect();
            days.len() == team.assigned_days().len()
                && days.len() <= usize::from(team.days_per_week())
                && days
                    .iter()
                    .all(|day| self.slot(**day).teams.contains(&team.id()))
        })
    }
}

/// A team that received fewer days than requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub team_id: TeamId,
    pub desired: u8,
    pub assigned: u8,
}

/// Summary of an allocation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub teams: usize,
    pub degraded: Vec<Shortfall>,
}

impl AllocationReport {
    pub fn is_fully_served(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Output of [`allocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub schedule: WeekSchedule,
    pub report: AllocationReport,
}

/// Assigns every team to weekdays under `capacity`.
///
/// Resets and refills each team's `assigned_days`, and returns a freshly
/// built schedule.
pub fn allocate<S>(teams: &mut [Team], capacity: DailyCapacity, shuffler: &mut S) -> Allocation
where
    S: DayShuffler + ?Sized,
{
    let mut schedule = WeekSchedule::default();
    let mut report = AllocationReport {
        teams: teams.len(),
        degraded: Vec::new(),
    };

    for team in teams.iter_mut() {
        team.assigned_days.clear();

        let mut days = Weekday::ALL;
        shuffler.shuffle_days(team, &mut days);

        let wanted = usize::from(team.days_per_week());
        for day in days {
            if team.assigned_days.len() >= wanted {
                break;
            }

            let slot = schedule.slot_mut(day);
            if slot.teams.contains(&team.id()) {
                continue;
            }
            if slot.headcount.saturating_add(team.size()) <= capacity.get() {
                slot.teams.push(team.id());
                slot.headcount += team.size();
                team.assigned_days.push(day);
            }
        }

        if team.is_degraded() {
            debug!(
                team_id = %team.id(),
                size = team.size(),
                desired = team.days_per_week(),
                assigned = team.assigned_days.len(),
                "Team could not be fully scheduled"
            );
            report.degraded.push(Shortfall {
                team_id: team.id(),
                desired: team.days_per_week(),
                assigned: team.assigned_days.len() as u8,
            });
        }
    }

    Allocation { schedule, report }
}
