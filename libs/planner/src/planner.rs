//! The planner aggregate: teams, capacity, and the schedule derived from them.
//!
//! Every team mutation goes through [`Planner::mutate`], which applies the
//! change and then runs the allocator before returning; capacity changes
//! reallocate directly. The schedule can never be observed out of date.
//! Roster changes do not affect scheduling and skip the allocator.

use deskplan_id::{MemberId, TeamId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument, warn};

use crate::allocator::{allocate, AllocationReport, DayShuffler, RandomShuffler, WeekSchedule};
use crate::capacity::DailyCapacity;
use crate::error::{PlannerError, PlannerResult};
use crate::snapshot::{Snapshot, SNAPSHOT_VERSION};
use crate::stats::{compute_stats, week_occupancy, DayOccupancy, PlannerStats};
use crate::team::{random_days_per_week, Member, NewTeam, Team, TeamPatch};

/// Owns one workspace's state.
#[derive(Debug)]
pub struct Planner<S = RandomShuffler> {
    capacity: DailyCapacity,
    teams: Vec<Team>,
    schedule: WeekSchedule,
    report: AllocationReport,
    shuffler: S,
    rng: StdRng,
}

impl Planner<RandomShuffler> {
    /// Empty planner with random day ordering.
    pub fn new(capacity: DailyCapacity) -> Self {
        Self::with_shuffler(capacity, RandomShuffler::new())
    }

    /// Empty planner whose shuffles and default `days_per_week` draws are
    /// reproducible for `seed`.
    pub fn seeded(capacity: DailyCapacity, seed: u64) -> Self {
        let mut planner = Self::with_shuffler(capacity, RandomShuffler::seeded(seed));
        planner.rng = StdRng::seed_from_u64(seed);
        planner
    }
}

impl Default for Planner<RandomShuffler> {
    fn default() -> Self {
        Self::new(DailyCapacity::DEFAULT)
    }
}

impl<S: DayShuffler> Planner<S> {
    pub fn with_shuffler(capacity: DailyCapacity, shuffler: S) -> Self {
        Self {
            capacity,
            teams: Vec::new(),
            schedule: WeekSchedule::default(),
            report: AllocationReport::default(),
            shuffler,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Rebuilds a planner from persisted state.
    ///
    /// Team records that fail validation are dropped, as are repeated member
    /// IDs within a roster (the first occurrence wins). The stored schedule is
    /// kept only if it is consistent with the surviving teams and capacity;
    /// otherwise a fresh allocation is run.
    pub fn restore(snapshot: Snapshot, shuffler: S) -> Self {
        let mut planner = Self::with_shuffler(snapshot.daily_capacity, shuffler);

        for mut team in snapshot.teams {
            if let Err(e) = team.check_stored() {
                warn!(team_id = %team.id(), error = %e, "Dropping invalid stored team");
                continue;
            }
            if planner.teams.iter().any(|t| t.id() == team.id()) {
                warn!(team_id = %team.id(), "Dropping duplicate stored team");
                continue;
            }
            let repeated = team.dedup_members();
            if repeated > 0 {
                warn!(team_id = %team.id(), repeated, "Dropping repeated stored members");
            }
            planner.teams.push(team);
        }

        match snapshot.week_schedule {
            Some(schedule) if schedule.is_consistent_with(&planner.teams, planner.capacity) => {
                planner.schedule = schedule;
                planner.report = planner.current_report();
            }
            _ => {
                info!(
                    team_count = planner.teams.len(),
                    "Stored schedule missing or inconsistent, reallocating"
                );
                planner.reallocate();
            }
        }

        planner
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            daily_capacity: self.capacity,
            teams: self.teams.clone(),
            week_schedule: Some(self.schedule.clone()),
        }
    }

    pub fn capacity(&self) -> DailyCapacity {
        self.capacity
    }

    /// Teams in insertion order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, id: TeamId) -> PlannerResult<&Team> {
        self.teams
            .iter()
            .find(|t| t.id() == id)
            .ok_or(PlannerError::TeamNotFound(id))
    }

    pub fn member(&self, team_id: TeamId, member_id: MemberId) -> PlannerResult<&Member> {
        self.team(team_id)?
            .members()
            .iter()
            .find(|m| m.id == member_id)
            .ok_or(PlannerError::MemberNotFound { team_id, member_id })
    }

    pub fn schedule(&self) -> &WeekSchedule {
        &self.schedule
    }

    /// Report of the most recent allocation run.
    pub fn last_report(&self) -> &AllocationReport {
        &self.report
    }

    pub fn occupancy(&self) -> Vec<DayOccupancy> {
        week_occupancy(&self.schedule, self.capacity)
    }

    pub fn stats(&self, today: chrono::Weekday) -> PlannerStats {
        compute_stats(&self.teams, &self.schedule, self.capacity, today)
    }

    /// Runs the allocator over the current teams.
    #[instrument(skip_all, fields(teams = self.teams.len(), capacity = self.capacity.get()))]
    pub fn reallocate(&mut self) -> &AllocationReport {
        let allocation = allocate(&mut self.teams, self.capacity, &mut self.shuffler);
        self.schedule = allocation.schedule;
        self.report = allocation.report;
        debug!(degraded = self.report.degraded.len(), "Schedule rebuilt");
        &self.report
    }

    /// Applies a team or capacity mutation, then reallocates. `f` must leave
    /// state untouched when it fails.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut Self) -> PlannerResult<T>) -> PlannerResult<T> {
        let out = f(self)?;
        self.reallocate();
        Ok(out)
    }

    pub fn add_team(&mut self, request: NewTeam) -> PlannerResult<TeamId> {
        self.mutate(|p| {
            let fallback = random_days_per_week(&mut p.rng);
            let team = Team::build(TeamId::new(), request, p.capacity, fallback)?;
            let id = team.id();
            info!(
                team_id = %id,
                size = team.size(),
                days_per_week = team.days_per_week(),
                "Team added"
            );
            p.teams.push(team);
            Ok(id)
        })
    }

    /// Applies a partial edit. A patch that sets no field is rejected.
    pub fn edit_team(&mut self, id: TeamId, patch: TeamPatch) -> PlannerResult<()> {
        if patch.is_empty() {
            return Err(PlannerError::validation("patch", "no fields to change"));
        }
        self.mutate(|p| {
            let capacity = p.capacity;
            p.team_mut(id)?.apply(patch, capacity)?;
            info!(team_id = %id, "Team updated");
            Ok(())
        })
    }

    /// Replaces a team record wholesale, keeping its ID and position. The
    /// roster is rebuilt from `record.members` with fresh member IDs.
    pub fn replace_team(&mut self, id: TeamId, record: NewTeam) -> PlannerResult<()> {
        self.mutate(|p| {
            let capacity = p.capacity;
            let slot = p.team_mut(id)?;
            let replacement = Team::build(id, record, capacity, slot.days_per_week())?;
            *slot = replacement;
            info!(team_id = %id, "Team replaced");
            Ok(())
        })
    }

    /// Deletes a team and its roster.
    pub fn remove_team(&mut self, id: TeamId) -> PlannerResult<Team> {
        self.mutate(|p| {
            let index = p
                .teams
                .iter()
                .position(|t| t.id() == id)
                .ok_or(PlannerError::TeamNotFound(id))?;
            let team = p.teams.remove(index);
            info!(team_id = %id, members = team.members().len(), "Team removed");
            Ok(team)
        })
    }

    /// Sets the daily capacity; zero or negative is a validation error.
    /// Teams larger than the new value are kept and simply receive no days.
    pub fn set_capacity(&mut self, capacity: i64) -> PlannerResult<DailyCapacity> {
        let capacity = DailyCapacity::try_from(capacity)?;
        self.apply_capacity(capacity);
        Ok(capacity)
    }

    /// Sets the capacity from raw user input; anything that is not a positive
    /// integer resets it to [`DailyCapacity::DEFAULT`].
    pub fn set_capacity_lenient(&mut self, input: &str) -> DailyCapacity {
        let capacity = DailyCapacity::parse_lenient(input);
        self.apply_capacity(capacity);
        capacity
    }

    fn apply_capacity(&mut self, capacity: DailyCapacity) {
        let previous = self.capacity;
        self.capacity = capacity;
        self.reallocate();
        let oversized = self.teams.iter().filter(|t| t.size() > capacity.get()).count();
        info!(
            previous = previous.get(),
            capacity = capacity.get(),
            oversized_teams = oversized,
            "Daily capacity changed"
        );
    }

    pub fn add_member(&mut self, team_id: TeamId, name: &str) -> PlannerResult<MemberId> {
        self.team_mut(team_id)?.add_member(name)
    }

    pub fn rename_member(
        &mut self,
        team_id: TeamId,
        member_id: MemberId,
        name: &str,
    ) -> PlannerResult<()> {
        self.team_mut(team_id)?.rename_member(member_id, name)
    }

    pub fn remove_member(&mut self, team_id: TeamId, member_id: MemberId) -> PlannerResult<Member> {
        self.team_mut(team_id)?.remove_member(member_id)
    }

    fn team_mut(&mut self, id: TeamId) -> PlannerResult<&mut Team> {
        self.teams
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or(PlannerError::TeamNotFound(id))
    }

    fn current_report(&self) -> AllocationReport {
        AllocationReport {
            teams: self.teams.len(),
            degraded: self
                .teams
                .iter()
                .filter(|t| t.is_degraded())
                .map(|t| crate::allocator::Shortfall {
                    team_id: t.id(),
                    desired: t.days_per_week(),
                    assigned: t.assigned_days().len() as u8,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::CalendarOrder;
    use crate::weekday::Weekday;

    fn cap(v: u32) -> DailyCapacity {
        DailyCapacity::new(v).unwrap()
    }

    fn planner(capacity: u32) -> Planner<CalendarOrder> {
        Planner::with_shuffler(cap(capacity), CalendarOrder)
    }

    fn assert_capacity_respected<S: DayShuffler>(p: &Planner<S>) {
        assert!(p.schedule().is_consistent_with(p.teams(), p.capacity()));
        for (_, slot) in p.schedule().iter() {
            assert!(slot.headcount <= p.capacity().get());
        }
    }

    #[test]
    fn test_add_team_allocates_immediately() {
        let mut p = planner(52);
        let id = p.add_team(NewTeam::new("Payments", 10).days_per_week(2)).unwrap();

        let team = p.team(id).unwrap();
        assert_eq!(team.assigned_days(), &[Weekday::Monday, Weekday::Tuesday]);
        assert_eq!(p.schedule().slot(Weekday::Monday).teams, vec![id]);
    }

    #[test]
    fn test_add_team_without_days_draws_two_or_three() {
        let mut p = Planner::seeded(cap(52), 3);
        for i in 0..20 {
            let id = p.add_team(NewTeam::new(format!("t{i}"), 1)).unwrap();
            let days = p.team(id).unwrap().days_per_week();
            assert!(days == 2 || days == 3);
        }
    }

    #[test]
    fn test_invalid_team_leaves_state_unchanged() {
        let mut p = planner(52);
        p.add_team(NewTeam::new("Keep", 5).days_per_week(1)).unwrap();
        let before = p.snapshot();

        assert!(p.add_team(NewTeam::new("Zero", 0)).unwrap_err().is_validation());
        assert!(p.add_team(NewTeam::new("", 4)).unwrap_err().is_validation());
        assert!(p.add_team(NewTeam::new("   ", 4)).unwrap_err().is_validation());
        assert!(p.add_team(NewTeam::new("Huge", 53)).unwrap_err().is_validation());
        assert!(p
            .add_team(NewTeam::new("Lazy", 4).days_per_week(0))
            .unwrap_err()
            .is_validation());

        assert_eq!(p.snapshot(), before);
        assert_eq!(p.teams().len(), 1);
    }

    #[test]
    fn test_edit_team_reallocates() {
        let mut p = planner(52);
        let id = p.add_team(NewTeam::new("Core", 10).days_per_week(1)).unwrap();
        p.edit_team(
            id,
            TeamPatch {
                days_per_week: Some(4),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(p.team(id).unwrap().assigned_days().len(), 4);

        let err = p
            .edit_team(
                id,
                TeamPatch {
                    size: Some(60),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(p.team(id).unwrap().size(), 10);

        let err = p.edit_team(id, TeamPatch::default()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_remove_team_cascades_and_frees_days() {
        let mut p = planner(30);
        let a = p.add_team(NewTeam::new("A", 20).days_per_week(5)).unwrap();
        let b = p.add_team(NewTeam::new("B", 20).days_per_week(5)).unwrap();
        p.add_member(a, "Ana").unwrap();
        assert!(p.team(b).unwrap().assigned_days().is_empty());

        let removed = p.remove_team(a).unwrap();
        assert_eq!(removed.members().len(), 1);
        assert!(p.team(a).unwrap_err().is_not_found());
        assert_eq!(p.team(b).unwrap().assigned_days().len(), 5);
    }

    #[test]
    fn test_remove_missing_team_is_not_found() {
        let mut p = planner(52);
        assert!(p.remove_team(TeamId::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_single_oversized_team_degrades() {
        let mut p = Planner::seeded(cap(52), 11);
        let id = p.add_team(NewTeam::new("Big", 15).days_per_week(3)).unwrap();
        p.set_capacity(10).unwrap();

        assert!(p.team(id).unwrap().assigned_days().is_empty());
        assert_eq!(p.last_report().degraded.len(), 1);
        assert_capacity_respected(&p);
    }

    #[test]
    fn test_capacity_cut_reflows() {
        let mut p = Planner::seeded(cap(52), 5);
        p.add_team(NewTeam::new("Thirty", 30).days_per_week(3)).unwrap();
        p.add_team(NewTeam::new("TwentyFive", 25).days_per_week(3)).unwrap();
        assert_capacity_respected(&p);

        p.set_capacity(20).unwrap();
        assert_eq!(p.capacity().get(), 20);
        assert_capacity_respected(&p);
        assert_eq!(p.teams().len(), 2);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut p = planner(30);
        assert!(p.set_capacity(0).unwrap_err().is_validation());
        assert!(p.set_capacity(-3).unwrap_err().is_validation());
        assert_eq!(p.capacity().get(), 30);
    }

    #[test]
    fn test_lenient_capacity_falls_back_to_default() {
        let mut p = planner(30);
        assert_eq!(p.set_capacity_lenient("abc"), DailyCapacity::DEFAULT);
        assert_eq!(p.capacity(), DailyCapacity::DEFAULT);
        assert_eq!(p.set_capacity_lenient("12").get(), 12);
    }

    #[test]
    fn test_member_changes_do_not_reallocate() {
        let mut calls = 0u32;
        let counting = |_: &Team, _: &mut [Weekday]| calls += 1;
        let mut p = Planner::with_shuffler(cap(52), counting);
        let id = p.add_team(NewTeam::new("Ops", 2).days_per_week(1)).unwrap();
        let ana = p.add_member(id, "Ana").unwrap();
        p.rename_member(id, ana, "Ana B").unwrap();
        p.remove_member(id, ana).unwrap();
        drop(p);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_member_cap() {
        let mut p = planner(52);
        let id = p.add_team(NewTeam::new("Pair", 2)).unwrap();
        p.add_member(id, "Ana").unwrap();
        p.add_member(id, "Luis").unwrap();

        let err = p.add_member(id, "Eva").unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(p.team(id).unwrap().members().len(), 2);
    }

    #[test]
    fn test_replace_team_rebuilds_roster() {
        let mut p = planner(52);
        let id = p.add_team(NewTeam::new("Old", 4).days_per_week(2).member("Ana")).unwrap();
        let old_member = p.team(id).unwrap().members()[0].id;

        p.replace_team(
            id,
            NewTeam::new("New", 3).office("Madrid").member("Eva").member("Luis"),
        )
        .unwrap();

        let team = p.team(id).unwrap();
        assert_eq!(team.name(), "New");
        assert_eq!(team.size(), 3);
        assert_eq!(team.days_per_week(), 2);
        assert_eq!(team.office(), Some("Madrid"));
        let names: Vec<_> = team.members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Eva", "Luis"]);
        assert!(team.members().iter().all(|m| m.id != old_member));

        let err = p
            .replace_team(id, NewTeam::new("Tiny", 1).member("A").member("B"))
            .unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(p.team(id).unwrap().name(), "New");
    }

    #[test]
    fn test_today_occupancy() {
        let mut p = planner(52);
        p.add_team(NewTeam::new("Ten", 10).days_per_week(1)).unwrap();
        p.add_team(NewTeam::new("Fifteen", 15).days_per_week(1)).unwrap();
        assert_eq!(p.schedule().slot(Weekday::Monday).teams.len(), 2);

        let monday = p.stats(chrono::Weekday::Mon);
        assert_eq!(monday.today, Some(Weekday::Monday));
        assert_eq!(monday.today_occupancy, 25);
        assert_eq!(monday.declared_headcount, 25);
        assert_eq!(monday.team_count, 2);

        assert_eq!(p.stats(chrono::Weekday::Tue).today_occupancy, 0);
        assert_eq!(p.stats(chrono::Weekday::Sat).today_occupancy, 0);
        assert_eq!(p.stats(chrono::Weekday::Sun).today_occupancy, 0);
        assert_eq!(p.stats(chrono::Weekday::Sun).today, None);
    }

    #[test]
    fn test_declared_and_rostered_headcount_differ() {
        let mut p = planner(52);
        let id = p.add_team(NewTeam::new("Core", 6).days_per_week(1)).unwrap();
        p.add_member(id, "Ana").unwrap();
        let stats = p.stats(chrono::Weekday::Wed);
        assert_eq!(stats.declared_headcount, 6);
        assert_eq!(stats.rostered_headcount, 1);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut p = Planner::seeded(cap(40), 21);
        let id = p.add_team(NewTeam::new("Ops", 12).days_per_week(3).member("Ana")).unwrap();
        p.add_team(NewTeam::new("Data", 30).days_per_week(2)).unwrap();
        p.add_member(id, "Luis").unwrap();

        let json = p.snapshot().to_json().unwrap();
        let restored = Planner::restore(Snapshot::from_json(&json).unwrap(), CalendarOrder);

        assert_eq!(restored.snapshot(), p.snapshot());
        assert_eq!(restored.teams(), p.teams());
        assert_eq!(restored.schedule(), p.schedule());
        assert_eq!(restored.last_report(), p.last_report());
    }

    #[test]
    fn test_restore_rebuilds_inconsistent_schedule() {
        let mut p = planner(52);
        p.add_team(NewTeam::new("Ops", 12).days_per_week(2)).unwrap();
        let mut snapshot = p.snapshot();
        snapshot.daily_capacity = cap(5);

        let restored = Planner::restore(snapshot, CalendarOrder);
        assert_capacity_respected(&restored);
        assert!(restored.teams()[0].assigned_days().is_empty());
    }

    #[test]
    fn test_restore_without_schedule_allocates() {
        let json = r#"{
            "dailyCapacity": 52,
            "teams": [{"id": "team_01HV4Z2WQXKJNM8GPQY6VBKC3D", "name": "Ops", "size": 6, "daysPerWeek": 2}]
        }"#;
        let restored = Planner::restore(Snapshot::from_json(json).unwrap(), CalendarOrder);
        assert_eq!(
            restored.teams()[0].assigned_days(),
            &[Weekday::Monday, Weekday::Tuesday]
        );
        assert!(restored.teams()[0].members().is_empty());
    }

    #[test]
    fn test_restore_drops_invalid_teams() {
        let json = r#"{
            "dailyCapacity": 52,
            "teams": [
                {"id": "team_01HV4Z2WQXKJNM8GPQY6VBKC3D", "name": "", "size": 6, "daysPerWeek": 2},
                {"id": "team_01HV4Z3MXNKPQR9HSTZ7WCLD4E", "name": "Ok", "size": 6, "daysPerWeek": 9},
                {"id": "team_01HV4Z4NYPLTRS0JTUA8XDME5F", "name": "Fine", "size": 6, "daysPerWeek": 1}
            ]
        }"#;
        let restored = Planner::restore(Snapshot::from_json(json).unwrap(), CalendarOrder);
        assert_eq!(restored.teams().len(), 1);
        assert_eq!(restored.teams()[0].name(), "Fine");
    }

    #[test]
    fn test_restore_drops_repeated_member_ids() {
        let json = r#"{
            "dailyCapacity": 52,
            "teams": [{
                "id": "team_01HV4Z2WQXKJNM8GPQY6VBKC3D", "name": "Ops", "size": 6, "daysPerWeek": 2,
                "members": [
                    {"id": "mem_01HV4Z3MXNKPQR9HSTZ7WCLD4E", "name": "Ana"},
                    {"id": "mem_01HV4Z4NYPLTRS0JTUA8XDME5F", "name": "Luis"},
                    {"id": "mem_01HV4Z3MXNKPQR9HSTZ7WCLD4E", "name": "Ana again"}
                ]
            }]
        }"#;
        let mut restored = Planner::restore(Snapshot::from_json(json).unwrap(), CalendarOrder);
        let team_id = restored.teams()[0].id();
        let names: Vec<_> = restored.teams()[0].members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Ana", "Luis"]);

        let ana: MemberId = "mem_01HV4Z3MXNKPQR9HSTZ7WCLD4E".parse().unwrap();
        restored.remove_member(team_id, ana).unwrap();
        assert!(restored.member(team_id, ana).unwrap_err().is_not_found());
    }
}
