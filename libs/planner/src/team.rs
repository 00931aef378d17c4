//! Team and member entities, and the per-team member roster.
//!
//! A team's declared `size` is what the allocator schedules against. The
//! roster is an independent list of named members capped at that size; it
//! never influences which days a team gets.

use std::collections::HashSet;

use chrono::NaiveDate;
use deskplan_id::{MemberId, TeamId};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::capacity::DailyCapacity;
use crate::error::{PlannerError, PlannerResult};
use crate::weekday::Weekday;

/// Fewest days a team may ask for.
pub const MIN_DAYS_PER_WEEK: u8 = 1;

/// Most days a team may ask for.
pub const MAX_DAYS_PER_WEEK: u8 = Weekday::ALL.len() as u8;

/// A named person on a team roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

/// A team competing for desk days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    id: TeamId,
    name: String,
    size: u32,
    days_per_week: u8,
    #[serde(default)]
    pub(crate) assigned_days: Vec<Weekday>,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    office: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
}

impl Team {
    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared headcount; authoritative for scheduling.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn days_per_week(&self) -> u8 {
        self.days_per_week
    }

    /// Days granted by the most recent allocation run, in the order they were granted.
    pub fn assigned_days(&self) -> &[Weekday] {
        &self.assigned_days
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn office(&self) -> Option<&str> {
        self.office.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// True when the last run granted fewer days than requested.
    pub fn is_degraded(&self) -> bool {
        self.assigned_days.len() < usize::from(self.days_per_week)
    }

    /// Builds a validated team. `fallback_days` is used when the request
    /// leaves `days_per_week` unset.
    pub(crate) fn build(
        id: TeamId,
        request: NewTeam,
        capacity: DailyCapacity,
        fallback_days: u8,
    ) -> PlannerResult<Self> {
        let name = validate_name("name", &request.name)?;
        validate_size(request.size, capacity)?;
        let days_per_week = match request.days_per_week {
            Some(days) => validate_days_per_week(days)?,
            None => fallback_days,
        };

        if request.members.len() > request.size as usize {
            return Err(PlannerError::CapacityExceeded {
                team_id: id,
                size: request.size,
            });
        }
        let members = request
            .members
            .iter()
            .map(|name| {
                validate_name("member name", name).map(|name| Member {
                    id: MemberId::new(),
                    name,
                })
            })
            .collect::<PlannerResult<Vec<_>>>()?;

        Ok(Self {
            id,
            name,
            size: request.size,
            days_per_week,
            assigned_days: Vec::new(),
            members,
            office: normalize_optional(request.office),
            date: request.date,
        })
    }

    /// Applies a partial edit. Nothing changes unless every field validates.
    pub(crate) fn apply(&mut self, patch: TeamPatch, capacity: DailyCapacity) -> PlannerResult<()> {
        let name = patch
            .name
            .as_deref()
            .map(|name| validate_name("name", name))
            .transpose()?;
        if let Some(size) = patch.size {
            validate_size(size, capacity)?;
        }
        if let Some(days) = patch.days_per_week {
            validate_days_per_week(days)?;
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(days) = patch.days_per_week {
            self.days_per_week = days;
        }
        Ok(())
    }

    /// Checks a record read from storage, where no constructor ran.
    pub(crate) fn check_stored(&self) -> PlannerResult<()> {
        validate_name("name", &self.name)?;
        if self.size == 0 {
            return Err(PlannerError::validation("size", "must be at least 1"));
        }
        validate_days_per_week(self.days_per_week)?;
        for member in &self.members {
            validate_name("member name", &member.name)?;
        }
        Ok(())
    }

    /// Removes members whose ID already appeared earlier in the roster and
    /// returns how many were dropped.
    pub(crate) fn dedup_members(&mut self) -> usize {
        let before = self.members.len();
        let mut seen = HashSet::with_capacity(before);
        self.members.retain(|m| seen.insert(m.id));
        before - self.members.len()
    }

    pub(crate) fn add_member(&mut self, name: &str) -> PlannerResult<MemberId> {
        let name = validate_name("member name", name)?;
        if self.members.len() >= self.size as usize {
            return Err(PlannerError::CapacityExceeded {
                team_id: self.id,
                size: self.size,
            });
        }

        let id = MemberId::new();
        self.members.push(Member { id, name });
        Ok(id)
    }

    pub(crate) fn rename_member(&mut self, member_id: MemberId, name: &str) -> PlannerResult<()> {
        let name = validate_name("member name", name)?;
        let team_id = self.id;
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id == member_id)
            .ok_or(PlannerError::MemberNotFound { team_id, member_id })?;
        member.name = name;
        Ok(())
    }

    pub(crate) fn remove_member(&mut self, member_id: MemberId) -> PlannerResult<Member> {
        let index = self
            .members
            .iter()
            .position(|m| m.id == member_id)
            .ok_or(PlannerError::MemberNotFound {
                team_id: self.id,
                member_id,
            })?;
        Ok(self.members.remove(index))
    }
}

/// Request to create a team, or to replace one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub size: u32,
    /// Left unset, a new team draws 2 or 3 at random and a replaced team keeps its value.
    #[serde(default)]
    pub days_per_week: Option<u8>,
    #[serde(default)]
    pub office: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Initial roster, by name.
    #[serde(default)]
    pub members: Vec<String>,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn days_per_week(mut self, days: u8) -> Self {
        self.days_per_week = Some(days);
        self
    }

    #[must_use]
    pub fn office(mut self, office: impl Into<String>) -> Self {
        self.office = Some(office.into());
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.members.push(name.into());
        self
    }
}

/// Partial edit of a team's scheduling attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub days_per_week: Option<u8>,
}

impl TeamPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.size.is_none() && self.days_per_week.is_none()
    }
}

/// Draws the default weekly target for a new team: 2 or 3 with equal odds.
pub fn random_days_per_week<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    if rng.random_bool(0.5) {
        2
    } else {
        3
    }
}

fn validate_name(field: &'static str, name: &str) -> PlannerResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlannerError::validation(field, "must not be empty"));
    }
    Ok(name.to_string())
}

fn validate_size(size: u32, capacity: DailyCapacity) -> PlannerResult<()> {
    if size == 0 || size > capacity.get() {
        return Err(PlannerError::validation(
            "size",
            format!("must be between 1 and the daily capacity ({capacity})"),
        ));
    }
    Ok(())
}

fn validate_days_per_week(days: u8) -> PlannerResult<u8> {
    if !(MIN_DAYS_PER_WEEK..=MAX_DAYS_PER_WEEK).contains(&days) {
        return Err(PlannerError::validation(
            "days_per_week",
            format!("must be between {MIN_DAYS_PER_WEEK} and {MAX_DAYS_PER_WEEK}"),
        ));
    }
    Ok(days)
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
