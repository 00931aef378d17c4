//! Planner error types.

use deskplan_id::{MemberId, TeamId};
use thiserror::Error;

/// Result type for planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Errors returned by planner mutations.
///
/// Every variant is recoverable: the mutation that produced it was not applied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlannerError {
    /// A field failed validation.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The team roster is already at its declared size.
    #[error("team {team_id} is full: roster already has {size} members")]
    CapacityExceeded { team_id: TeamId, size: u32 },

    /// No team with this ID exists.
    #[error("team not found: {0}")]
    TeamNotFound(TeamId),

    /// No member with this ID exists in the team.
    #[error("member {member_id} not found in team {team_id}")]
    MemberNotFound { team_id: TeamId, member_id: MemberId },
}

impl PlannerError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true for field validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true if a roster was full.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }

    /// Returns true if the addressed team or member does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TeamNotFound(_) | Self::MemberNotFound { .. })
    }
}
