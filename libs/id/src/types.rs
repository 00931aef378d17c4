//! Typed IDs for planner resources.

use crate::define_id;

define_id!(
    /// Identifies a team within a workspace.
    TeamId,
    "team"
);

define_id!(
    /// Identifies a member within its owning team's roster.
    MemberId,
    "mem"
);
