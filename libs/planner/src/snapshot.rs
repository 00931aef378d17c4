//! Serialized form of a planner workspace.
//!
//! The whole state is stored as one JSON document. Older documents may lack
//! fields that were added later (`members`, `version`, ...); these are filled
//! with defaults while decoding so the rest of the crate never sees a partial
//! record.
//!
//! Format history:
//! - v1: capacity, teams, schedule (no `version` field, no rosters)
//! - v2: adds `version`, per-team `members`, `office`, and `date`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocator::WeekSchedule;
use crate::capacity::DailyCapacity;
use crate::team::Team;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 2;

/// Namespace the snapshot is stored under unless configured otherwise.
pub const DEFAULT_NAMESPACE: &str = "deskplan-app-data";

/// Errors decoding a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(
        "snapshot version {found} is newer than supported version {supported}",
        supported = SNAPSHOT_VERSION
    )]
    UnsupportedVersion { found: u32 },
}

/// Planner state as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub daily_capacity: DailyCapacity,
    #[serde(default)]
    pub teams: Vec<Team>,
    /// Absent in documents written before the first allocation.
    #[serde(default)]
    pub week_schedule: Option<WeekSchedule>,
}

fn legacy_version() -> u32 {
    1
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            daily_capacity: DailyCapacity::DEFAULT,
            teams: Vec::new(),
            week_schedule: Some(WeekSchedule::default()),
        }
    }
}

impl Snapshot {
    /// Decodes a snapshot, upgrading older versions in place.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let mut snapshot: Snapshot = serde_json::from_str(json)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
            });
        }
        snapshot.version = SNAPSHOT_VERSION;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_document_backfills_members() {
        let json = r#"{
            "dailyCapacity": 40,
            "teams": [
                {"id": "team_01HV4Z2WQXKJNM8GPQY6VBKC3D", "name": "Ops", "size": 6,
                 "daysPerWeek": 2, "assignedDays": ["monday", "friday"]}
            ],
            "weekSchedule": {
                "monday": {"teams": ["team_01HV4Z2WQXKJNM8GPQY6VBKC3D"], "headcount": 6},
                "friday": {"teams": ["team_01HV4Z2WQXKJNM8GPQY6VBKC3D"], "headcount": 6}
            }
        }"#;

        let snapshot = Snapshot::from_json(json).unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.daily_capacity.get(), 40);
        assert_eq!(snapshot.teams.len(), 1);
        assert!(snapshot.teams[0].members().is_empty());
        assert_eq!(snapshot.teams[0].name(), "Ops");
        assert_eq!(snapshot.teams[0].assigned_days().len(), 2);
    }

    #[test]
    fn test_empty_object_is_default_state() {
        let snapshot = Snapshot::from_json("{}").unwrap();
        assert_eq!(snapshot.daily_capacity, DailyCapacity::DEFAULT);
        assert!(snapshot.teams.is_empty());
        assert!(snapshot.week_schedule.is_none());
    }

    #[test]
    fn test_future_version_rejected() {
        let err = Snapshot::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::UnsupportedVersion { found: 99 }));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            Snapshot::from_json("not json"),
            Err(SnapshotError::Malformed(_))
        ));
        assert!(matches!(
            Snapshot::from_json(r#"{"dailyCapacity": 0}"#),
            Err(SnapshotError::Malformed(_))
        ));
    }
}
