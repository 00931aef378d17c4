//! Shared daily headcount limit.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

/// Maximum total headcount allowed on any single weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DailyCapacity(NonZeroU32);

impl DailyCapacity {
    /// Capacity used for fresh state and for unparseable input.
    pub const DEFAULT: Self = match NonZeroU32::new(52) {
        Some(v) => Self(v),
        None => unreachable!(),
    };

    /// Creates a capacity, rejecting zero.
    pub fn new(value: u32) -> PlannerResult<Self> {
        NonZeroU32::new(value)
            .map(Self)
            .ok_or_else(|| PlannerError::validation("daily_capacity", "must be a positive integer"))
    }

    /// Parses raw user input, falling back to [`DailyCapacity::DEFAULT`] when it
    /// is not a positive integer.
    pub fn parse_lenient(input: &str) -> Self {
        input
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|v| Self::new(v).ok())
            .unwrap_or(Self::DEFAULT)
    }

    /// Returns the capacity as a plain integer.
    pub const fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for DailyCapacity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for DailyCapacity {
    type Error = PlannerError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Signed input, as received from clients; zero, negative, and values past
/// `u32::MAX` are rejected.
impl TryFrom<i64> for DailyCapacity {
    type Error = PlannerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(PlannerError::validation(
                "daily_capacity",
                "must be a positive integer",
            ));
        }
        u32::try_from(value)
            .map_err(|_| PlannerError::validation("daily_capacity", "is too large"))
            .and_then(Self::new)
    }
}

impl From<DailyCapacity> for u32 {
    fn from(capacity: DailyCapacity) -> Self {
        capacity.get()
    }
}

impl std::fmt::Display for DailyCapacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rejected() {
        let err = DailyCapacity::new(0).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_lenient_parse_falls_back_to_default() {
        assert_eq!(DailyCapacity::parse_lenient("30").get(), 30);
        assert_eq!(DailyCapacity::parse_lenient(" 12 ").get(), 12);
        assert_eq!(DailyCapacity::parse_lenient("0"), DailyCapacity::DEFAULT);
        assert_eq!(DailyCapacity::parse_lenient("-4"), DailyCapacity::DEFAULT);
        assert_eq!(DailyCapacity::parse_lenient("lots"), DailyCapacity::DEFAULT);
        assert_eq!(DailyCapacity::parse_lenient(""), DailyCapacity::DEFAULT);
    }

    #[test]
    fn test_signed_input() {
        assert_eq!(DailyCapacity::try_from(40_i64).unwrap().get(), 40);
        assert!(DailyCapacity::try_from(0_i64).unwrap_err().is_validation());
        assert!(DailyCapacity::try_from(-3_i64).unwrap_err().is_validation());
        assert!(DailyCapacity::try_from(i64::from(u32::MAX) + 1)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_zero_fails_to_deserialize() {
        assert!(serde_json::from_str::<DailyCapacity>("0").is_err());
        let cap: DailyCapacity = serde_json::from_str("20").unwrap();
        assert_eq!(cap.get(), 20);
    }
}
