//! # deskplan-id
//!
//! Stable ID types for deskplan resources.
//!
//! Teams and members are addressed by system-generated IDs; names are
//! user-controlled labels that may change at any time.
//!
//! ## ID Format
//!
//! All resource IDs use a prefixed format: `{prefix}_{ulid}`
//!
//! - `team_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - `mem_01HV4Z3MXNKPQR9HSTZ7WCLD4E`
//!
//! The prefix keeps a member ID from being passed where a team ID is expected,
//! and the ULID keeps IDs unique and creation-ordered.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Raw ULID type, for callers that build IDs with [`TeamId::from_ulid`].
pub use ulid::Ulid;
