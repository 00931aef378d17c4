//! deskplan planner API.
//!
//! This crate primarily ships the `planner-api` binary, but exposes a small
//! library surface so the router can be exercised in-process by tests.

pub mod api;
pub mod config;
pub mod persistence;
pub mod state;
pub mod workspace;
