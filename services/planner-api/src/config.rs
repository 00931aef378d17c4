//! Service configuration (env-driven).

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use deskplan_planner::DEFAULT_NAMESPACE;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Directory holding one subdirectory per workspace.
    pub state_dir: PathBuf,

    /// File stem the workspace state is stored under.
    pub namespace: String,

    /// Pause before a reallocating command completes. Zero disables it.
    pub reorganize_delay: Duration,

    /// Pending commands each workspace may queue.
    pub mailbox_size: usize,

    /// Idle time after which a workspace actor is stopped.
    pub idle_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("DESKPLAN_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .context("DESKPLAN_LISTEN_ADDR must be a socket address (host:port).")?;

        let log_level = std::env::var("DESKPLAN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let state_dir = std::env::var("DESKPLAN_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let namespace = std::env::var("DESKPLAN_NAMESPACE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let reorganize_delay_ms: u64 = std::env::var("DESKPLAN_REORGANIZE_DELAY_MS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("DESKPLAN_REORGANIZE_DELAY_MS must be an integer (milliseconds).")?
            .unwrap_or(500);

        let mailbox_size: usize = std::env::var("DESKPLAN_MAILBOX_SIZE")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("DESKPLAN_MAILBOX_SIZE must be an integer.")?
            .unwrap_or(64)
            .clamp(1, 1024);

        let idle_timeout_secs: u64 = std::env::var("DESKPLAN_IDLE_TIMEOUT_SECS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("DESKPLAN_IDLE_TIMEOUT_SECS must be an integer (seconds).")?
            .unwrap_or(300);

        Ok(Self {
            listen_addr,
            log_level,
            state_dir,
            namespace,
            reorganize_delay: Duration::from_millis(reorganize_delay_ms),
            mailbox_size,
            idle_timeout: Duration::from_secs(idle_timeout_secs),
        })
    }
}
