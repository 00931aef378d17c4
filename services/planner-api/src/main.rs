//! deskplan planner API
//!
//! Serves team, roster, and weekly schedule operations for any number of
//! workspaces, each persisted to its own snapshot file.

use anyhow::Result;
use deskplan_api::{
    api, config,
    persistence::StatePersistence,
    state::AppState,
    workspace::{WorkspaceRegistry, WorkspaceSettings, SHUTDOWN_TIMEOUT},
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // Prefer RUST_LOG, fall back to DESKPLAN_LOG_LEVEL
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting deskplan planner API");
    info!(
        listen_addr = %config.listen_addr,
        state_dir = %config.state_dir.display(),
        namespace = %config.namespace,
        reorganize_delay_ms = config.reorganize_delay.as_millis() as u64,
        idle_timeout_secs = config.idle_timeout.as_secs(),
        "Configuration loaded"
    );

    let workspaces = WorkspaceRegistry::new(WorkspaceSettings {
        persistence: StatePersistence::new(config.state_dir.clone(), config.namespace.clone()),
        reorganize_delay: config.reorganize_delay,
        mailbox_size: config.mailbox_size,
        idle_timeout: config.idle_timeout,
    });
    let state = AppState::new(workspaces);
    let app = api::create_router(state.clone());

    let evictor_handle = {
        let state = state.clone();
        let interval = config.idle_timeout / 2;
        tokio::spawn(async move { state.workspaces().run_evictor(interval).await })
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let mut server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                while !*shutdown_rx.borrow() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    let finished = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            None
        }
        result = &mut server_handle => Some(result),
    };

    // Stop accepting requests and let in-flight ones reach their workspace
    let _ = shutdown_tx.send(true);
    let result = match finished {
        Some(result) => Some(result),
        None => tokio::time::timeout(SHUTDOWN_TIMEOUT, server_handle).await.ok(),
    };
    match result {
        Some(Ok(Ok(()))) => info!("Server exited normally"),
        Some(Ok(Err(e))) => error!(error = %e, "Server error"),
        Some(Err(e)) => error!(error = %e, "Server task panicked"),
        None => warn!("HTTP server did not shut down in time"),
    }

    info!(
        open_workspaces = state.workspaces().open_count().await,
        "Waiting for workspaces to shut down..."
    );
    state.workspaces().shutdown().await;

    if let Err(e) = tokio::time::timeout(SHUTDOWN_TIMEOUT, evictor_handle).await {
        warn!(error = %e, "Workspace evictor did not shut down in time");
    }

    info!("Planner API shutdown complete");
    Ok(())
}
