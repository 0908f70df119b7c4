//! authsync CLI entry point

mod cli;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use authsync::client::{ENV_REFRESH_SECS, ENV_SERVER_URL, ENV_SESSION_COOKIE, ENV_TIMEOUT_SECS};
use authsync::{AccessRule, AuthorizationStore, RouteGate, StoreConfig};
use clap::Parser;
use std::process::ExitCode;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = store_config(&cli);
    let store = AuthorizationStore::new(config)
        .with_context(|| format!("Cannot build a client for {}", store_url(&cli)))?;

    match cli.command {
        Commands::Me => me(store).await,
        Commands::Watch => watch(store).await,
        Commands::Check { path, rules } => check(store, path, rules).await,
    }
}

/// Flags (or their environment fallbacks, resolved by clap) feed the same
/// lookup the library uses for the environment, so defaults and warnings
/// behave identically.
fn store_config(cli: &Cli) -> StoreConfig {
    StoreConfig::from_lookup(|key| match key {
        ENV_SERVER_URL => cli.server_url.clone(),
        ENV_SESSION_COOKIE => cli.cookie.clone(),
        ENV_REFRESH_SECS => cli.interval.map(|secs| secs.to_string()),
        ENV_TIMEOUT_SECS => cli.timeout.map(|secs| secs.to_string()),
        _ => None,
    })
}

fn store_url(cli: &Cli) -> &str {
    cli.server_url
        .as_deref()
        .unwrap_or(authsync::client::DEFAULT_SERVER_URL)
}

async fn me(store: AuthorizationStore) -> Result<ExitCode> {
    store.refresh().await;
    let state = store.state();

    println!("{}", serde_json::to_string_pretty(&state)?);

    Ok(if state.is_authenticated() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn watch(store: AuthorizationStore) -> Result<ExitCode> {
    let mut rx = store.subscribe();

    info!(
        url = %store.config().endpoint_url(),
        interval = ?store.config().refresh_interval,
        "Watching authorization state"
    );
    store.start();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut last = rx.borrow().clone();
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                if state.loading {
                    continue;
                }
                if state.permissions != last.permissions || state.role != last.role {
                    info!(
                        role = ?state.role,
                        permissions = ?state.permissions,
                        "Authorization state changed"
                    );
                }
                last = state;
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping");
                break;
            }
        }
    }

    store.close();
    Ok(ExitCode::SUCCESS)
}

async fn check(store: AuthorizationStore, path: String, rules: Vec<AccessRule>) -> Result<ExitCode> {
    let gate = if rules.is_empty() {
        RouteGate::admin_console()
    } else {
        rules.into_iter().collect()
    };

    store.refresh().await;
    let decision = gate.resolve(&path, &store.state());

    println!("Path:   {}", decision.path);
    println!("Layout: {}", decision.layout);
    println!("Access: {}", decision.access);

    Ok(if decision.access.is_granted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
