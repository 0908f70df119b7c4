//! CLI command definitions

use authsync::AccessRule;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "authsync")]
#[command(about = "Inspect and watch a session's authorization state", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL
    #[arg(long, env = "SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// Session cookie to send, e.g. "sid=abc123"
    #[arg(long, env = "SESSION_COOKIE", global = true)]
    pub cookie: Option<String>,

    /// Seconds between scheduled refreshes
    #[arg(long, env = "AUTHSYNC_REFRESH_SECS", global = true)]
    pub interval: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, env = "AUTHSYNC_TIMEOUT_SECS", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the session's authorization state once and print it as JSON
    Me,

    /// Poll the backend and log every change until interrupted
    Watch,

    /// Decide the layout and access for an application path
    ///
    /// Exits with status 0 when access is granted, 1 otherwise.
    ///
    /// Examples:
    ///   authsync check /cms/orders/42
    ///   authsync check /reports --rule '/reports/*=CMS_REPORTS'
    Check {
        /// Application path to check
        path: String,

        /// Access rule PATTERN=PERMISSION (can be repeated); defaults to
        /// the admin console table
        #[arg(long = "rule", value_parser = parse_rule)]
        rules: Vec<AccessRule>,
    },
}

fn parse_rule(s: &str) -> Result<AccessRule, String> {
    AccessRule::parse(s).map_err(|e| format!("Invalid rule '{}': {}", s, e))
}
