//! Server configuration for `issue-tracker`.
//!
//! Every flag can also be supplied through an `ISSUE_TRACKER_*` environment
//! variable; command-line values win.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Runtime configuration parsed from argv and the environment.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "issue-tracker",
    version,
    about = "Project-scoped issue tracking REST API"
)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[arg(long, env = "ISSUE_TRACKER_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Path to the SQLite database file.
    #[arg(long = "db", env = "ISSUE_TRACKER_DB", default_value = "issues.db")]
    pub db_path: PathBuf,

    /// Emit logs as JSON instead of human-readable lines.
    #[arg(long, env = "ISSUE_TRACKER_LOG_JSON")]
    pub log_json: bool,
}
