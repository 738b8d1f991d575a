//! `issue-tracker` - project-scoped issue tracking REST API
//!
//! This crate provides the full functionality of the `issue-tracker` server:
//! a thin CRUD layer mapping four HTTP operations onto an `SQLite`-backed
//! issue store, with every outcome (including failures) normalized into a
//! JSON body on an HTTP 200 response.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`api`] - HTTP routes and handlers using axum
//! - [`model`] - Data types (Issue, `IssueDraft`, `IssuePatch`, `IssueFilter`)
//! - [`storage`] - `SQLite` persistence layer
//! - [`config`] - Server configuration (argv/env)
//! - [`error`] - Error types and handling
//! - [`validation`] - Draft field validation
//! - [`util`] - Utility functions (object-id generation)

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod storage;
pub mod util;
pub mod validation;

pub use error::{Result, TrackerError};

use clap::Parser;

use crate::config::ServerConfig;
use crate::storage::SqliteStore;

/// Run the HTTP server until the process is stopped.
///
/// This is the main entry point called from `main()`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the listener cannot
/// be bound.
pub async fn run() -> Result<()> {
    let config = ServerConfig::parse();
    logging::init(&config);

    let store = SqliteStore::open(&config.db_path)?;
    let app = api::router(store);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, db = %config.db_path.display(), "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
