//! `issue-tracker` - project-scoped issue tracking REST API
//!
//! Serves `/api/issues/{project}` over HTTP with an `SQLite` store behind it.
//! All state lives in the database; the process itself is stateless.

#[tokio::main]
async fn main() {
    if let Err(e) = issue_tracker::run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
