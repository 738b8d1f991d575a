//! `SQLite` storage layer for `issue-tracker`.
//!
//! One shared connection guarded by an async mutex; every store operation
//! awaits the lock and performs a single statement (plus the read-back on
//! update), so per-operation atomicity comes from `SQLite` itself. File
//! databases run in WAL mode for concurrent reads.

use std::path::Path;
use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, TrackerError};
use crate::model::{Issue, IssueDraft, IssueFilter, IssuePatch};
use crate::util::id;
use crate::validation::DraftValidator;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS issues (
    id          TEXT PRIMARY KEY,
    project     TEXT NOT NULL DEFAULT '',
    issue_title TEXT NOT NULL,
    issue_text  TEXT NOT NULL,
    created_by  TEXT NOT NULL,
    assigned_to TEXT NOT NULL DEFAULT '',
    status_text TEXT NOT NULL DEFAULT '',
    created_on  TEXT NOT NULL,
    updated_on  TEXT NOT NULL,
    open        INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project);
";

const COLUMNS: &str = "id, project, issue_title, issue_text, created_by, \
                       assigned_to, status_text, created_on, updated_on, open";

/// Issue store backed by `SQLite`.
///
/// Cheap to clone; clones share the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns `Sqlite` if the file cannot be opened or the schema cannot be
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (tests, throwaway servers).
    ///
    /// # Errors
    ///
    /// Returns `Sqlite` if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Return all issues matching every condition in `filter`.
    ///
    /// An unmatchable filter (unknown field or unparseable value) matches no
    /// records by definition and never reaches the database.
    ///
    /// # Errors
    ///
    /// Returns `Sqlite` on any underlying access failure.
    pub async fn find(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        if filter.is_unmatchable() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock().await;
        let (where_sql, bind) = build_where(filter);
        let sql = format!(
            "SELECT {COLUMNS} FROM issues WHERE {where_sql} ORDER BY created_on, id"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind), map_issue_row)?;
        let issues = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(project = %filter.project, count = issues.len(), "find");
        Ok(issues)
    }

    /// Persist a new issue, assigning it a fresh unique id.
    ///
    /// The draft is re-validated here so an issue missing a required field is
    /// never persisted, whatever the caller did.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a required field is empty, or `Sqlite` on
    /// write failure.
    pub async fn insert(&self, draft: IssueDraft) -> Result<Issue> {
        DraftValidator::validate(&draft).map_err(TrackerError::from_validation_errors)?;

        let conn = self.conn.lock().await;

        let mut nonce = 0;
        let issue_id = loop {
            let candidate =
                id::object_id(&draft.issue_title, &draft.created_by, draft.created_on, nonce);
            if !id_exists(&conn, &candidate)? {
                break candidate;
            }
            nonce += 1;
        };

        let issue = draft.into_issue(issue_id);
        conn.execute(
            "INSERT INTO issues (id, project, issue_title, issue_text, created_by, \
             assigned_to, status_text, created_on, updated_on, open) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                issue.id,
                issue.project,
                issue.issue_title,
                issue.issue_text,
                issue.created_by,
                issue.assigned_to,
                issue.status_text,
                to_db_time(issue.created_on),
                to_db_time(issue.updated_on),
                issue.open,
            ],
        )?;

        debug!(id = %issue.id, project = %issue.project, "insert");
        Ok(issue)
    }

    /// Apply `patch` to the issue with the given id.
    ///
    /// Only fields present in the patch are overwritten. Returns `None` when
    /// no issue has that id, including when `id` is not structurally valid.
    ///
    /// # Errors
    ///
    /// Returns `Sqlite` on any other write failure.
    pub async fn update_by_id(&self, issue_id: &str, patch: &IssuePatch) -> Result<Option<Issue>> {
        if !id::is_valid_object_id(issue_id) {
            return Ok(None);
        }

        let conn = self.conn.lock().await;

        let mut sets: Vec<&str> = Vec::new();
        let mut bind: Vec<Value> = Vec::new();
        if let Some(ref title) = patch.issue_title {
            sets.push("issue_title = ?");
            bind.push(Value::Text(title.clone()));
        }
        if let Some(ref text) = patch.issue_text {
            sets.push("issue_text = ?");
            bind.push(Value::Text(text.clone()));
        }
        if let Some(ref created_by) = patch.created_by {
            sets.push("created_by = ?");
            bind.push(Value::Text(created_by.clone()));
        }
        if let Some(ref assigned_to) = patch.assigned_to {
            sets.push("assigned_to = ?");
            bind.push(Value::Text(assigned_to.clone()));
        }
        if let Some(ref status_text) = patch.status_text {
            sets.push("status_text = ?");
            bind.push(Value::Text(status_text.clone()));
        }
        if let Some(open) = patch.open {
            sets.push("open = ?");
            bind.push(Value::Integer(i64::from(open)));
        }
        if let Some(updated_on) = patch.updated_on {
            sets.push("updated_on = ?");
            bind.push(Value::Text(to_db_time(updated_on)));
        }

        if sets.is_empty() {
            return get_by_id(&conn, issue_id);
        }

        let sql = format!("UPDATE issues SET {} WHERE id = ?", sets.join(", "));
        bind.push(Value::Text(issue_id.to_string()));
        let changed = conn.execute(&sql, params_from_iter(bind))?;
        if changed == 0 {
            return Ok(None);
        }

        debug!(id = %issue_id, fields = sets.len(), "update");
        get_by_id(&conn, issue_id)
    }

    /// Remove the issue with the given id, reporting whether it existed.
    ///
    /// A structurally invalid id is "not found", not an error.
    ///
    /// # Errors
    ///
    /// Returns `Sqlite` on any other write failure.
    pub async fn delete_by_id(&self, issue_id: &str) -> Result<bool> {
        if !id::is_valid_object_id(issue_id) {
            return Ok(false);
        }

        let conn = self.conn.lock().await;
        let removed = conn.execute("DELETE FROM issues WHERE id = ?", params![issue_id])?;

        debug!(id = %issue_id, found = removed > 0, "delete");
        Ok(removed > 0)
    }
}

fn id_exists(conn: &Connection, issue_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM issues WHERE id = ?",
            params![issue_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn get_by_id(conn: &Connection, issue_id: &str) -> Result<Option<Issue>> {
    let sql = format!("SELECT {COLUMNS} FROM issues WHERE id = ?");
    conn.query_row(&sql, params![issue_id], map_issue_row)
        .optional()
        .map_err(Into::into)
}

fn build_where(filter: &IssueFilter) -> (String, Vec<Value>) {
    let mut clauses = vec!["project = ?"];
    let mut bind = vec![Value::Text(filter.project.clone())];

    let text_fields = [
        ("id = ?", &filter.id),
        ("issue_title = ?", &filter.issue_title),
        ("issue_text = ?", &filter.issue_text),
        ("created_by = ?", &filter.created_by),
        ("assigned_to = ?", &filter.assigned_to),
        ("status_text = ?", &filter.status_text),
    ];
    for (clause, value) in text_fields {
        if let Some(value) = value {
            clauses.push(clause);
            bind.push(Value::Text(value.clone()));
        }
    }

    if let Some(open) = filter.open {
        clauses.push("open = ?");
        bind.push(Value::Integer(i64::from(open)));
    }
    if let Some(created_on) = filter.created_on {
        clauses.push("created_on = ?");
        bind.push(Value::Text(to_db_time(created_on)));
    }
    if let Some(updated_on) = filter.updated_on {
        clauses.push("updated_on = ?");
        bind.push(Value::Text(to_db_time(updated_on)));
    }

    (clauses.join(" AND "), bind)
}

fn map_issue_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: row.get(0)?,
        project: row.get(1)?,
        issue_title: row.get(2)?,
        issue_text: row.get(3)?,
        created_by: row.get(4)?,
        assigned_to: row.get(5)?,
        status_text: row.get(6)?,
        created_on: from_db_time(row, 7)?,
        updated_on: from_db_time(row, 8)?,
        open: row.get(9)?,
    })
}

/// Timestamps are stored as RFC 3339 text. Writes and filter values both go
/// through this formatter so exact-match comparisons hold.
fn to_db_time(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.to_rfc3339()
}

fn from_db_time(row: &Row<'_>, index: usize) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    let raw: String = row.get(index)?;
    chrono::DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&chrono::Utc))
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })
}
