//! Core data types for `issue-tracker`.
//!
//! The wire format names the identifier `_id` and serializes timestamps as
//! RFC 3339, matching what API clients persist and replay.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const fn default_open() -> bool {
    true
}

/// The primary issue entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    /// Unique ID (24 lowercase hex chars). Immutable once created.
    #[serde(rename = "_id")]
    pub id: String,

    /// Free-text project label the issue is scoped to.
    #[serde(default)]
    pub project: String,

    /// Short summary. Required, non-empty.
    pub issue_title: String,

    /// Issue body. Required, non-empty.
    pub issue_text: String,

    /// Reporter. Required, non-empty.
    pub created_by: String,

    /// Assignee, empty when unassigned.
    #[serde(default)]
    pub assigned_to: String,

    /// Workflow note, empty when unset.
    #[serde(default)]
    pub status_text: String,

    /// Creation timestamp. Never mutated after creation.
    pub created_on: DateTime<Utc>,

    /// Last update timestamp. Refreshed on every successful update.
    pub updated_on: DateTime<Utc>,

    /// Whether the issue is still open.
    #[serde(default = "default_open")]
    pub open: bool,
}

/// A new issue before the store has assigned it an id.
///
/// The constructor stamps every server-controlled field so callers cannot
/// produce a draft with missing defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub open: bool,
}

impl IssueDraft {
    /// Build a draft with creation-time defaults: optional fields fall back
    /// to the empty string, both timestamps are stamped now, `open` is true.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        issue_title: impl Into<String>,
        issue_text: impl Into<String>,
        created_by: impl Into<String>,
        assigned_to: Option<String>,
        status_text: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            project: project.into(),
            issue_title: issue_title.into(),
            issue_text: issue_text.into(),
            created_by: created_by.into(),
            assigned_to: assigned_to.unwrap_or_default(),
            status_text: status_text.unwrap_or_default(),
            created_on: now,
            updated_on: now,
            open: true,
        }
    }

    /// Promote the draft into a full issue under the given id.
    #[must_use]
    pub fn into_issue(self, id: String) -> Issue {
        Issue {
            id,
            project: self.project,
            issue_title: self.issue_title,
            issue_text: self.issue_text,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            status_text: self.status_text,
            created_on: self.created_on,
            updated_on: self.updated_on,
            open: self.open,
        }
    }
}

/// Fields to overwrite on an existing issue.
///
/// Only fields carrying `Some` are applied; everything else is left alone.
/// `updated_on` is a server stamp set by the API layer, never taken from the
/// caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePatch {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl IssuePatch {
    /// True when the patch carries no caller-supplied field.
    ///
    /// The `updated_on` stamp is ignored here; an update that would only
    /// refresh the timestamp is still an empty update.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.issue_title.is_none()
            && self.issue_text.is_none()
            && self.created_by.is_none()
            && self.assigned_to.is_none()
            && self.status_text.is_none()
            && self.open.is_none()
    }
}

/// Exact-match filter for listing issues.
///
/// Filterable fields form a fixed allow-list; a query key outside it (or a
/// value that does not parse for a typed field) marks the whole filter
/// unmatchable, so the lookup returns no records rather than ignoring the
/// condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub project: String,
    pub id: Option<String>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    unmatchable: bool,
}

impl IssueFilter {
    /// Filter that matches every issue in a project.
    #[must_use]
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }

    /// Build a filter from raw query parameters.
    ///
    /// The path `project` always wins over a same-named query parameter.
    #[must_use]
    pub fn from_query(project: impl Into<String>, query: &HashMap<String, String>) -> Self {
        let mut filter = Self::for_project(project);
        for (key, value) in query {
            match key.as_str() {
                // The path segment is authoritative for the project.
                "project" => {}
                "_id" => filter.id = Some(value.clone()),
                "issue_title" => filter.issue_title = Some(value.clone()),
                "issue_text" => filter.issue_text = Some(value.clone()),
                "created_by" => filter.created_by = Some(value.clone()),
                "assigned_to" => filter.assigned_to = Some(value.clone()),
                "status_text" => filter.status_text = Some(value.clone()),
                "open" => match value.parse::<bool>() {
                    Ok(open) => filter.open = Some(open),
                    Err(_) => filter.unmatchable = true,
                },
                "created_on" => match parse_timestamp(value) {
                    Ok(ts) => filter.created_on = Some(ts),
                    Err(_) => filter.unmatchable = true,
                },
                "updated_on" => match parse_timestamp(value) {
                    Ok(ts) => filter.updated_on = Some(ts),
                    Err(_) => filter.unmatchable = true,
                },
                _ => filter.unmatchable = true,
            }
        }
        filter
    }

    /// True when no issue can ever satisfy this filter.
    #[must_use]
    pub const fn is_unmatchable(&self) -> bool {
        self.unmatchable
    }
}

fn parse_timestamp(value: &str) -> chrono::ParseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value).map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn draft_defaults_optional_fields() {
        let draft = IssueDraft::new("apitest", "Title", "Text", "Reporter", None, None);
        assert_eq!(draft.assigned_to, "");
        assert_eq!(draft.status_text, "");
        assert!(draft.open);
        assert_eq!(draft.created_on, draft.updated_on);
    }

    #[test]
    fn draft_keeps_supplied_optional_fields() {
        let draft = IssueDraft::new(
            "apitest",
            "Title",
            "Text",
            "Reporter",
            Some("Worker".to_string()),
            Some("In QA".to_string()),
        );
        assert_eq!(draft.assigned_to, "Worker");
        assert_eq!(draft.status_text, "In QA");
    }

    #[test]
    fn issue_serializes_with_wire_field_names() {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let issue = IssueDraft::new("apitest", "Title", "Text", "Reporter", None, None);
        let mut issue = issue.into_issue("5f6a7b8c9d0e1f2a3b4c5d6e".to_string());
        issue.created_on = created;
        issue.updated_on = created;

        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["_id"], "5f6a7b8c9d0e1f2a3b4c5d6e");
        assert_eq!(value["project"], "apitest");
        assert_eq!(value["open"], true);
        assert!(
            value["created_on"].as_str().unwrap().starts_with("2026-03-01T12:00:00"),
            "timestamps serialize as ISO-8601, got {}",
            value["created_on"]
        );
        assert!(value.get("id").is_none(), "id must only appear as _id");
    }

    #[test]
    fn issue_roundtrips_through_json() {
        let draft = IssueDraft::new("apitest", "Title", "Text", "Reporter", None, None);
        let issue = draft.into_issue("5f6a7b8c9d0e1f2a3b4c5d6e".to_string());
        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, issue);
    }

    #[test]
    fn patch_is_empty_ignores_updated_on_stamp() {
        let patch = IssuePatch {
            updated_on: Some(Utc::now()),
            ..IssuePatch::default()
        };
        assert!(patch.is_empty());
    }

    #[test]
    fn patch_with_open_false_is_not_empty() {
        let patch = IssuePatch {
            open: Some(false),
            ..IssuePatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn filter_collects_known_fields() {
        let filter = IssueFilter::from_query(
            "apitest",
            &query(&[("created_by", "Reporter"), ("open", "true")]),
        );
        assert_eq!(filter.project, "apitest");
        assert_eq!(filter.created_by.as_deref(), Some("Reporter"));
        assert_eq!(filter.open, Some(true));
        assert!(!filter.is_unmatchable());
    }

    #[test]
    fn filter_path_project_overrides_query_project() {
        let filter = IssueFilter::from_query("apitest", &query(&[("project", "other")]));
        assert_eq!(filter.project, "apitest");
        assert!(!filter.is_unmatchable());
    }

    #[test]
    fn filter_unknown_field_is_unmatchable() {
        let filter = IssueFilter::from_query("apitest", &query(&[("flavor", "vanilla")]));
        assert!(filter.is_unmatchable());
    }

    #[test]
    fn filter_unparseable_open_is_unmatchable() {
        let filter = IssueFilter::from_query("apitest", &query(&[("open", "maybe")]));
        assert!(filter.is_unmatchable());
    }

    #[test]
    fn filter_parses_rfc3339_timestamps() {
        let filter = IssueFilter::from_query(
            "apitest",
            &query(&[("created_on", "2026-03-01T12:00:00+00:00")]),
        );
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(filter.created_on, Some(expected));

        let bad = IssueFilter::from_query("apitest", &query(&[("created_on", "yesterday")]));
        assert!(bad.is_unmatchable());
    }
}
