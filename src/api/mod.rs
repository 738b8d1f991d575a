//! HTTP surface for `issue-tracker`.
//!
//! All four operations share one project-scoped route and always answer
//! HTTP 200: success and failure are distinguished only by the JSON body
//! shape (`result`/data vs `error`). That contract extends to malformed
//! request bodies, which are decoded as an empty object and fall through the
//! normal missing-field paths instead of surfacing a framework 4xx.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{IssueDraft, IssueFilter, IssuePatch};
use crate::storage::SqliteStore;
use crate::validation::DraftValidator;

/// Shared handler state. Clones share the store.
#[derive(Clone)]
pub struct AppState {
    store: SqliteStore,
}

/// Build the application router around an opened store.
#[must_use]
pub fn router(store: SqliteStore) -> Router {
    Router::new()
        .route(
            "/api/issues/{project}",
            get(list_issues)
                .post(create_issue)
                .put(update_issue)
                .delete(delete_issue),
        )
        .with_state(AppState { store })
}

// ============================================================================
// Request / reply shapes
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct CreateIssueRequest {
    issue_title: Option<String>,
    issue_text: Option<String>,
    created_by: Option<String>,
    assigned_to: Option<String>,
    status_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpdateIssueRequest {
    #[serde(rename = "_id")]
    id: Option<String>,
    issue_title: Option<String>,
    issue_text: Option<String>,
    created_by: Option<String>,
    assigned_to: Option<String>,
    status_text: Option<String>,
    open: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteIssueRequest {
    #[serde(rename = "_id")]
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

impl ErrorBody {
    fn new(error: &'static str) -> Self {
        Self { error, id: None }
    }

    fn with_id(error: &'static str, id: String) -> Self {
        Self {
            error,
            id: Some(id),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResultBody {
    result: &'static str,
    #[serde(rename = "_id")]
    id: String,
}

/// Decode a JSON request body, treating an absent or malformed body as an
/// empty object.
fn decode_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_issues(
    Path(project): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Response {
    let filter = IssueFilter::from_query(project, &query);
    match state.store.find(&filter).await {
        Ok(issues) => Json(issues).into_response(),
        Err(err) => {
            warn!(error = %err, "list failed");
            Json(ErrorBody::new("could not retrieve issues")).into_response()
        }
    }
}

async fn create_issue(
    Path(project): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> Response {
    let req: CreateIssueRequest = decode_body(&body);
    let draft = IssueDraft::new(
        project,
        req.issue_title.unwrap_or_default(),
        req.issue_text.unwrap_or_default(),
        req.created_by.unwrap_or_default(),
        req.assigned_to,
        req.status_text,
    );

    if DraftValidator::validate(&draft).is_err() {
        return Json(ErrorBody::new("required field(s) missing")).into_response();
    }

    match state.store.insert(draft).await {
        Ok(issue) => Json(issue).into_response(),
        Err(err) => {
            warn!(error = %err, "create failed");
            Json(ErrorBody::new("could not save issue")).into_response()
        }
    }
}

async fn update_issue(
    Path(_project): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> Response {
    let req: UpdateIssueRequest = decode_body(&body);
    let Some(issue_id) = req.id.clone().filter(|id| !id.is_empty()) else {
        return Json(ErrorBody::new("missing _id")).into_response();
    };

    let mut patch = build_patch(&req);
    if patch.is_empty() {
        return Json(ErrorBody::with_id("no update field(s) sent", issue_id)).into_response();
    }
    patch.updated_on = Some(Utc::now());

    match state.store.update_by_id(&issue_id, &patch).await {
        Ok(Some(_)) => Json(ResultBody {
            result: "successfully updated",
            id: issue_id,
        })
        .into_response(),
        Ok(None) => Json(ErrorBody::with_id("could not update", issue_id)).into_response(),
        Err(err) => {
            warn!(error = %err, "update failed");
            Json(ErrorBody::with_id("could not update", issue_id)).into_response()
        }
    }
}

async fn delete_issue(
    Path(_project): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> Response {
    let req: DeleteIssueRequest = decode_body(&body);
    let Some(issue_id) = req.id.filter(|id| !id.is_empty()) else {
        return Json(ErrorBody::new("missing _id")).into_response();
    };

    match state.store.delete_by_id(&issue_id).await {
        Ok(true) => Json(ResultBody {
            result: "successfully deleted",
            id: issue_id,
        })
        .into_response(),
        Ok(false) => Json(ErrorBody::with_id("could not delete", issue_id)).into_response(),
        Err(err) => {
            warn!(error = %err, "delete failed");
            Json(ErrorBody::with_id("could not delete", issue_id)).into_response()
        }
    }
}

/// Build the update patch from the request fields.
///
/// A string field enters the patch only when present and non-empty; `open`
/// enters whenever it is present, including an explicit `false`.
fn build_patch(req: &UpdateIssueRequest) -> IssuePatch {
    IssuePatch {
        issue_title: non_empty(req.issue_title.as_deref()),
        issue_text: non_empty(req.issue_text.as_deref()),
        created_by: non_empty(req.created_by.as_deref()),
        assigned_to: non_empty(req.assigned_to.as_deref()),
        status_text: non_empty(req.status_text.as_deref()),
        open: req.open,
        updated_on: None,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_skips_empty_strings_but_keeps_open_false() {
        let req = UpdateIssueRequest {
            id: Some("5f6a7b8c9d0e1f2a3b4c5d6e".to_string()),
            issue_title: Some(String::new()),
            assigned_to: Some("Worker".to_string()),
            open: Some(false),
            ..UpdateIssueRequest::default()
        };

        let patch = build_patch(&req);
        assert_eq!(patch.issue_title, None);
        assert_eq!(patch.assigned_to.as_deref(), Some("Worker"));
        assert_eq!(patch.open, Some(false));
    }

    #[test]
    fn patch_of_only_empty_strings_is_empty() {
        let req = UpdateIssueRequest {
            id: Some("5f6a7b8c9d0e1f2a3b4c5d6e".to_string()),
            issue_title: Some(String::new()),
            status_text: Some(String::new()),
            ..UpdateIssueRequest::default()
        };

        assert!(build_patch(&req).is_empty());
    }

    #[test]
    fn malformed_body_decodes_to_defaults() {
        let req: UpdateIssueRequest = decode_body(&Bytes::from_static(b"not json"));
        assert!(req.id.is_none());
        assert!(req.open.is_none());

        let req: CreateIssueRequest = decode_body(&Bytes::from_static(b""));
        assert!(req.issue_title.is_none());
    }

    #[test]
    fn reply_bodies_use_the_wire_id_name() {
        let err = serde_json::to_value(ErrorBody::with_id(
            "could not update",
            "5f6a7b8c9d0e1f2a3b4c5d6e".to_string(),
        ))
        .unwrap();
        assert_eq!(err["error"], "could not update");
        assert_eq!(err["_id"], "5f6a7b8c9d0e1f2a3b4c5d6e");

        let plain = serde_json::to_value(ErrorBody::new("missing _id")).unwrap();
        assert_eq!(plain.as_object().unwrap().len(), 1, "no _id key when absent");

        let ok = serde_json::to_value(ResultBody {
            result: "successfully deleted",
            id: "5f6a7b8c9d0e1f2a3b4c5d6e".to_string(),
        })
        .unwrap();
        assert_eq!(ok["result"], "successfully deleted");
        assert_eq!(ok["_id"], "5f6a7b8c9d0e1f2a3b4c5d6e");
    }
}
