//! Validation helpers for `issue-tracker`.
//!
//! These routines enforce the issue field constraints and return structured
//! validation errors without mutating storage.

use crate::error::ValidationError;
use crate::model::IssueDraft;

/// Validates draft fields before an issue is persisted.
pub struct DraftValidator;

impl DraftValidator {
    /// Validate a draft and return all validation errors found.
    ///
    /// Required fields must be non-empty strings. A whitespace-only value is
    /// accepted; only the genuinely empty string counts as missing.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any required field is missing.
    pub fn validate(draft: &IssueDraft) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if draft.issue_title.is_empty() {
            errors.push(ValidationError::new("issue_title", "cannot be empty"));
        }
        if draft.issue_text.is_empty() {
            errors.push(ValidationError::new("issue_text", "cannot be empty"));
        }
        if draft.created_by.is_empty() {
            errors.push(ValidationError::new("created_by", "cannot be empty"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, text: &str, reporter: &str) -> IssueDraft {
        IssueDraft::new("apitest", title, text, reporter, None, None)
    }

    #[test]
    fn accepts_complete_draft() {
        assert!(DraftValidator::validate(&draft("Title", "Text", "Reporter")).is_ok());
    }

    #[test]
    fn rejects_empty_title() {
        let errors = DraftValidator::validate(&draft("", "Text", "Reporter")).unwrap_err();
        assert!(errors.iter().any(|err| err.field == "issue_title"));
    }

    #[test]
    fn collects_every_missing_field() {
        let errors = DraftValidator::validate(&draft("", "", "")).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|err| err.field.as_str()).collect();
        assert_eq!(fields, ["issue_title", "issue_text", "created_by"]);
    }

    #[test]
    fn whitespace_only_fields_are_accepted() {
        assert!(DraftValidator::validate(&draft(" ", "Text", "Reporter")).is_ok());
    }
}
