//! Object-id generation for issues.
//!
//! Ids are 24 lowercase hex characters derived from a SHA-256 digest of the
//! draft's identifying fields. A nonce feeds the seed so callers can re-roll
//! on the (practically impossible) collision.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Length of a well-formed object id in characters.
pub const OBJECT_ID_LEN: usize = 24;

/// Generate a candidate object id for a new issue.
///
/// Seed inputs: `title | created_by | created_on (ns) | nonce`. The first
/// 12 digest bytes are hex-encoded, yielding 24 lowercase hex characters.
#[must_use]
pub fn object_id(title: &str, created_by: &str, created_on: DateTime<Utc>, nonce: u32) -> String {
    let seed = format!(
        "{}|{}|{}|{}",
        title,
        created_by,
        created_on.timestamp_nanos_opt().unwrap_or(0),
        nonce
    );

    let digest = Sha256::digest(seed.as_bytes());
    let mut id = String::with_capacity(OBJECT_ID_LEN);
    for byte in digest.iter().take(OBJECT_ID_LEN / 2) {
        use std::fmt::Write;
        let _ = write!(id, "{byte:02x}");
    }
    id
}

/// Check whether a string is structurally a valid object id.
///
/// Anything else is treated as "no such issue" by the store, never as an
/// error.
#[must_use]
pub fn is_valid_object_id(id: &str) -> bool {
    id.len() == OBJECT_ID_LEN && id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_valid() {
        let id = object_id("Test Issue", "Tester", Utc::now(), 0);
        assert_eq!(id.len(), OBJECT_ID_LEN);
        assert!(is_valid_object_id(&id));
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let now = Utc::now();
        let a = object_id("Title", "Tester", now, 0);
        let b = object_id("Title", "Tester", now, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn nonce_changes_the_id() {
        let now = Utc::now();
        let a = object_id("Title", "Tester", now, 0);
        let b = object_id("Title", "Tester", now, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn validation_accepts_canonical_ids() {
        assert!(is_valid_object_id("5f6a7b8c9d0e1f2a3b4c5d6e"));
        assert!(is_valid_object_id("000000000000000000000000"));
    }

    #[test]
    fn validation_rejects_malformed_ids() {
        assert!(!is_valid_object_id(""));
        assert!(!is_valid_object_id("not-a-real-id"));
        assert!(!is_valid_object_id("5f6a7b8c9d0e1f2a3b4c5d6")); // too short
        assert!(!is_valid_object_id("5f6a7b8c9d0e1f2a3b4c5d6ee")); // too long
        assert!(!is_valid_object_id("5F6A7B8C9D0E1F2A3B4C5D6E")); // uppercase
        assert!(!is_valid_object_id("5f6a7b8c9d0e1f2a3b4c5dzz")); // non-hex
    }
}
