// src/validation/mod.rs

//! UUID validation and normalization for pack identifiers
//!
//! Pack UUIDs are accepted in mixed case, with or without dashes, and are
//! normalized to lowercase 8-4-4-4-12 form before any comparison, storage,
//! or display truncation.

use regex::Regex;
use std::sync::LazyLock;

/// Number of UUID characters used for human-readable short forms
pub const UUID_SHORT_LEN: usize = 8;

static UUID_DASHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

static UUID_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{32}$").unwrap());

/// Check whether a string is a structurally valid pack UUID.
///
/// Accepts the dashed 8-4-4-4-12 form and the undashed 32-hex form, in any
/// case. Partial dashing or wrong-position dashes are rejected.
pub fn is_valid_uuid(uuid: &str) -> bool {
    UUID_DASHED.is_match(uuid) || UUID_PLAIN.is_match(uuid)
}

/// Normalize a UUID to lowercase with dashes.
///
/// Idempotent; returns the input unchanged when it is not 32 hex characters
/// after dash removal (callers validate separately).
pub fn normalize_uuid(uuid: &str) -> String {
    let clean: String = uuid.chars().filter(|c| *c != '-').collect();
    let clean = clean.to_lowercase();

    if clean.len() == 32 {
        format!(
            "{}-{}-{}-{}-{}",
            &clean[..8],
            &clean[8..12],
            &clean[12..16],
            &clean[16..20],
            &clean[20..]
        )
    } else {
        uuid.to_string()
    }
}

/// Bounds-checked short prefix of a UUID for display and directory names.
pub fn short_uuid(uuid: &str) -> &str {
    if uuid.len() >= UUID_SHORT_LEN {
        &uuid[..UUID_SHORT_LEN]
    } else {
        uuid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_uuids() {
        assert!(is_valid_uuid("12345678-1234-1234-1234-123456789abc"));
        assert!(is_valid_uuid("123456781234123412341234567890ab"));
        assert!(is_valid_uuid("12345678-1234-1234-1234-123456789ABC"));
        assert!(is_valid_uuid("ABCDEF01-2345-6789-ABCD-EF0123456789"));
    }

    #[test]
    fn test_invalid_uuids() {
        assert!(!is_valid_uuid(""));
        assert!(!is_valid_uuid("12345678-1234-1234-1234-123456789ab"));
        assert!(!is_valid_uuid("12345678-1234-1234-1234-123456789abcd"));
        assert!(!is_valid_uuid("12345678-1234-1234-1234-123456789abg"));
        assert!(!is_valid_uuid("12345678-12341234-1234-123456789abc"));
        assert!(!is_valid_uuid("123456781-234-1234-1234-123456789abc"));
        assert!(!is_valid_uuid("not-a-uuid-at-all"));
        assert!(!is_valid_uuid("12345678123412341234123456789012345"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize_uuid("12345678-1234-1234-1234-123456789ABC"),
            "12345678-1234-1234-1234-123456789abc"
        );
        assert_eq!(
            normalize_uuid("123456781234123412341234567890AB"),
            "12345678-1234-1234-1234-1234567890ab"
        );
        assert_eq!(
            normalize_uuid("AbCdEf01-2345-6789-AbCd-Ef0123456789"),
            "abcdef01-2345-6789-abcd-ef0123456789"
        );
        // Not a UUID shape: returned as-is
        assert_eq!(normalize_uuid("too-short"), "too-short");
        assert_eq!(normalize_uuid(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_uuid("ABCDEF01-2345-6789-ABCD-EF0123456789");
        assert_eq!(normalize_uuid(&once), once);
    }

    #[test]
    fn test_short_uuid_bounds() {
        assert_eq!(short_uuid("12345678-1234-1234-1234-123456789abc"), "12345678");
        assert_eq!(short_uuid("1234"), "1234");
        assert_eq!(short_uuid(""), "");
    }
}
