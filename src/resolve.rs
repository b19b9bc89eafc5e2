//! Change-URL resolution.
//!
//! Gerrit instances expose several URL shapes for the same change:
//!
//! - `https://gerrit-review.googlesource.com/c/project/+/12345`
//! - `https://gerrit.example.com/c/group/project/+/12345/`
//! - `https://gerrit.example.com/#/c/12345/` (legacy web UI)
//!
//! Resolution tries the structured forms first and only then falls back
//! to scanning path segments for a bare change number. The fallback scans
//! from the end of the path, so the rightmost all-digit segment wins.

use crate::error::ResolveError;
use crate::types::ChangeRef;
use regex::Regex;
use std::sync::LazyLock;

/// Modern path form: `/c/<project...>/+/<number>` followed by a query or
/// fragment marker, a path separator, or end of string. Project names may
/// contain slashes (nested groups).
static MODERN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/c/(?:[^/]+/)*\+/(\d+)(?:[?&#]|$|/)").expect("valid pattern"));

/// Legacy web-UI form: `#/c/<number>` anywhere in the string.
static LEGACY_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#/c/(\d+)").expect("valid pattern"));

/// Extracts the change identifier from a Gerrit change URL.
///
/// Structured forms (modern path, legacy fragment) take precedence over
/// the numeric-suffix fallback, which could otherwise pick up an
/// unrelated number earlier in the path.
///
/// # Errors
///
/// Returns [`ResolveError::NoChangeId`] when no strategy yields a change
/// number, naming the offending input.
pub fn resolve(input: &str) -> Result<ChangeRef, ResolveError> {
    if let Some(caps) = MODERN_URL.captures(input) {
        return Ok(ChangeRef::new(&caps[1]));
    }

    if let Some(caps) = LEGACY_URL.captures(input) {
        return Ok(ChangeRef::new(&caps[1]));
    }

    // Last resort: rightmost path segment that is entirely digits.
    let trimmed = input.strip_suffix('/').unwrap_or(input);
    for segment in trimmed.rsplit('/') {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(ChangeRef::new(segment));
        }
    }

    Err(ResolveError::NoChangeId {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(input: &str) -> String {
        resolve(input).expect("should resolve").to_string()
    }

    #[test]
    fn test_modern_url() {
        assert_eq!(ok("https://gerrit-review.googlesource.com/c/project/+/12345"), "12345");
        assert_eq!(ok("https://gerrit.example.com/c/project/+/67890/"), "67890");
    }

    #[test]
    fn test_modern_url_nested_project() {
        assert_eq!(ok("https://gerrit.example.com/c/group/sub/project/+/4242"), "4242");
    }

    #[test]
    fn test_modern_url_query_and_fragment() {
        assert_eq!(ok("https://gerrit.example.com/c/project/+/111?tab=comments"), "111");
        assert_eq!(ok("https://gerrit.example.com/c/project/+/222#message-abc"), "222");
        assert_eq!(ok("https://gerrit.example.com/c/project/+/333/2/src/main.rs"), "333");
    }

    #[test]
    fn test_legacy_url() {
        assert_eq!(ok("https://gerrit.example.com/#/c/98765/"), "98765");
        assert_eq!(ok("https://gerrit.example.com/#/c/98765"), "98765");
    }

    #[test]
    fn test_modern_wins_over_legacy() {
        // Both forms present: the modern path form is matched first.
        assert_eq!(ok("https://gerrit.example.com/c/project/+/111#/c/222"), "111");
    }

    #[test]
    fn test_fallback_trailing_number() {
        assert_eq!(ok("https://gerrit.example.com/12345"), "12345");
        assert_eq!(ok("https://gerrit.example.com/12345/"), "12345");
        assert_eq!(ok("12345"), "12345");
    }

    #[test]
    fn test_fallback_rightmost_segment_wins() {
        // Unrelated numbers earlier in the path lose to the rightmost one.
        assert_eq!(ok("https://gerrit.example.com/v2/changes/777"), "777");
    }

    #[test]
    fn test_fallback_ignores_mixed_segments() {
        // `abc123def` is not a pure-digit segment; the later one matches.
        assert_eq!(ok("https://gerrit.example.com/abc123def/456"), "456");
    }

    #[test]
    fn test_fallback_can_match_non_change_urls() {
        // Inherent to the strategy: a trailing version number resolves too.
        assert_eq!(ok("https://example.com/product/3000"), "3000");
    }

    #[test]
    fn test_empty_string_fails() {
        let err = resolve("").unwrap_err();
        assert_eq!(err, ResolveError::NoChangeId { input: String::new() });
    }

    #[test]
    fn test_no_digits_fails() {
        let err = resolve("https://gerrit.example.com/c/project").unwrap_err();
        assert!(err.to_string().contains("https://gerrit.example.com/c/project"));
    }

    #[test]
    fn test_digits_inside_word_only_fails() {
        assert!(resolve("https://gerrit.example.com/abc123def").is_err());
    }
}
