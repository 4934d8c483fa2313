//! Input validation for short aliases and long URLs.
//!
//! These checks run before anything reaches a storage backend.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::error::StoreError;

/// Aliases that collide with control endpoints and can never be stored.
pub const RESERVED_ALIASES: &[&str] = &["create", "delete", "healthz"];

/// Longest alias in bytes. Fits every backend's key limit (LMDB: 511).
pub const MAX_SHORT_LEN: usize = 255;

static SIMPLE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-zA-Z_\-]+$").expect("static pattern compiles")
});

/// Returns true if `short` consists only of letters, digits, `_` and `-`.
pub fn is_simple_token(short: &str) -> bool {
    SIMPLE_TOKEN.is_match(short)
}

pub fn is_reserved(short: &str) -> bool {
    RESERVED_ALIASES.contains(&short)
}

/// Checks that `short` can be used as a key for writes and deletes.
///
/// # Errors
///
/// Returns [`StoreError::InvalidValue`] for non-token, reserved or overlong
/// aliases.
pub fn validate_short(short: &str) -> Result<(), StoreError> {
    if short.len() > MAX_SHORT_LEN || !is_simple_token(short) || is_reserved(short) {
        return Err(StoreError::InvalidValue(short.to_string()));
    }
    Ok(())
}

/// Normalizes a long URL, prefixing `http://` when no HTTP scheme is present.
///
/// A URL holding control characters is returned in its parsed,
/// percent-encoded form so it stays usable as a `Location` header.
///
/// # Errors
///
/// - [`StoreError::Empty`] for an empty string
/// - [`StoreError::InvalidValue`] if the result is not an absolute URL with a host
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_long("pigeon.com").unwrap(), "http://pigeon.com");
/// assert!(normalize_long("").is_err());
/// ```
pub fn normalize_long(long: &str) -> Result<String, StoreError> {
    let long = long.trim();
    if long.is_empty() {
        return Err(StoreError::Empty);
    }

    let candidate = if long.starts_with("http://") || long.starts_with("https://") {
        long.to_string()
    } else {
        format!("http://{long}")
    };

    match Url::parse(&candidate) {
        Ok(url) if url.has_host() => {
            if candidate.chars().any(char::is_control) {
                Ok(url.into())
            } else {
                Ok(candidate)
            }
        }
        _ => Err(StoreError::InvalidValue(long.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokens() {
        assert!(is_simple_token("miserable"));
        assert!(is_simple_token("go-links_2"));
        assert!(is_simple_token("ABC123"));
    }

    #[test]
    fn test_rejects_non_tokens() {
        assert!(!is_simple_token(""));
        assert!(!is_simple_token("has space"));
        assert!(!is_simple_token("a/b"));
        assert!(!is_simple_token("dot.dot"));
        assert!(!is_simple_token("ünï"));
    }

    #[test]
    fn test_validate_short_rejects_reserved() {
        for &reserved in RESERVED_ALIASES {
            assert_eq!(
                validate_short(reserved),
                Err(StoreError::InvalidValue(reserved.to_string())),
                "reserved alias '{}' should be rejected",
                reserved
            );
        }
        assert!(validate_short("pigeon").is_ok());
    }

    #[test]
    fn test_normalize_long_prefixes_scheme() {
        assert_eq!(normalize_long("pigeon.com").unwrap(), "http://pigeon.com");
        assert_eq!(
            normalize_long("https://pigeon.com/a?b=c").unwrap(),
            "https://pigeon.com/a?b=c"
        );
        assert_eq!(normalize_long("http://x.org").unwrap(), "http://x.org");
    }

    #[test]
    fn test_normalize_long_encodes_control_characters() {
        assert_eq!(
            normalize_long("http://x.org/a\u{1}b").unwrap(),
            "http://x.org/a%01b"
        );
        assert_eq!(normalize_long("x.org/a\u{7f}").unwrap(), "http://x.org/a%7F");
        // Embedded tabs and newlines are dropped by the parser.
        assert_eq!(normalize_long("http://x.org/a\tb").unwrap(), "http://x.org/ab");
    }

    #[test]
    fn test_validate_short_length_limit() {
        let longest = "a".repeat(MAX_SHORT_LEN);
        assert!(validate_short(&longest).is_ok());

        let overlong = "a".repeat(MAX_SHORT_LEN + 1);
        assert_eq!(
            validate_short(&overlong),
            Err(StoreError::InvalidValue(overlong.clone()))
        );
    }

    #[test]
    fn test_normalize_long_empty() {
        assert_eq!(normalize_long(""), Err(StoreError::Empty));
        assert_eq!(normalize_long("   "), Err(StoreError::Empty));
    }

    #[test]
    fn test_normalize_long_invalid() {
        assert!(matches!(
            normalize_long("http://"),
            Err(StoreError::InvalidValue(_))
        ));
        assert!(matches!(
            normalize_long("exa mple.com"),
            Err(StoreError::InvalidValue(_))
        ));
    }
}
