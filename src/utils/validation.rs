//! Field validators for link input, usable from `#[validate(custom(...))]`.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use url::Url;
use validator::ValidationError;

/// Allowed characters of a short URL slug.
static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*[A-Za-z0-9]$").unwrap());

const SLUG_MIN_LEN: usize = 3;
const SLUG_MAX_LEN: usize = 50;

/// Slugs that would shadow API routes.
const RESERVED_SLUGS: &[&str] = &["api", "health", "users", "links"];

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Validates a short URL slug.
///
/// # Rules
///
/// - Length: 3-50 characters
/// - Letters, digits, `-` and `_`, starting and ending with a letter or digit
/// - Not a reserved route name (case-insensitive)
pub fn validate_short_url(slug: &str) -> Result<(), ValidationError> {
    if slug.len() < SLUG_MIN_LEN || slug.len() > SLUG_MAX_LEN {
        return Err(error("length", "Short URL must be 3-50 characters"));
    }

    if !SLUG_REGEX.is_match(slug) {
        return Err(error(
            "slug",
            "Short URL may only contain letters, digits, hyphens and underscores",
        ));
    }

    if RESERVED_SLUGS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(slug))
    {
        return Err(error("reserved", "This short URL is reserved"));
    }

    Ok(())
}

/// Validates the redirect target of a link: an absolute `http`/`https` URL with a host.
///
/// Rejects `javascript:`, `data:`, `file:` and other schemes.
pub fn validate_long_url(value: &str) -> Result<(), ValidationError> {
    let url = Url::parse(value).map_err(|_| error("url", "Invalid URL format"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(error("scheme", "Only HTTP and HTTPS URLs are allowed"));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(error("host", "URL must have a host"));
    }

    Ok(())
}
