//! Field Naming
//!
//! Wire names for proto fields come from one of two places:
//! - The struct tag's primary value (`json:"user_id,omitempty"` -> `user_id`)
//! - A snake_case transform of the declared member name
//!
//! A tag value of exactly `-` removes the field from the schema.

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Snake Case
// =============================================================================

static LOWER_UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
static ACRONYM_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([A-Z])([A-Z][a-z])").unwrap());

/// Convert a camelCase / PascalCase identifier to snake_case.
///
/// Acronym runs stay together: `HTTPRequest` -> `http_request`.
pub fn to_snake_case(s: &str) -> String {
    // "camelCase" -> "camel_Case"
    let s = LOWER_UPPER.replace_all(s, "${1}_${2}");
    // "HTTPClient" -> "HTTP_Client"
    let s = ACRONYM_WORD.replace_all(&s, "${1}_${2}");
    s.to_lowercase()
}

// =============================================================================
// Struct Tags
// =============================================================================

static TAG_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*):"((?:[^"\\]|\\.)*)""#).unwrap());

/// What a struct tag says about a field's wire name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagName {
    /// No usable name in the tag; fall back to the member name
    Default,
    /// Field is excluded (`-`)
    Skip,
    /// Explicit wire name
    Rename(String),
}

/// Extract the wire name from a raw struct tag.
///
/// With `key` set, only that key's value is used; otherwise the first
/// `key:"value"` pair wins. Modifiers after the first `,` are ignored.
pub fn parse_tag(raw: Option<&str>, key: Option<&str>) -> TagName {
    let Some(raw) = raw else {
        return TagName::Default;
    };
    let raw = raw.trim().trim_matches('`');

    let value = TAG_PAIR
        .captures_iter(raw)
        .find(|caps| key.map_or(true, |k| &caps[1] == k))
        .map(|caps| caps[2].to_string());

    let Some(value) = value else {
        return TagName::Default;
    };

    let primary = value.split(',').next().unwrap_or("").trim();
    match primary {
        "" => TagName::Default,
        "-" => TagName::Skip,
        name => TagName::Rename(name.to_string()),
    }
}

/// Wire name for a member, or `None` if the tag excludes it
pub fn wire_name(member_name: &str, tag: Option<&str>, key: Option<&str>) -> Option<String> {
    match parse_tag(tag, key) {
        TagName::Skip => None,
        TagName::Rename(name) => Some(name),
        TagName::Default => Some(to_snake_case(member_name)),
    }
}
