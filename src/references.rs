//! Reference and reply-id header splitting

use crate::types::{Reference, ReferenceList};
use regex::Regex;
use std::sync::LazyLock;

const SEPARATOR: char = '\u{0}';

static ADJACENT_IDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s*<").unwrap());

/// Split a references header into ordered message-id tokens
///
/// Malformed archives glue ids together (`<a@x><b@y>`), so every `>`/`<`
/// boundary is treated as a separator whether or not whitespace is present.
#[must_use]
pub fn parse_references(raw: &str) -> ReferenceList {
    let raw = raw.trim();
    let separated = ADJACENT_IDS.replace_all(raw, format!(">{SEPARATOR}<").as_str());
    let refs = separated
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Reference::new)
        .collect();

    ReferenceList {
        raw: raw.to_string(),
        refs,
    }
}
