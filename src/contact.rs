//! Contact header splitting into display name and address

use crate::types::{ContactRecord, ContactRole};
use mailparse::MailAddr;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static PARENTHESIZED_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*([a-z0-9._%+-]+@[a-z0-9.-]+)\s*\)").unwrap()
});

/// Split a raw contact string for the given role
///
/// The raw string is kept as is. Name and address are recovered from a
/// lower-cased copy; whichever slot holds the `@` becomes the address, and
/// anything that could not be recovered is left out.
#[must_use]
pub fn normalize_contact(role: ContactRole, raw: &str) -> ContactRecord {
    let prepared = prepare(raw);
    let (name, email) = split_address(&prepared);
    let (name, email) = if name.contains('@') && !email.contains('@') {
        (email, name)
    } else {
        (name, email)
    };

    let name = non_empty(&name);
    let email = non_empty(&email);
    if name.is_none() && email.is_none() {
        debug!(?role, raw, "No name or address recovered from contact");
    }

    ContactRecord {
        role,
        raw: raw.to_string(),
        name,
        email,
    }
}

/// Lower-case, undo ` at ` obfuscation, and give the address extractor an
/// angle-bracket shape to work with
fn prepare(raw: &str) -> String {
    let lower = raw.trim().to_lowercase().replace(" at ", "@");
    let mut prepared = PARENTHESIZED_ADDRESS
        .replace_all(&lower, "<$1>")
        .into_owned();
    if !prepared.contains('@') {
        prepared.push_str("<>");
    }
    prepared
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim().trim_matches('"').trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `(name, address)` of the first address in the list
fn split_address(prepared: &str) -> (String, String) {
    let address = first_address(strip_group_label(prepared));
    let (outside, comment) = take_comment(address);

    if let Some((name, email)) = parse_with_mailparse(&outside) {
        return (name.unwrap_or(comment), email);
    }

    match (outside.find('<'), outside.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            let name = format!("{} {}", &outside[..open], &outside[close + 1..]);
            let name = if name.trim().is_empty() { comment } else { name };
            (name, outside[open + 1..close].to_string())
        }
        _ => (comment, outside.trim().to_string()),
    }
}

/// Angle-bracket or bare addresses through the standard list parser
fn parse_with_mailparse(address: &str) -> Option<(Option<String>, String)> {
    let list = mailparse::addrparse(address.trim()).ok()?;
    let single = list.iter().find_map(|addr| match addr {
        MailAddr::Single(info) => Some(info.clone()),
        MailAddr::Group(group) => group.addrs.first().cloned(),
    })?;
    if single.addr.is_empty()
        || single.addr.contains(char::is_whitespace)
        || single.addr.contains('<')
    {
        return None;
    }
    Some((single.display_name, single.addr))
}

/// Drop a leading `label:` that comes before any address syntax
fn strip_group_label(prepared: &str) -> &str {
    let syntax = prepared.find(['<', '@', '"', '(']).unwrap_or(prepared.len());
    match prepared[..syntax].find(':') {
        Some(colon) => &prepared[colon + 1..],
        None => prepared,
    }
}

/// Everything up to the first comma outside quotes, brackets and comments
fn first_address(list: &str) -> &str {
    let mut quoted = false;
    let mut depth = 0usize;
    for (at, c) in list.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '<' | '(' if !quoted => depth += 1,
            '>' | ')' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => return &list[..at],
            _ => {}
        }
    }
    list.trim_end_matches(';')
}

/// Split off the first `( ... )` comment, returning the rest and the comment
fn take_comment(address: &str) -> (String, String) {
    let Some(open) = address.find('(') else {
        return (address.to_string(), String::new());
    };
    let close = address[open..]
        .find(')')
        .map_or(address.len(), |at| open + at);
    let comment = address[open + 1..close].to_string();
    let rest = format!(
        "{}{}",
        &address[..open],
        address.get(close + 1..).unwrap_or_default()
    );
    (rest, comment)
}
