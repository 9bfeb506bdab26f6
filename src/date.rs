//! Date header resolution
//!
//! Archive dates come from decades of mail clients: missing zones, spelled
//! out zone names, three-digit offsets, trailing commentary. Resolution is an
//! ordered list of pure stages, each `(&str) -> Option<DateTime>`; the first
//! stage that yields a date wins and the rest are never tried.
//!
//! 1. RFC 2822 through chrono, then the free-form formats of `dateparser`,
//!    with a trailing zone abbreviation looked up in the extended table.
//! 2. Offset repair: keep a four digit offset, widen a short one
//!    (`-050` becomes `-0500`, `-5` becomes `-0500`), or sign a bare `0000`,
//!    then parse up to and including the offset.
//! 3. Drop a trailing parenthetical such as `(Pacific Standard Time)`.
//! 4. Drop a trailing bare word that is not a known zone.
//! 5. Fuzzy parse: keep the tokens that look like date parts, drop the rest.
//!    The zone table is not consulted here.
//!
//! Dates without any zone information are read as UTC.

use crate::timezones::zone_offset;
use crate::types::DateParseResult;
use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::{debug, warn};

type Stage = fn(&str) -> Option<DateTime<FixedOffset>>;

const STAGES: [(&str, Stage); 5] = [
    ("free-form", parse_free_form),
    ("offset repair", parse_with_repaired_offset),
    ("parenthetical", parse_without_parenthetical),
    ("trailing word", parse_without_trailing_word),
    ("fuzzy", parse_fuzzy),
];

/// Unsigned trailing groups read as a positive offset
const IMPLICIT_POSITIVE_OFFSETS: [&str; 2] = ["0000", "0100"];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static FULL_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" [-+]\d{4}(?:\D|$)").unwrap());

static SHORT_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" [-+](\d{1,3})(?:\D|$)").unwrap());

static THROUGH_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.* [-+]\d{4})").unwrap());

static BEFORE_PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\(.*\)").unwrap());

static BEFORE_TRAILING_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*) [a-zA-Z]+$").unwrap());

static LEADING_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?(?:,\s*|\s+)").unwrap()
});

static MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{2,4})\b").unwrap()
});

static TRAILING_ZONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s([A-Za-z]{2,5})$").unwrap());

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:\d{1,4}|\d{1,2}:\d{2}(?::\d{2})?|\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}|[ap]\.?m\.?)$",
    )
    .unwrap()
});

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2})(?:st|nd|rd|th)$").unwrap());

static MERIDIEM_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?(?::(\d{2}))?\s*([ap])\.?m\b\.?").unwrap()
});

/// Resolve a raw date header, always keeping the trimmed original
#[must_use]
pub fn normalize_date(raw: &str) -> DateParseResult {
    let raw = raw.trim().to_string();
    let resolved = resolve(&raw);
    if resolved.is_none() {
        warn!(raw = %raw, "Failed to resolve date with any strategy");
    }
    DateParseResult { raw, resolved }
}

/// Run the stage chain and convert the first hit to UTC
#[must_use]
pub fn resolve(raw: &str) -> Option<DateTime<Utc>> {
    STAGES.iter().find_map(|(name, stage)| match stage(raw) {
        Some(date) => {
            debug!(stage = name, raw, "Resolved date");
            Some(date.with_timezone(&Utc))
        }
        None => {
            debug!(stage = name, raw, "Date stage did not match");
            None
        }
    })
}

fn parse_free_form(raw: &str) -> Option<DateTime<FixedOffset>> {
    parse_with_zones(raw)
}

fn parse_with_repaired_offset(raw: &str) -> Option<DateTime<FixedOffset>> {
    let repaired = repair_offset(raw.trim())?;
    let through_offset = THROUGH_OFFSET.captures(&repaired)?.get(1)?.as_str();
    parse_with_zones(through_offset)
}

fn parse_without_parenthetical(raw: &str) -> Option<DateTime<FixedOffset>> {
    let remainder = BEFORE_PARENTHETICAL.captures(raw)?.get(1)?.as_str();
    parse_with_zones(remainder)
}

fn parse_without_trailing_word(raw: &str) -> Option<DateTime<FixedOffset>> {
    let remainder = BEFORE_TRAILING_WORD.captures(raw.trim())?.get(1)?.as_str();
    parse_with_zones(remainder)
}

/// Keep only the tokens that look like date parts and hand them to `dateparser`
fn parse_fuzzy(raw: &str) -> Option<DateTime<FixedOffset>> {
    let kept = raw
        .split_whitespace()
        .map(|token| token.trim_matches([',', ';', '(', ')']))
        .filter_map(|token| {
            if let Some(caps) = ORDINAL.captures(token) {
                return caps.get(1).map(|day| day.as_str());
            }
            if is_month(token) {
                return Some(token.trim_end_matches('.'));
            }
            DATE_TOKEN.is_match(token).then_some(token)
        })
        .collect::<Vec<_>>();
    if kept.is_empty() {
        return None;
    }

    let candidate = twenty_four_hour(&kept.join(" ")).into_owned();
    debug!(raw, candidate = %candidate, "Fuzzy date candidate");
    parse_naive_utc(&candidate)
}

/// Parse one candidate string: RFC 2822 first, then the formats `dateparser` knows
///
/// A leading weekday is dropped without checking it against the date. A
/// trailing zone abbreviation from the extended table becomes its numeric
/// offset.
fn parse_with_zones(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();
    let input = LEADING_WEEKDAY.find(input).map_or(input, |m| &input[m.end()..]);
    let input = day_first(input);
    let input = numeric_zone(&input);

    DateTime::parse_from_rfc2822(&input)
        .ok()
        .or_else(|| parse_naive_utc(&input))
}

/// `dateparser` with zone-less input read as UTC and a missing time as midnight
fn parse_naive_utc(input: &str) -> Option<DateTime<FixedOffset>> {
    dateparser::parse_with(input, &Utc, NaiveTime::MIN)
        .ok()
        .map(|date| date.fixed_offset())
}

/// `July 2 1928 ...` becomes `2 Jul 1928 ...`
fn day_first(input: &str) -> Cow<'_, str> {
    let Some(caps) = MONTH_FIRST.captures(input) else {
        return Cow::Borrowed(input);
    };
    if !is_month(&caps[1]) {
        return Cow::Borrowed(input);
    }
    let rest = caps.get(0).map_or("", |m| &input[m.end()..]);
    Cow::Owned(format!("{} {} {}{rest}", &caps[2], &caps[1][..3], &caps[3]))
}

fn numeric_zone(input: &str) -> Cow<'_, str> {
    let Some(zone) = TRAILING_ZONE.captures(input).and_then(|caps| caps.get(1)) else {
        return Cow::Borrowed(input);
    };
    match zone_offset(zone.as_str()) {
        Some(offset) => Cow::Owned(format!(
            "{}{}",
            &input[..zone.start()],
            format_offset(offset)
        )),
        None => Cow::Borrowed(input),
    }
}

/// Seconds east of UTC as `±HHMM`
fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let seconds = seconds.unsigned_abs();
    format!("{sign}{:02}{:02}", seconds / 3600, seconds % 3600 / 60)
}

/// `3 pm` becomes `15:00`, `12:30 am` becomes `00:30`
fn twenty_four_hour(input: &str) -> Cow<'_, str> {
    MERIDIEM_TIME.replace_all(input, |caps: &Captures| {
        let hour: u32 = caps[1].parse().unwrap_or(0) % 12;
        let hour = if caps[4].eq_ignore_ascii_case("p") {
            hour + 12
        } else {
            hour
        };
        let minute = caps.get(2).map_or("00", |m| m.as_str());
        match caps.get(3) {
            Some(second) => format!("{hour:02}:{minute}:{}", second.as_str()),
            None => format!("{hour:02}:{minute}"),
        }
    })
}

/// Full month names and their three-letter abbreviations
fn is_month(word: &str) -> bool {
    let lower = word.trim_end_matches('.').to_ascii_lowercase();
    MONTHS
        .iter()
        .any(|month| *month == lower || (lower.len() == 3 && month.starts_with(&lower)))
}

/// Bring a malformed numeric offset into `±HHMM` form
fn repair_offset(raw: &str) -> Option<Cow<'_, str>> {
    if FULL_OFFSET.is_match(raw) {
        return Some(Cow::Borrowed(raw));
    }

    if let Some(digits) = SHORT_OFFSET.captures(raw).and_then(|caps| caps.get(1)) {
        let widened = if digits.len() == 3 {
            format!("{}0", digits.as_str())
        } else {
            format!("{:0>2}00", digits.as_str())
        };
        let mut repaired = String::with_capacity(raw.len() + 2);
        repaired.push_str(&raw[..digits.start()]);
        repaired.push_str(&widened);
        repaired.push_str(&raw[digits.end()..]);
        return Some(Cow::Owned(repaired));
    }

    let last = raw.split_whitespace().last()?;
    if IMPLICIT_POSITIVE_OFFSETS.contains(&last) {
        let at = raw.len() - last.len();
        return Some(Cow::Owned(format!("{}+{last}", &raw[..at])));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(raw: &str) -> Option<String> {
        normalize_date(raw).canonical()
    }

    #[test]
    fn test_standard_formats() {
        assert_eq!(
            canonical("Sat, 6 Aug 1965 22:11:18 -0800").as_deref(),
            Some("1965-08-07 06:11:18")
        );
        assert_eq!(
            canonical("15 Oct 2000 19:52:16 +0200").as_deref(),
            Some("2000-10-15 17:52:16")
        );
        assert_eq!(
            canonical("6 Nov 2006 11:11:19 -0800").as_deref(),
            Some("2006-11-06 19:11:19")
        );
        assert_eq!(
            canonical("Mon, July 2 1928 13:46:03 +0100").as_deref(),
            Some("1928-07-02 12:46:03")
        );
    }

    #[test]
    fn test_zone_names_from_table() {
        assert_eq!(
            canonical("Wed, 25 Oct 2006 19:21:24 CST").as_deref(),
            Some("2006-10-26 01:21:24")
        );
        assert_eq!(
            canonical("25 May 2006 03:11:24 EDT").as_deref(),
            Some("2006-05-25 07:11:24")
        );
        assert_eq!(
            canonical("Sat, 1 Apr 2000 12:00:00 -0500 CDT").as_deref(),
            Some("2000-04-01 17:00:00")
        );
    }

    #[test]
    fn test_short_offset_is_widened() {
        assert_eq!(
            canonical("Sun, 05 Nov 2000 19:04:06 -050").as_deref(),
            Some("2000-11-06 00:04:06")
        );
        assert_eq!(
            repair_offset("Sun, 05 Nov 2000 19:04:06 -050").as_deref(),
            Some("Sun, 05 Nov 2000 19:04:06 -0500")
        );
    }

    #[test]
    fn test_unsigned_zero_offset() {
        assert_eq!(
            canonical("Sun, 05 Nov 2000 19:04:06  0000").as_deref(),
            Some("2000-11-05 19:04:06")
        );
    }

    #[test]
    fn test_trailing_parenthetical() {
        assert_eq!(
            canonical("Tue, 13 Feb 2001 08:17:03 +0100 (MET)").as_deref(),
            Some("2001-02-13 07:17:03")
        );
        assert_eq!(
            canonical("Fri, 26 May 2000 09:17:50 +0200 (MET DST)").as_deref(),
            Some("2000-05-26 07:17:50")
        );
        assert_eq!(
            canonical("Fri, 8 Dec 2000 09:37:24 -0800 (Pacific Standard Time)").as_deref(),
            Some("2000-12-08 17:37:24")
        );
        assert_eq!(
            canonical("Fri, 15 Dec 2000 16:53:48 +0200 (GMT-2)").as_deref(),
            Some("2000-12-15 14:53:48")
        );
        assert_eq!(
            canonical("Tue, 13 Feb 2001 08:17:03 (MET)").as_deref(),
            Some("2001-02-13 08:17:03")
        );
    }

    #[test]
    fn test_unknown_trailing_word() {
        assert_eq!(
            canonical("Mon, 3 Jan 2000 10:00:00 Eastern").as_deref(),
            Some("2000-01-03 10:00:00")
        );
    }

    #[test]
    fn test_fuzzy_fallback() {
        assert_eq!(
            canonical("Date:Sat, 7 Nov 2020 around 10:15 pm").as_deref(),
            Some("2020-11-07 22:15:00")
        );
        assert_eq!(
            canonical("Thursday 5 Nov 2020 at 3 pm").as_deref(),
            Some("2020-11-05 15:00:00")
        );
    }

    #[test]
    fn test_fuzzy_ignores_words_that_spell_zones() {
        assert_eq!(
            canonical("sent a note on 7 Nov 2020 10:15").as_deref(),
            Some("2020-11-07 10:15:00")
        );
    }

    #[test]
    fn test_weekday_is_not_checked() {
        assert_eq!(
            canonical("Mon, 6 Aug 1965 22:11:18 -0800").as_deref(),
            Some("1965-08-07 06:11:18")
        );
    }

    #[test]
    fn test_iso_timestamp() {
        assert_eq!(
            canonical("2000-11-06T00:04:06Z").as_deref(),
            Some("2000-11-06 00:04:06")
        );
    }

    #[test]
    fn test_canonical_output_is_a_fixed_point() {
        let first = canonical("Sun, 05 Nov 2000 19:04:06 -050").unwrap();
        assert_eq!(canonical(&first).as_deref(), Some(first.as_str()));
    }

    #[test]
    fn test_unresolvable_keeps_raw() {
        let result = normalize_date("  sometime last week  ");
        assert_eq!(result.raw, "sometime last week");
        assert!(result.resolved.is_none());
    }

    #[test]
    fn test_zone_swap_and_rewrites() {
        assert_eq!(numeric_zone("1 Jan 2000 00:00:00 NPT"), "1 Jan 2000 00:00:00 +0545");
        assert_eq!(numeric_zone("1 Jan 2000 00:00:00 NST"), "1 Jan 2000 00:00:00 -0330");
        assert_eq!(numeric_zone("1 Jan 2000 00:00:00 est"), "1 Jan 2000 00:00:00 est");
        assert_eq!(day_first("July 2 1928 13:46:03 +0100"), "2 Jul 1928 13:46:03 +0100");
        assert_eq!(twenty_four_hour("5 Nov 2020 12:30 am"), "5 Nov 2020 00:30");
    }
}
