//! Field routing from parsed headers to a normalized record

use crate::contact::normalize_contact;
use crate::date::normalize_date;
use crate::references::parse_references;
use crate::types::{ContactRole, FieldValue, HeaderField, NormalizedRecord, RawValue};
use tracing::debug;

/// Canonical names kept by the generic handler
pub const ALLOWED_FIELDS: [&str; 19] = [
    "from",
    "subject",
    "date",
    "message_id",
    "in_reply_to",
    "references",
    "body_text",
    "body_html",
    "body_image",
    "mailing_list",
    "to",
    "cc",
    "raw_date_string",
    "log",
    "content_type",
    "filename",
    "time_stamp",
    "original_url",
    "flagged_abuse",
];

/// Canonical names dropped without a log line
pub const IGNORED_FIELDS: [&str; 4] = [
    "delivered_to",
    "received",
    "mime_version",
    "content_transfer_encoding",
];

/// Which normalizer a field is handed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Date,
    Contact(ContactRole),
    /// Reply target recovered from the body; an explicit `To:` wins
    BodyContact,
    References,
    Generic,
}

const ROLES: [(&str, Role); 7] = [
    ("date", Role::Date),
    ("from", Role::Contact(ContactRole::From)),
    ("author", Role::Contact(ContactRole::From)),
    ("to", Role::Contact(ContactRole::To)),
    ("cc", Role::Contact(ContactRole::Cc)),
    ("body_to", Role::BodyContact),
    ("references", Role::References),
];

impl Role {
    /// Role for a field, matching its name case-insensitively
    #[must_use]
    pub fn of(field: &HeaderField) -> Self {
        ROLES
            .iter()
            .find(|(name, _)| field.is(name))
            .map_or(Self::Generic, |(_, role)| *role)
    }
}

/// Lower-case and turn hyphens into underscores
#[must_use]
pub fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "_")
}

/// Fold an ordered field stream into one record
///
/// Empty values are skipped. Later fields overwrite earlier ones with the
/// same canonical name, so an `Author:` after `From:` decides the sender.
#[must_use]
pub fn assemble(fields: &[HeaderField]) -> NormalizedRecord {
    let mut record = NormalizedRecord::new();

    for field in fields.iter().filter(|f| !f.value.is_empty()) {
        match (Role::of(field), &field.value) {
            (Role::Date, RawValue::Text(raw)) => record.extend(normalize_date(raw)),
            (Role::Contact(role), RawValue::Text(raw)) => {
                record.extend(normalize_contact(role, raw));
            }
            (Role::BodyContact, RawValue::Text(raw)) => {
                if record.contains(ContactRole::To.raw_field()) {
                    debug!(body_to = %raw, "Keeping explicit To over body reply target");
                } else {
                    record.extend(normalize_contact(ContactRole::To, raw));
                }
            }
            (Role::References, RawValue::Text(raw)) => record.extend(parse_references(raw)),
            _ => handle_generic(&mut record, field),
        }
    }

    record
}

fn handle_generic(record: &mut NormalizedRecord, field: &HeaderField) {
    let name = canonical_name(&field.name);
    if IGNORED_FIELDS.contains(&name.as_str()) {
        return;
    }
    if !ALLOWED_FIELDS.contains(&name.as_str()) {
        debug!(field = %field.name, "Skipping field outside the allow list");
        return;
    }

    let value = match &field.value {
        RawValue::Text(text) => FieldValue::Text(text.trim().to_string()),
        RawValue::Flag(flag) => FieldValue::Flag(*flag),
    };
    record.insert(name, value);
}
