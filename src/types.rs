//! Core types flowing through the ingestion pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Canonical timestamp layout for resolved dates
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name of the non-nullable reference list field
pub const REFS_FIELD: &str = "refs";

/// How an archive object lays out its messages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// Plain text dump where messages are glued with a literal `/n` marker
    FlatText,
    /// Gzipped unix mailbox with `From ` sender lines
    CompressedUnixMailbox,
}

impl SourceFormat {
    /// Map a declared content type onto a source format
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let lower = content_type.to_lowercase();
        if lower.contains("text/plain") {
            Some(Self::FlatText)
        } else if lower.contains("application/x-gzip")
            || lower.contains("application/gzip")
            || lower.contains("application/x-gzip-compressed")
        {
            Some(Self::CompressedUnixMailbox)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FlatText => "flat-text",
            Self::CompressedUnixMailbox => "compressed-unix-mailbox",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive content as handed over by the object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
}

impl Payload {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(bytes) => bytes.len(),
            Self::Text(text) => text.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One archive object, tagged with the format derived from its content type
#[derive(Debug, Clone)]
pub struct RawArchiveBlob {
    pub format: SourceFormat,
    pub payload: Payload,
}

impl RawArchiveBlob {
    pub fn new(format: SourceFormat, payload: Payload) -> Self {
        Self { format, payload }
    }
}

/// Raw text of one candidate message, header block plus body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSegment(Vec<u8>);

impl MessageSegment {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Segment text, replacing any byte run that is not UTF-8
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<String> for MessageSegment {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&str> for MessageSegment {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

/// Value attached to a parsed or synthetic header field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Flag(bool),
}

impl RawValue {
    /// Empty text and `false` flags are skipped by the assembler
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Flag(flag) => !flag,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Flag(_) => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// An ordered `(name, value)` pair, name case preserved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: String,
    pub value: RawValue,
}

impl HeaderField {
    pub fn new(name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name comparison
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// One reference-id token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reference {
    #[serde(rename = "ref")]
    pub id: String,
}

impl Reference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Value stored in a normalized record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Refs(Vec<Reference>),
}

impl FieldValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Anything a specialised normalizer produces that lands in a record
pub trait IntoFields {
    fn into_fields(self) -> Vec<(&'static str, FieldValue)>;
}

/// Canonical field name to value, always carrying `refs`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct NormalizedRecord(BTreeMap<String, FieldValue>);

impl Default for NormalizedRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizedRecord {
    #[must_use]
    pub fn new() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(REFS_FIELD.to_string(), FieldValue::Refs(Vec::new()));
        Self(fields)
    }

    /// Later values for the same field replace earlier ones
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn extend(&mut self, fields: impl IntoFields) {
        for (name, value) in fields.into_fields() {
            self.insert(name, value);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn refs(&self) -> &[Reference] {
        match self.0.get(REFS_FIELD) {
            Some(FieldValue::Refs(refs)) => refs,
            _ => &[],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A raw date string plus the instant it resolved to, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseResult {
    pub raw: String,
    pub resolved: Option<DateTime<Utc>>,
}

impl DateParseResult {
    /// `YYYY-MM-DD HH:MM:SS` in UTC
    #[must_use]
    pub fn canonical(&self) -> Option<String> {
        self.resolved
            .map(|instant| instant.format(CANONICAL_DATE_FORMAT).to_string())
    }
}

impl IntoFields for DateParseResult {
    fn into_fields(self) -> Vec<(&'static str, FieldValue)> {
        let canonical = self.canonical();
        let mut fields = vec![("raw_date_string", FieldValue::Text(self.raw))];
        if let Some(date) = canonical {
            fields.push(("date", FieldValue::Text(date)));
        }
        fields
    }
}

/// The record slot a contact is written to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContactRole {
    From,
    To,
    Cc,
}

impl ContactRole {
    #[must_use]
    pub const fn raw_field(self) -> &'static str {
        match self {
            Self::From => "raw_from_string",
            Self::To => "raw_to_string",
            Self::Cc => "raw_cc_string",
        }
    }

    #[must_use]
    pub const fn name_field(self) -> &'static str {
        match self {
            Self::From => "from_name",
            Self::To => "to_name",
            Self::Cc => "cc_name",
        }
    }

    #[must_use]
    pub const fn email_field(self) -> &'static str {
        match self {
            Self::From => "from_email",
            Self::To => "to_email",
            Self::Cc => "cc_email",
        }
    }
}

/// A contact header split into display name and address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub role: ContactRole,
    pub raw: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl IntoFields for ContactRecord {
    fn into_fields(self) -> Vec<(&'static str, FieldValue)> {
        let mut fields = vec![(self.role.raw_field(), FieldValue::Text(self.raw))];
        if let Some(name) = self.name {
            fields.push((self.role.name_field(), FieldValue::Text(name)));
        }
        if let Some(email) = self.email {
            fields.push((self.role.email_field(), FieldValue::Text(email)));
        }
        fields
    }
}

/// Ordered reference tokens plus the trimmed header they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceList {
    pub raw: String,
    pub refs: Vec<Reference>,
}

impl IntoFields for ReferenceList {
    fn into_fields(self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("raw_refs_string", FieldValue::Text(self.raw)),
            (REFS_FIELD, FieldValue::Refs(self.refs)),
        ]
    }
}
