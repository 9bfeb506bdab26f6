//! Column layout handed to the record sink

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Boolean,
    Record,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    Nullable,
    Repeated,
}

/// One column of the destination table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub mode: FieldMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<SchemaField>,
}

impl SchemaField {
    fn nullable(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            mode: FieldMode::Nullable,
            fields: Vec::new(),
        }
    }
}

const STRING_COLUMNS: [&str; 24] = [
    "raw_from_string",
    "from_name",
    "from_email",
    "raw_to_string",
    "to_name",
    "to_email",
    "raw_cc_string",
    "cc_name",
    "cc_email",
    "subject",
    "raw_date_string",
    "date",
    "message_id",
    "in_reply_to",
    "raw_refs_string",
    "body_text",
    "body_html",
    "body_image",
    "mailing_list",
    "filename",
    "original_url",
    "time_stamp",
    "content_type",
    "log",
];

/// Every column a normalized record can carry
#[must_use]
pub fn record_schema() -> Vec<SchemaField> {
    let mut schema: Vec<SchemaField> = STRING_COLUMNS
        .iter()
        .map(|name| SchemaField::nullable(name, FieldType::String))
        .collect();

    schema.push(SchemaField::nullable("flagged_abuse", FieldType::Boolean));
    schema.push(SchemaField {
        name: crate::types::REFS_FIELD.to_string(),
        field_type: FieldType::Record,
        mode: FieldMode::Repeated,
        fields: vec![SchemaField::nullable("ref", FieldType::String)],
    });
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refs_is_repeated_record() {
        let schema = record_schema();
        let refs = schema.iter().find(|f| f.name == "refs").unwrap();
        assert_eq!(refs.mode, FieldMode::Repeated);
        assert_eq!(refs.fields.len(), 1);
        assert_eq!(refs.fields[0].name, "ref");
    }

    #[test]
    fn test_serialized_shape() {
        let schema = record_schema();
        let flagged = schema.iter().find(|f| f.name == "flagged_abuse").unwrap();
        let json = serde_json::to_value(flagged).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "flagged_abuse", "type": "BOOLEAN", "mode": "NULLABLE"})
        );
    }

    #[test]
    fn test_names_unique() {
        let schema = record_schema();
        let mut names: Vec<&str> = schema.iter().map(|f| f.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), schema.len());
    }
}
