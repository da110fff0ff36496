use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Fields = BTreeMap<String, FieldValue>;

pub(crate) const TIMESTAMP_RANK: i64 = 3;

/// A single field value of a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    /// Write-time marker; the store replaces it with its own clock reading.
    ServerTimestamp,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            FieldValue::Float(value) if value.is_finite() => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    /// Cross-type order: null, bool, number, timestamp, string.
    pub(crate) fn type_rank(&self) -> i64 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Integer(_) | FieldValue::Float(_) => 2,
            FieldValue::Timestamp(_) => TIMESTAMP_RANK,
            FieldValue::String(_) => 4,
            FieldValue::ServerTimestamp => 5,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// A stored document: an opaque id plus its field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn string_or_default(&self, field: &str) -> String {
        self.get(field)
            .and_then(FieldValue::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Opaque position of the last document of a fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub(crate) value: FieldValue,
    pub(crate) id: String,
}

impl PageCursor {
    pub(crate) fn at(doc: &Document, order_field: &str) -> Option<Self> {
        doc.get(order_field).map(|value| Self {
            value: value.clone(),
            id: doc.id.clone(),
        })
    }

    pub fn document_id(&self) -> &str {
        &self.id
    }
}

/// Result of a paged query.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub documents: Vec<Document>,
    /// Points at the last document of `documents`.
    pub cursor: Option<PageCursor>,
}

/// One delivery of a live view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_json_keeps_timestamps_exact() {
        let stamp = Utc::now();
        let value = FieldValue::Timestamp(stamp);
        let json = serde_json::to_string(&value).unwrap();
        let back: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_timestamp(), Some(stamp));
    }
}
