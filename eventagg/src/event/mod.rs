//! Monitoring events as seen by the aggregation engine.
//!
//! The engine never mutates events. An [`EventSource`] hands over a
//! materialized batch matching an [`EventTemplate`] and the pipeline only
//! reads from it.

mod source;
mod template;

pub use source::{EventSource, MemoryEventSource};
pub use template::EventTemplate;

use crate::aggregate::NumericValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Timestamp rendering shared by UDF dates and DATE frequency tables.
pub(crate) const SECOND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single monitoring event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub date_of_occurrence: DateTime<Utc>,
    pub code: String,
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_of_origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// User-defined fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub udfs: BTreeMap<String, UdfValue>,
}

impl Event {
    pub fn new(
        date_of_occurrence: DateTime<Utc>,
        code: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            date_of_occurrence,
            code: code.into(),
            level: level.into(),
            machine_of_origin: None,
            context: None,
            transaction_id: None,
            tags: Vec::new(),
            udfs: BTreeMap::new(),
        }
    }

    pub fn with_machine_of_origin(mut self, machine: impl Into<String>) -> Self {
        self.machine_of_origin = Some(machine.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_udf(mut self, key: impl Into<String>, value: UdfValue) -> Self {
        self.udfs.insert(key.into(), value);
        self
    }

    /// Look up a user-defined field by name.
    pub fn udf(&self, key: &str) -> Option<&UdfValue> {
        self.udfs.get(key)
    }
}

/// Dynamically typed value of a user-defined field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UdfValue {
    Integer(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    Text(String),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl UdfValue {
    /// The numeric view used by SUM/AVERAGE/MINIMUM/MAXIMUM, if any.
    pub fn as_numeric(&self) -> Option<NumericValue> {
        match self {
            UdfValue::Integer(v) => Some(NumericValue::Int(*v)),
            UdfValue::Long(v) => Some(NumericValue::Long(*v)),
            UdfValue::Double(v) => Some(NumericValue::Double(*v)),
            UdfValue::Float(v) => Some(NumericValue::Float(*v)),
            UdfValue::Text(_) | UdfValue::Boolean(_) | UdfValue::Date(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            UdfValue::Integer(_) => "int",
            UdfValue::Long(_) => "long",
            UdfValue::Double(_) => "double",
            UdfValue::Float(_) => "float",
            UdfValue::Text(_) => "text",
            UdfValue::Boolean(_) => "boolean",
            UdfValue::Date(_) => "date",
        }
    }
}

impl fmt::Display for UdfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UdfValue::Integer(v) => write!(f, "{}", v),
            UdfValue::Long(v) => write!(f, "{}", v),
            UdfValue::Double(v) => write!(f, "{}", v),
            UdfValue::Float(v) => write!(f, "{}", v),
            UdfValue::Text(v) => f.write_str(v),
            UdfValue::Boolean(v) => write!(f, "{}", v),
            UdfValue::Date(v) => write!(f, "{}", v.format(SECOND_FORMAT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_udf_display() {
        assert_eq!(UdfValue::Integer(7).to_string(), "7");
        assert_eq!(UdfValue::Double(2.5).to_string(), "2.5");
        assert_eq!(UdfValue::Text("eu-west".into()).to_string(), "eu-west");
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 1).unwrap();
        assert_eq!(UdfValue::Date(date).to_string(), "2024-03-09 08:05:01");
    }

    #[test]
    fn test_as_numeric() {
        assert_eq!(UdfValue::Long(9).as_numeric(), Some(NumericValue::Long(9)));
        assert_eq!(UdfValue::Boolean(true).as_numeric(), None);
    }

    #[test]
    fn test_event_json() {
        let json = r#"{
            "dateOfOccurrence": "2024-05-01T10:15:00Z",
            "code": "DISK_FULL",
            "level": "ERROR",
            "machineOfOrigin": "db-01",
            "tags": ["storage"],
            "udfs": { "freeBytes": { "type": "long", "value": 1024 } }
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.code, "DISK_FULL");
        assert_eq!(event.machine_of_origin.as_deref(), Some("db-01"));
        assert_eq!(event.udf("freeBytes"), Some(&UdfValue::Long(1024)));
        assert!(event.context.is_none());
    }
}
