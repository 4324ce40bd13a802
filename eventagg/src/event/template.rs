use super::Event;
use crate::error::{AggregationError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const CODE: &str = "code";
const LEVEL: &str = "level";
const MACHINE_OF_ORIGIN: &str = "machineOfOrigin";
const CONTEXT: &str = "context";
const TRANSACTION_ID: &str = "transactionId";
const TAG: &str = "tag";
const FROM: &str = "from";
const TO: &str = "to";

/// A partially populated event used as a match filter.
///
/// Every field that is set must match; unset fields match anything. The
/// occurrence window is half-open: `from <= date < to`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplate {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub machine_of_origin: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl EventTemplate {
    /// Template matching every event.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
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
        self.tag = Some(tag.into());
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        fn field_matches(expected: &Option<String>, actual: Option<&str>) -> bool {
            expected.as_deref().map_or(true, |e| actual == Some(e))
        }

        field_matches(&self.code, Some(&event.code))
            && field_matches(&self.level, Some(&event.level))
            && field_matches(&self.machine_of_origin, event.machine_of_origin.as_deref())
            && field_matches(&self.context, event.context.as_deref())
            && field_matches(&self.transaction_id, event.transaction_id.as_deref())
            && self
                .tag
                .as_ref()
                .map_or(true, |t| event.tags.iter().any(|et| et == t))
            && self.from.map_or(true, |f| event.date_of_occurrence >= f)
            && self.to.map_or(true, |t| event.date_of_occurrence < t)
    }

    /// Encode the set fields as query parameters. Dates are epoch millis.
    pub fn to_query_parameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        let strings = [
            (CODE, &self.code),
            (LEVEL, &self.level),
            (MACHINE_OF_ORIGIN, &self.machine_of_origin),
            (CONTEXT, &self.context),
            (TRANSACTION_ID, &self.transaction_id),
            (TAG, &self.tag),
        ];
        for (key, value) in strings {
            if let Some(v) = value {
                params.insert(key.to_string(), v.clone());
            }
        }
        if let Some(from) = self.from {
            params.insert(FROM.to_string(), from.timestamp_millis().to_string());
        }
        if let Some(to) = self.to {
            params.insert(TO.to_string(), to.timestamp_millis().to_string());
        }
        params
    }

    /// Rebuild a template from query parameters. Keys that are not template
    /// fields are ignored.
    pub fn from_query_parameters(params: &BTreeMap<String, String>) -> Result<Self> {
        let string = |key: &str| params.get(key).cloned();
        Ok(Self {
            code: string(CODE),
            level: string(LEVEL),
            machine_of_origin: string(MACHINE_OF_ORIGIN),
            context: string(CONTEXT),
            transaction_id: string(TRANSACTION_ID),
            tag: string(TAG),
            from: parse_millis(params, FROM)?,
            to: parse_millis(params, TO)?,
        })
    }
}

fn parse_millis(params: &BTreeMap<String, String>, key: &str) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = params.get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(Some)
        .ok_or_else(|| AggregationError::invalid_parameter(key, raw))
}
