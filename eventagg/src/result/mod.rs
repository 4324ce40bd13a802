//! Aggregation results: interval label -> group label -> value.

mod xml;

pub use xml::{from_xml, to_xml};

use crate::error::{AggregationError, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;

/// Occurrence count per category identifier.
pub type FrequencyTable = BTreeMap<String, u64>;

/// Value computed for one group of one interval.
///
/// Equality treats two NaN doubles (or two NaN floats) as equal, so results
/// survive an XML round trip unchanged.
#[derive(Debug, Clone)]
pub enum ResultValue {
    Integer(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    Date(DateTime<Utc>),
    Frequencies(FrequencyTable),
}

impl ResultValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ResultValue::Integer(_) => "integer",
            ResultValue::Long(_) => "long",
            ResultValue::Double(_) => "double",
            ResultValue::Float(_) => "float",
            ResultValue::Date(_) => "date",
            ResultValue::Frequencies(_) => "map",
        }
    }

    pub fn as_frequencies(&self) -> Option<&FrequencyTable> {
        match self {
            ResultValue::Frequencies(t) => Some(t),
            _ => None,
        }
    }
}

impl PartialEq for ResultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResultValue::Integer(a), ResultValue::Integer(b)) => a == b,
            (ResultValue::Long(a), ResultValue::Long(b)) => a == b,
            (ResultValue::Double(a), ResultValue::Double(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (ResultValue::Float(a), ResultValue::Float(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (ResultValue::Date(a), ResultValue::Date(b)) => a == b,
            (ResultValue::Frequencies(a), ResultValue::Frequencies(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultValue::Integer(v) => write!(f, "{}", v),
            ResultValue::Long(v) => write!(f, "{}", v),
            ResultValue::Double(v) => write!(f, "{}", v),
            ResultValue::Float(v) => write!(f, "{}", v),
            ResultValue::Date(v) => write!(f, "{}", v.to_rfc3339()),
            ResultValue::Frequencies(table) => {
                let mut first = true;
                for (identifier, count) in table {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", identifier, count)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

/// All group values of one interval.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationIntervalResult {
    interval_name: String,
    groups: IndexMap<String, ResultValue>,
}

impl AggregationIntervalResult {
    pub fn new(interval_name: impl Into<String>, groups: IndexMap<String, ResultValue>) -> Self {
        Self {
            interval_name: interval_name.into(),
            groups,
        }
    }

    pub fn interval_name(&self) -> &str {
        &self.interval_name
    }

    pub fn get(&self, group: &str) -> Option<&ResultValue> {
        self.groups.get(group)
    }

    pub fn groups(&self) -> &IndexMap<String, ResultValue> {
        &self.groups
    }

    /// Group values; can be iterated any number of times.
    pub fn values(&self) -> indexmap::map::Values<'_, String, ResultValue> {
        self.groups.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, ResultValue> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_parts(self) -> (String, IndexMap<String, ResultValue>) {
        (self.interval_name, self.groups)
    }
}

impl<'a> IntoIterator for &'a AggregationIntervalResult {
    type Item = (&'a String, &'a ResultValue);
    type IntoIter = indexmap::map::Iter<'a, String, ResultValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// The complete result of one aggregation run.
///
/// Equality ignores interval and group order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    intervals: IndexMap<String, IndexMap<String, ResultValue>>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an interval, replacing any earlier result with the same label.
    pub fn add(&mut self, result: AggregationIntervalResult) {
        let (name, groups) = result.into_parts();
        self.intervals.insert(name, groups);
    }

    pub fn interval_result(&self, label: &str) -> Result<AggregationIntervalResult> {
        self.intervals
            .get(label)
            .map(|groups| AggregationIntervalResult::new(label, groups.clone()))
            .ok_or_else(|| AggregationError::NoSuchInterval(label.to_string()))
    }

    /// One snapshot per interval. Every call starts a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = AggregationIntervalResult> + '_ {
        self.intervals
            .iter()
            .map(|(name, groups)| AggregationIntervalResult::new(name.clone(), groups.clone()))
    }

    /// Borrowing view of the nested maps.
    pub fn entries(&self) -> indexmap::map::Iter<'_, String, IndexMap<String, ResultValue>> {
        self.intervals.iter()
    }

    pub fn interval_names(&self) -> impl Iterator<Item = &str> {
        self.intervals.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn to_xml(&self) -> Result<String> {
        to_xml(self, 2)
    }

    pub fn from_xml(xml: &str) -> Result<Self> {
        from_xml(xml)
    }
}

impl FromIterator<AggregationIntervalResult> for Aggregation {
    fn from_iter<T: IntoIterator<Item = AggregationIntervalResult>>(iter: T) -> Self {
        let mut aggregation = Aggregation::new();
        for result in iter {
            aggregation.add(result);
        }
        aggregation
    }
}
