mod avg;
mod count;
mod minmax;
mod sum;

pub use avg::AverageReducer;
pub use count::CountReducer;
pub use minmax::MinMaxReducer;
pub use sum::SumReducer;

use super::{Accumulators, Fold, NumericValue};
use crate::error::{AggregationError, Result};
use crate::event::Event;
use crate::group::Group;
use chrono::{DateTime, Utc};

/// Target of a numeric reducer: event dates or a named UDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericTarget {
    Date,
    Udf(String),
}

/// Numeric value of `key` on `event`.
fn numeric_udf(event: &Event, key: &str) -> Result<NumericValue> {
    let value = event.udf(key).ok_or_else(|| AggregationError::MissingUdf {
        key: key.to_string(),
        code: event.code.clone(),
    })?;
    value
        .as_numeric()
        .ok_or_else(|| AggregationError::UnsupportedUdfType {
            key: key.to_string(),
            kind: value.kind_name().to_string(),
        })
}

/// Fold the UDF `key` of every event in the group.
fn fold_udf(group: &Group<Event>, key: &str, fold: Fold) -> Result<Accumulators> {
    let mut acc = Accumulators::new(fold);
    for event in group {
        acc.add(numeric_udf(event, key)?);
    }
    Ok(acc)
}

/// Integer-truncated mean of the event timestamps. An empty group counts as
/// one event at the epoch.
fn mean_date(group: &Group<Event>) -> DateTime<Utc> {
    let total: i128 = group
        .iter()
        .map(|e| i128::from(e.date_of_occurrence.timestamp_millis()))
        .sum();
    let count = group.len().max(1) as i128;
    i64::try_from(total / count)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}
