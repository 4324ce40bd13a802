//! Reduction of categorical sub-groups to result values.
//!
//! A [`GroupReducer`] turns one sub-group into one [`ResultValue`]. Which
//! reducer runs is decided once, up front, by [`reducer_for`]: incompatible
//! reducer/target combinations fail there, before any event is looked at.

mod metric;
mod numeric;

pub use metric::{AverageReducer, CountReducer, MinMaxReducer, NumericTarget, SumReducer};
pub use numeric::{Accumulators, Fold, NumericValue};

use crate::error::{AggregationError, Result};
use crate::event::Event;
use crate::group::Group;
use crate::result::{Aggregation, AggregationIntervalResult, ResultValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;

/// Reduction semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationType {
    Count,
    Sum,
    Average,
    Maximum,
    Minimum,
}

impl AggregationType {
    pub const ALL: [AggregationType; 5] = [
        AggregationType::Count,
        AggregationType::Sum,
        AggregationType::Average,
        AggregationType::Maximum,
        AggregationType::Minimum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Count => "COUNT",
            AggregationType::Sum => "SUM",
            AggregationType::Average => "AVERAGE",
            AggregationType::Maximum => "MAXIMUM",
            AggregationType::Minimum => "MINIMUM",
        }
    }

    pub fn parse_type(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == upper)
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event attribute being aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Events,
    Date,
    Level,
    Udf,
    MachineOfOrigin,
}

impl TargetType {
    pub const ALL: [TargetType; 5] = [
        TargetType::Events,
        TargetType::Date,
        TargetType::Level,
        TargetType::Udf,
        TargetType::MachineOfOrigin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Events => "EVENTS",
            TargetType::Date => "DATE",
            TargetType::Level => "LEVEL",
            TargetType::Udf => "UDF",
            TargetType::MachineOfOrigin => "MACHINE_OF_ORIGIN",
        }
    }

    pub fn parse_target(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == upper)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to aggregate. `identification` names the UDF key and is ignored for
/// every other target type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregationTarget {
    #[serde(rename = "type")]
    pub target_type: TargetType,
    #[serde(default)]
    pub identification: Option<String>,
}

impl AggregationTarget {
    pub fn new(target_type: TargetType, identification: Option<String>) -> Self {
        Self {
            target_type,
            identification,
        }
    }

    pub fn events() -> Self {
        Self::new(TargetType::Events, None)
    }

    pub fn date() -> Self {
        Self::new(TargetType::Date, None)
    }

    pub fn level() -> Self {
        Self::new(TargetType::Level, None)
    }

    pub fn machine_of_origin() -> Self {
        Self::new(TargetType::MachineOfOrigin, None)
    }

    pub fn udf(key: impl Into<String>) -> Self {
        Self::new(TargetType::Udf, Some(key.into()))
    }

    /// The UDF key, required when the target is a UDF.
    pub fn udf_key(&self) -> Result<&str> {
        match self.identification.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(AggregationError::MissingIdentification),
        }
    }
}

/// Reduces one categorical sub-group to its result value.
pub trait GroupReducer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn reduce(&self, group: &Group<Event>) -> Result<ResultValue>;
}

/// Pick the reducer for a reducer/target combination.
///
/// Fails with `NotCountable` for SUM/AVERAGE/MINIMUM/MAXIMUM over EVENTS,
/// LEVEL or MACHINE_OF_ORIGIN and with `MissingIdentification` for a UDF
/// target without a key.
pub fn reducer_for(
    aggregation_type: AggregationType,
    target: &AggregationTarget,
    no_entry: &str,
) -> Result<Box<dyn GroupReducer>> {
    let reducer: Box<dyn GroupReducer> = match aggregation_type {
        AggregationType::Count => Box::new(CountReducer::new(target, no_entry)?),
        AggregationType::Sum => {
            Box::new(SumReducer::new(numeric_target(aggregation_type, target)?))
        }
        AggregationType::Average => {
            Box::new(AverageReducer::new(numeric_target(aggregation_type, target)?))
        }
        AggregationType::Minimum => {
            Box::new(MinMaxReducer::min(numeric_target(aggregation_type, target)?))
        }
        AggregationType::Maximum => {
            Box::new(MinMaxReducer::max(numeric_target(aggregation_type, target)?))
        }
    };
    Ok(reducer)
}

fn numeric_target(
    aggregation_type: AggregationType,
    target: &AggregationTarget,
) -> Result<NumericTarget> {
    match target.target_type {
        TargetType::Date => Ok(NumericTarget::Date),
        TargetType::Udf => Ok(NumericTarget::Udf(target.udf_key()?.to_string())),
        TargetType::Events | TargetType::Level | TargetType::MachineOfOrigin => {
            Err(AggregationError::NotCountable {
                reducer: aggregation_type.to_string(),
                target: target.target_type.to_string(),
            })
        }
    }
}

/// Final pipeline stage: one [`AggregationIntervalResult`] per sub-grouped
/// interval bucket.
///
/// The first reduction error is yielded once and ends the iteration.
#[derive(Debug)]
pub struct Aggregator<I> {
    inner: I,
    reducer: Box<dyn GroupReducer>,
    failed: bool,
}

impl<I> Aggregator<I>
where
    I: Iterator<Item = Group<Group<Event>>>,
{
    pub fn new(
        inner: I,
        aggregation_type: AggregationType,
        target: &AggregationTarget,
        no_entry: &str,
    ) -> Result<Self> {
        Ok(Self::with_reducer(inner, reducer_for(aggregation_type, target, no_entry)?))
    }

    pub fn with_reducer(inner: I, reducer: Box<dyn GroupReducer>) -> Self {
        Self {
            inner,
            reducer,
            failed: false,
        }
    }

    pub fn reducer_name(&self) -> &str {
        self.reducer.name()
    }

    /// Drain every remaining interval into an [`Aggregation`].
    pub fn into_aggregation(mut self) -> Result<Aggregation> {
        self.try_fold(Aggregation::new(), |mut aggregation, interval| {
            aggregation.add(interval?);
            Ok(aggregation)
        })
    }
}

impl<I> Iterator for Aggregator<I>
where
    I: Iterator<Item = Group<Group<Event>>>,
{
    type Item = Result<AggregationIntervalResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let bucket = self.inner.next()?;

        let mut groups = IndexMap::with_capacity(bucket.len());
        for subgroup in &bucket {
            match self.reducer.reduce(subgroup) {
                Ok(value) => {
                    groups.insert(subgroup.identifier.clone(), value);
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }

        Some(Ok(AggregationIntervalResult::new(bucket.identifier, groups)))
    }
}

impl<I: FusedIterator<Item = Group<Group<Event>>>> FusedIterator for Aggregator<I> {}
