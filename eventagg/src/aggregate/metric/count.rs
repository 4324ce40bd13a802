use crate::aggregate::{AggregationTarget, GroupReducer, TargetType};
use crate::error::{AggregationError, Result};
use crate::event::{Event, SECOND_FORMAT};
use crate::group::Group;
use crate::result::{FrequencyTable, ResultValue};

/// Categorical attribute a frequency table is keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Category {
    Level,
    MachineOfOrigin,
    Date,
    Udf(String),
}

/// COUNT: the sub-group size for EVENTS, a frequency table for every
/// categorical target.
#[derive(Debug, Clone)]
pub struct CountReducer {
    category: Option<Category>,
    no_entry: String,
}

impl CountReducer {
    pub fn new(target: &AggregationTarget, no_entry: impl Into<String>) -> Result<Self> {
        let category = match target.target_type {
            TargetType::Events => None,
            TargetType::Level => Some(Category::Level),
            TargetType::MachineOfOrigin => Some(Category::MachineOfOrigin),
            TargetType::Date => Some(Category::Date),
            TargetType::Udf => Some(Category::Udf(target.udf_key()?.to_string())),
        };
        Ok(Self {
            category,
            no_entry: no_entry.into(),
        })
    }

    fn key_of(&self, category: &Category, event: &Event) -> Result<String> {
        Ok(match category {
            Category::Level => event.level.clone(),
            Category::MachineOfOrigin => event
                .machine_of_origin
                .clone()
                .unwrap_or_else(|| self.no_entry.clone()),
            Category::Date => event.date_of_occurrence.format(SECOND_FORMAT).to_string(),
            Category::Udf(key) => event
                .udf(key)
                .ok_or_else(|| AggregationError::MissingUdf {
                    key: key.clone(),
                    code: event.code.clone(),
                })?
                .to_string(),
        })
    }
}

impl GroupReducer for CountReducer {
    fn name(&self) -> &str {
        "count"
    }

    fn reduce(&self, group: &Group<Event>) -> Result<ResultValue> {
        let Some(category) = &self.category else {
            return Ok(ResultValue::Integer(i32::try_from(group.len()).unwrap_or(i32::MAX)));
        };

        let mut table = FrequencyTable::new();
        for event in group {
            *table.entry(self.key_of(category, event)?).or_insert(0) += 1;
        }
        Ok(ResultValue::Frequencies(table))
    }
}
