use super::{fold_udf, mean_date, NumericTarget};
use crate::aggregate::{Fold, GroupReducer};
use crate::error::Result;
use crate::event::Event;
use crate::group::Group;
use crate::result::ResultValue;

/// AVERAGE: the winning sum divided by the number of events, in the
/// winning kind's arithmetic (integer kinds truncate).
#[derive(Debug, Clone)]
pub struct AverageReducer {
    target: NumericTarget,
}

impl AverageReducer {
    pub fn new(target: NumericTarget) -> Self {
        Self { target }
    }
}

impl GroupReducer for AverageReducer {
    fn name(&self) -> &str {
        "average"
    }

    fn reduce(&self, group: &Group<Event>) -> Result<ResultValue> {
        match &self.target {
            NumericTarget::Date => Ok(ResultValue::Date(mean_date(group))),
            NumericTarget::Udf(key) => {
                let sum = fold_udf(group, key, Fold::Sum)?.select();
                // an empty group divides by one
                Ok(sum.div_count(group.len().max(1)).into())
            }
        }
    }
}
