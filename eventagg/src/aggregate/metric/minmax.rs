use super::{fold_udf, NumericTarget};
use crate::aggregate::{Fold, GroupReducer};
use crate::error::Result;
use crate::event::Event;
use crate::group::Group;
use crate::result::ResultValue;
use chrono::{DateTime, Utc};

/// MINIMUM / MAXIMUM of a UDF, or the earliest / latest event date.
#[derive(Debug, Clone)]
pub struct MinMaxReducer {
    target: NumericTarget,
    is_min: bool,
}

impl MinMaxReducer {
    pub fn min(target: NumericTarget) -> Self {
        Self {
            target,
            is_min: true,
        }
    }

    pub fn max(target: NumericTarget) -> Self {
        Self {
            target,
            is_min: false,
        }
    }

    fn extreme_date(&self, group: &Group<Event>) -> DateTime<Utc> {
        let dates = group.iter().map(|e| e.date_of_occurrence);
        let found = if self.is_min {
            dates.min()
        } else {
            dates.max()
        };
        found.unwrap_or_default()
    }
}

impl GroupReducer for MinMaxReducer {
    fn name(&self) -> &str {
        if self.is_min {
            "minimum"
        } else {
            "maximum"
        }
    }

    fn reduce(&self, group: &Group<Event>) -> Result<ResultValue> {
        match &self.target {
            NumericTarget::Date => Ok(ResultValue::Date(self.extreme_date(group))),
            NumericTarget::Udf(key) => {
                let fold = if self.is_min { Fold::Min } else { Fold::Max };
                Ok(fold_udf(group, key, fold)?.select().into())
            }
        }
    }
}
