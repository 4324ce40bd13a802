use super::{fold_udf, mean_date, NumericTarget};
use crate::aggregate::{Fold, GroupReducer};
use crate::error::Result;
use crate::event::Event;
use crate::group::Group;
use crate::result::ResultValue;

/// SUM: numeric total of a UDF. Dates cannot be added up, so a DATE sum
/// reports the mean timestamp.
#[derive(Debug, Clone)]
pub struct SumReducer {
    target: NumericTarget,
}

impl SumReducer {
    pub fn new(target: NumericTarget) -> Self {
        Self { target }
    }
}

impl GroupReducer for SumReducer {
    fn name(&self) -> &str {
        "sum"
    }

    fn reduce(&self, group: &Group<Event>) -> Result<ResultValue> {
        match &self.target {
            NumericTarget::Date => Ok(ResultValue::Date(mean_date(group))),
            NumericTarget::Udf(key) => Ok(fold_udf(group, key, Fold::Sum)?.select().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::metric::test_support::{dated, group_of};
    use crate::error::AggregationError;
    use crate::event::UdfValue;

    fn sum(group: &Group<Event>) -> Result<ResultValue> {
        SumReducer::new(NumericTarget::Udf("x".into())).reduce(group)
    }

    #[test]
    fn test_sum_longs() {
        let group = group_of(vec![UdfValue::Long(5_000_000_000), UdfValue::Long(1)]);
        assert_eq!(sum(&group).unwrap(), ResultValue::Long(5_000_000_001));
    }

    #[test]
    fn test_sum_mixed_kinds_reports_double() {
        let group = group_of(vec![UdfValue::Integer(3), UdfValue::Double(0.25)]);
        assert_eq!(sum(&group).unwrap(), ResultValue::Double(0.25));
    }

    #[test]
    fn test_sum_rejects_text() {
        let group = group_of(vec![UdfValue::Integer(3), UdfValue::Text("3".into())]);
        match sum(&group).unwrap_err() {
            AggregationError::UnsupportedUdfType { kind, .. } => assert_eq!(kind, "text"),
            other => panic!("Expected UnsupportedUdfType, got {:?}", other),
        }
    }

    #[test]
    fn test_sum_of_dates_is_mean() {
        let group = dated(&[10, 20, 31]);
        let value = SumReducer::new(NumericTarget::Date).reduce(&group).unwrap();
        match value {
            ResultValue::Date(d) => assert_eq!(d.timestamp_millis(), 20_333),
            other => panic!("Expected Date value, got {:?}", other),
        }
    }
}
