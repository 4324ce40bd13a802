//! Numeric kinds of UDF values and the per-kind accumulators used by the
//! SUM, AVERAGE, MINIMUM and MAXIMUM reducers.

use crate::result::ResultValue;

/// A UDF value that numeric reducers can fold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    Int(i32),
    Long(i64),
    Double(f64),
    Float(f32),
}

impl NumericValue {
    /// Divide by a (non-zero) count in the value's own arithmetic.
    ///
    /// Counts beyond the integer kind's range saturate to its maximum.
    pub fn div_count(self, count: usize) -> NumericValue {
        match self {
            NumericValue::Int(v) => {
                NumericValue::Int(v.wrapping_div(i32::try_from(count).unwrap_or(i32::MAX)))
            }
            NumericValue::Long(v) => {
                NumericValue::Long(v.wrapping_div(i64::try_from(count).unwrap_or(i64::MAX)))
            }
            NumericValue::Double(v) => NumericValue::Double(v / count as f64),
            NumericValue::Float(v) => NumericValue::Float(v / count as f32),
        }
    }
}

impl From<NumericValue> for ResultValue {
    fn from(value: NumericValue) -> Self {
        match value {
            NumericValue::Int(v) => ResultValue::Integer(v),
            NumericValue::Long(v) => ResultValue::Long(v),
            NumericValue::Double(v) => ResultValue::Double(v),
            NumericValue::Float(v) => ResultValue::Float(v),
        }
    }
}

/// How the accumulators combine values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    Sum,
    Min,
    Max,
}

/// One running accumulator per numeric kind.
///
/// Values only touch the accumulator of their own kind. Integer sums wrap
/// on overflow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accumulators {
    fold: Fold,
    pub int: i32,
    pub long: i64,
    pub double: f64,
    pub float: f32,
}

impl Accumulators {
    /// Seeded with 0 for sums, the kind's maximum for minimum and the kind's
    /// lowest value for maximum.
    pub fn new(fold: Fold) -> Self {
        match fold {
            Fold::Sum => Self {
                fold,
                int: 0,
                long: 0,
                double: 0.0,
                float: 0.0,
            },
            Fold::Min => Self {
                fold,
                int: i32::MAX,
                long: i64::MAX,
                double: f64::MAX,
                float: f32::MAX,
            },
            Fold::Max => Self {
                fold,
                int: i32::MIN,
                long: i64::MIN,
                double: f64::MIN,
                float: f32::MIN,
            },
        }
    }

    pub fn add(&mut self, value: NumericValue) {
        match (self.fold, value) {
            (Fold::Sum, NumericValue::Int(v)) => self.int = self.int.wrapping_add(v),
            (Fold::Sum, NumericValue::Long(v)) => self.long = self.long.wrapping_add(v),
            (Fold::Sum, NumericValue::Double(v)) => self.double += v,
            (Fold::Sum, NumericValue::Float(v)) => self.float += v,
            (Fold::Min, NumericValue::Int(v)) => self.int = self.int.min(v),
            (Fold::Min, NumericValue::Long(v)) => self.long = self.long.min(v),
            (Fold::Min, NumericValue::Double(v)) => self.double = self.double.min(v),
            (Fold::Min, NumericValue::Float(v)) => self.float = self.float.min(v),
            (Fold::Max, NumericValue::Int(v)) => self.int = self.int.max(v),
            (Fold::Max, NumericValue::Long(v)) => self.long = self.long.max(v),
            (Fold::Max, NumericValue::Double(v)) => self.double = self.double.max(v),
            (Fold::Max, NumericValue::Float(v)) => self.float = self.float.max(v),
        }
    }

    /// Pick the result kind: the first of double, float, long, int whose
    /// accumulator moved away from its seed. Int is the fallback.
    ///
    /// Selection looks at values, not at which kinds were seen, so a kind
    /// whose result happens to equal its seed (a double sum of exactly 0.0,
    /// a long minimum of `i64::MAX`) is reported as a lower-priority kind.
    pub fn select(&self) -> NumericValue {
        let seed = Self::new(self.fold);
        if self.double != seed.double {
            NumericValue::Double(self.double)
        } else if self.float != seed.float {
            NumericValue::Float(self.float)
        } else if self.long != seed.long {
            NumericValue::Long(self.long)
        } else {
            NumericValue::Int(self.int)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(f: Fold, values: &[NumericValue]) -> NumericValue {
        let mut acc = Accumulators::new(f);
        for v in values {
            acc.add(*v);
        }
        acc.select()
    }

    #[test]
    fn test_sum_ints() {
        let values = [
            NumericValue::Int(2),
            NumericValue::Int(4),
            NumericValue::Int(6),
        ];
        assert_eq!(fold(Fold::Sum, &values), NumericValue::Int(12));
    }

    #[test]
    fn test_priority_double_over_int() {
        let values = [NumericValue::Int(2), NumericValue::Double(0.5)];
        assert_eq!(fold(Fold::Sum, &values), NumericValue::Double(0.5));
    }

    #[test]
    fn test_priority_float_over_long() {
        let values = [NumericValue::Long(10), NumericValue::Float(1.5)];
        assert_eq!(fold(Fold::Max, &values), NumericValue::Float(1.5));
    }

    #[test]
    fn test_value_equal_to_seed_falls_through() {
        // A double sum of exactly zero is indistinguishable from "no doubles".
        let values = [
            NumericValue::Double(1.0),
            NumericValue::Double(-1.0),
            NumericValue::Int(3),
        ];
        assert_eq!(fold(Fold::Sum, &values), NumericValue::Int(3));

        let values = [NumericValue::Long(i64::MAX)];
        assert_eq!(fold(Fold::Min, &values), NumericValue::Int(i32::MAX));
    }

    #[test]
    fn test_min_max() {
        let values = [
            NumericValue::Long(7),
            NumericValue::Long(-3),
            NumericValue::Long(5),
        ];
        assert_eq!(fold(Fold::Min, &values), NumericValue::Long(-3));
        assert_eq!(fold(Fold::Max, &values), NumericValue::Long(7));
    }

    #[test]
    fn test_empty_selects_int_seed() {
        assert_eq!(fold(Fold::Sum, &[]), NumericValue::Int(0));
        assert_eq!(fold(Fold::Max, &[]), NumericValue::Int(i32::MIN));
    }

    #[test]
    fn test_int_sum_wraps() {
        let values = [NumericValue::Int(i32::MAX), NumericValue::Int(1)];
        assert_eq!(fold(Fold::Sum, &values), NumericValue::Int(i32::MIN));
    }

    #[test]
    fn test_div_count() {
        assert_eq!(NumericValue::Int(12).div_count(3), NumericValue::Int(4));
        assert_eq!(NumericValue::Long(7).div_count(2), NumericValue::Long(3));
        assert_eq!(
            NumericValue::Double(7.0).div_count(2),
            NumericValue::Double(3.5)
        );
    }

    #[test]
    fn test_div_count_beyond_integer_range() {
        let int = NumericValue::Int(i32::MAX).div_count(usize::MAX);
        let long = NumericValue::Long(i64::MAX).div_count(usize::MAX);
        assert_eq!(int, NumericValue::Int(0));
        assert_eq!(long, NumericValue::Long(0));
    }
}
