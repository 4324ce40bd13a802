//! Aggregation error type.

use thiserror::Error;

/// Every failure an aggregation run can produce.
///
/// All variants are terminal for the current run: nothing is retried and no
/// partial result is handed back.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("{target} is not a countable type for {reducer} aggregation")]
    NotCountable { reducer: String, target: String },

    #[error("UDF target requires an identification")]
    MissingIdentification,

    #[error("Event '{code}' has no UDF '{key}'")]
    MissingUdf { key: String, code: String },

    #[error("UDF '{key}' holds a {kind} value, expected int, long, double or float")]
    UnsupportedUdfType { key: String, kind: String },

    #[error("No such interval: {0}")]
    NoSuchInterval(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Invalid value '{value}' for parameter '{key}'")]
    InvalidParameter { key: String, value: String },

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Event at {found} occurs before preceding event at {previous}")]
    UnorderedInput { previous: String, found: String },

    #[error("Event source error: {0}")]
    Source(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AggregationError>;

impl AggregationError {
    /// Check if this is an interval lookup miss.
    pub fn is_no_such_interval(&self) -> bool {
        matches!(self, AggregationError::NoSuchInterval(_))
    }

    /// Check if this came out of the XML codec.
    pub fn is_xml(&self) -> bool {
        matches!(self, AggregationError::Xml(_))
    }

    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        AggregationError::Xml(err.to_string())
    }

    pub(crate) fn invalid_parameter(key: &str, value: &str) -> Self {
        AggregationError::InvalidParameter {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AggregationError::NotCountable {
            reducer: "SUM".to_string(),
            target: "LEVEL".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "LEVEL is not a countable type for SUM aggregation"
        );

        let err = AggregationError::NoSuchInterval("03.2024".to_string());
        assert_eq!(err.to_string(), "No such interval: 03.2024");

        let err = AggregationError::Config("Invalid UTC offset: 1500 minutes".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Invalid UTC offset: 1500 minutes"
        );
    }

    #[test]
    fn test_predicates() {
        assert!(AggregationError::NoSuchInterval("x".into()).is_no_such_interval());
        assert!(!AggregationError::MissingIdentification.is_no_such_interval());
        assert!(AggregationError::xml("bad tag").is_xml());
    }
}
