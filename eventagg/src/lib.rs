//! Time-bucketed event aggregation.
//!
//! A run takes the events matched by a template and streams them through
//! three stages:
//!
//! 1. [`IntervalGrouper`] buckets events by calendar period (hour, day, ISO
//!    week, month, quarter, year).
//! 2. [`GroupByGrouper`] splits every bucket by a categorical attribute.
//! 3. [`Aggregator`] reduces every sub-group to one value (count, sum,
//!    average, minimum, maximum).
//!
//! The outcome is an [`Aggregation`] keyed by interval label and group label,
//! which has an XML wire format. [`AggregationCommand`] wires the stages and
//! encodes itself as flat query parameters.
//!
//! ```no_run
//! use eventagg::{
//!     AggregationCommand, AggregationTarget, AggregationType, EngineConfig, EventTemplate,
//!     GroupBy, Interval, MemoryEventSource,
//! };
//!
//! # fn main() -> eventagg::Result<()> {
//! let source = MemoryEventSource::new(Vec::new());
//! let command = AggregationCommand::new(
//!     AggregationType::Count,
//!     EventTemplate::any().with_level("ERROR"),
//!     AggregationTarget::events(),
//!     Interval::Days,
//!     GroupBy::Code,
//! );
//! let aggregation = command.run(&source, &EngineConfig::default())?;
//! println!("{}", aggregation.to_xml()?);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod group;
pub mod interval;
pub mod result;
pub mod telemetry;

pub use aggregate::{AggregationTarget, AggregationType, Aggregator, GroupReducer, TargetType};
pub use command::AggregationCommand;
pub use config::EngineConfig;
pub use error::{AggregationError, Result};
pub use event::{Event, EventSource, EventTemplate, MemoryEventSource, UdfValue};
pub use group::{Group, GroupBy, GroupByGrouper};
pub use interval::{InputOrder, Interval, IntervalGrouper};
pub use result::{Aggregation, AggregationIntervalResult, FrequencyTable, ResultValue};
