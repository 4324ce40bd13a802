//! Aggregation commands: wiring of the three pipeline stages and the flat
//! query-parameter encoding used to ship a command between processes.

use crate::aggregate::{AggregationTarget, AggregationType, Aggregator, TargetType};
use crate::config::EngineConfig;
use crate::error::{AggregationError, Result};
use crate::event::{Event, EventSource, EventTemplate};
use crate::group::{GroupBy, GroupByGrouper};
use crate::interval::{Interval, IntervalGrouper};
use crate::result::Aggregation;
use crate::telemetry::{self, RunTelemetry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const PARAM_TYPE: &str = "aType";
pub const PARAM_INTERVAL: &str = "aInterval";
pub const PARAM_GROUP: &str = "aGroup";
pub const PARAM_TARGET: &str = "aTarget";
pub const PARAM_IDENTIFICATION: &str = "aIdentification";

/// The fully wired pipeline for one command.
pub type Pipeline = Aggregator<GroupByGrouper<IntervalGrouper>>;

/// An immutable description of one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationCommand {
    #[serde(rename = "type")]
    pub aggregation_type: AggregationType,
    #[serde(default)]
    pub template: EventTemplate,
    pub target: AggregationTarget,
    pub interval: Interval,
    pub group: GroupBy,
}

impl AggregationCommand {
    pub fn new(
        aggregation_type: AggregationType,
        template: EventTemplate,
        target: AggregationTarget,
        interval: Interval,
        group: GroupBy,
    ) -> Self {
        Self {
            aggregation_type,
            template,
            target,
            interval,
            group,
        }
    }

    /// Wire interval grouper, group-by grouper and aggregator over `events`.
    ///
    /// Reducer/target incompatibilities and an out-of-range bucketing offset
    /// are reported here, before any event is consumed.
    pub fn pipeline(
        &self,
        events: impl IntoIterator<Item = Event>,
        config: &EngineConfig,
    ) -> Result<Pipeline> {
        let offset = config
            .offset()
            .map_err(|e| AggregationError::Config(e.to_string()))?;
        let intervals =
            IntervalGrouper::new(events, self.interval, offset, config.bucketing.input_order)?;
        let groups = GroupByGrouper::new(intervals, self.group, config.group_labels());
        let aggregator = Aggregator::new(
            groups,
            self.aggregation_type,
            &self.target,
            &config.labels.no_entry,
        )?;
        debug!(
            aggregation_type = %self.aggregation_type,
            interval = %self.interval,
            group = %self.group,
            target = %self.target.target_type,
            reducer = aggregator.reducer_name(),
            "Pipeline wired"
        );
        Ok(aggregator)
    }

    /// Run the pipeline to completion over already fetched events.
    pub fn aggregate(
        &self,
        events: impl IntoIterator<Item = Event>,
        config: &EngineConfig,
    ) -> Result<Aggregation> {
        self.pipeline(events, config)?.into_aggregation()
    }

    /// Fetch the events matching the template and aggregate them.
    pub fn run(&self, source: &dyn EventSource, config: &EngineConfig) -> Result<Aggregation> {
        let aggregation_type = self.aggregation_type.as_str();
        let mut telemetry = RunTelemetry::start();

        let events = match source.find_by_template(&self.template) {
            Ok(events) => events,
            Err(e) => {
                telemetry::log_run_error(aggregation_type, &e.to_string());
                return Err(e);
            }
        };
        telemetry.fetched();
        let event_count = events.len();

        let aggregation = match self.aggregate(events, config) {
            Ok(aggregation) => aggregation,
            Err(e) => {
                telemetry::log_run_error(aggregation_type, &e.to_string());
                return Err(e);
            }
        };
        telemetry.aggregated();

        let metrics = telemetry.finish(self, event_count, aggregation.len());
        telemetry::log_run_success(&metrics);
        Ok(aggregation)
    }

    /// The template's parameters plus the five command keys.
    /// `aIdentification` is always present, empty when the target has none.
    pub fn to_query_parameters(&self) -> BTreeMap<String, String> {
        let mut params = self.template.to_query_parameters();
        params.insert(PARAM_TYPE.to_string(), self.aggregation_type.to_string());
        params.insert(PARAM_INTERVAL.to_string(), self.interval.to_string());
        params.insert(PARAM_GROUP.to_string(), self.group.to_string());
        params.insert(
            PARAM_TARGET.to_string(),
            self.target.target_type.to_string(),
        );
        params.insert(
            PARAM_IDENTIFICATION.to_string(),
            self.target.identification.clone().unwrap_or_default(),
        );
        params
    }

    /// Rebuild a command, removing the five command keys from `params` and
    /// handing what is left to [`EventTemplate::from_query_parameters`].
    ///
    /// All five keys are removed even when one of them is invalid.
    pub fn from_query_parameters(params: &mut BTreeMap<String, String>) -> Result<Self> {
        let raw_type = params.remove(PARAM_TYPE);
        let raw_interval = params.remove(PARAM_INTERVAL);
        let raw_group = params.remove(PARAM_GROUP);
        let raw_target = params.remove(PARAM_TARGET);
        let identification = params
            .remove(PARAM_IDENTIFICATION)
            .filter(|id| !id.is_empty());

        let aggregation_type = parse_param(PARAM_TYPE, raw_type, AggregationType::parse_type)?;
        let interval = parse_param(PARAM_INTERVAL, raw_interval, Interval::parse_interval)?;
        let group = parse_param(PARAM_GROUP, raw_group, GroupBy::parse_group)?;
        let target_type = parse_param(PARAM_TARGET, raw_target, TargetType::parse_target)?;
        let template = EventTemplate::from_query_parameters(params)?;

        Ok(Self {
            aggregation_type,
            template,
            target: AggregationTarget::new(target_type, identification),
            interval,
            group,
        })
    }

    /// Parse a URL-encoded `key=value&...` string.
    pub fn from_query_string(query: &str) -> Result<Self> {
        let mut params: BTreeMap<String, String> =
            url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect();
        Self::from_query_parameters(&mut params)
    }

    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_query_parameters())
            .finish()
    }
}

fn parse_param<T>(
    key: &str,
    raw: Option<String>,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T> {
    let raw = raw.ok_or_else(|| AggregationError::MissingParameter(key.to_string()))?;
    parse(&raw).ok_or_else(|| AggregationError::invalid_parameter(key, &raw))
}
