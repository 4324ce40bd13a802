//! Aggregation run telemetry and metrics

use crate::command::AggregationCommand;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Runs slower than this are logged at warn level.
const SLOW_RUN_MS: f64 = 1000.0;

/// Metrics collected during one aggregation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    pub fetch_ms: f64,
    pub aggregate_ms: f64,
    pub total_ms: f64,
    pub event_count: usize,
    pub interval_count: usize,
    pub aggregation_type: String,
    pub interval: String,
    pub group: String,
}

/// Clock for a run's two stages: fetching the events, then aggregating them.
#[derive(Debug, Clone, Copy)]
pub struct RunTelemetry {
    start: Instant,
    fetched: Option<Instant>,
    aggregated: Option<Instant>,
}

impl RunTelemetry {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            fetched: None,
            aggregated: None,
        }
    }

    pub fn fetched(&mut self) {
        self.fetched = Some(Instant::now());
    }

    pub fn aggregated(&mut self) {
        self.aggregated = Some(Instant::now());
    }

    /// Zero until [`fetched`](Self::fetched) is called.
    pub fn fetch_ms(&self) -> f64 {
        self.fetched.map_or(0.0, |at| millis(at - self.start))
    }

    /// Zero until both stages are marked.
    pub fn aggregate_ms(&self) -> f64 {
        match (self.fetched, self.aggregated) {
            (Some(fetched), Some(aggregated)) => millis(aggregated - fetched),
            _ => 0.0,
        }
    }

    pub fn finish(
        self,
        command: &AggregationCommand,
        event_count: usize,
        interval_count: usize,
    ) -> RunMetrics {
        RunMetrics {
            fetch_ms: self.fetch_ms(),
            aggregate_ms: self.aggregate_ms(),
            total_ms: millis(self.start.elapsed()),
            event_count,
            interval_count,
            aggregation_type: command.aggregation_type.to_string(),
            interval: command.interval.to_string(),
            group: command.group.to_string(),
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Log and record a successful run
pub fn log_run_success(metrics: &RunMetrics) {
    info!(
        aggregation_type = %metrics.aggregation_type,
        interval = %metrics.interval,
        group = %metrics.group,
        events = metrics.event_count,
        intervals = metrics.interval_count,
        fetch_ms = metrics.fetch_ms,
        aggregate_ms = metrics.aggregate_ms,
        total_ms = metrics.total_ms,
        "Aggregation completed"
    );

    if metrics.total_ms > SLOW_RUN_MS {
        warn!(
            aggregation_type = %metrics.aggregation_type,
            events = metrics.event_count,
            total_ms = metrics.total_ms,
            "Slow aggregation run"
        );
    }

    metrics::counter!(
        "eventagg_runs_total",
        "type" => metrics.aggregation_type.clone(),
        "status" => "ok",
    )
    .increment(1);
    metrics::counter!("eventagg_events_total").increment(metrics.event_count as u64);
    metrics::histogram!(
        "eventagg_run_duration_seconds",
        "type" => metrics.aggregation_type.clone(),
    )
    .record(metrics.total_ms / 1000.0);
}

/// Log and record a failed run
pub fn log_run_error(aggregation_type: &str, error: &str) {
    error!(
        aggregation_type = %aggregation_type,
        error = %error,
        "Aggregation failed"
    );

    metrics::counter!(
        "eventagg_runs_total",
        "type" => aggregation_type.to_string(),
        "status" => "error",
    )
    .increment(1);
    metrics::counter!(
        "eventagg_run_errors_total",
        "type" => aggregation_type.to_string(),
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregationTarget, AggregationType};
    use crate::event::EventTemplate;
    use crate::group::GroupBy;
    use crate::interval::Interval;
    use std::thread::sleep;

    #[test]
    fn test_stage_timing() {
        let mut telemetry = RunTelemetry::start();
        assert_eq!(telemetry.fetch_ms(), 0.0);

        sleep(Duration::from_millis(10));
        telemetry.fetched();
        assert_eq!(telemetry.aggregate_ms(), 0.0);

        sleep(Duration::from_millis(10));
        telemetry.aggregated();

        let fetch_ms = telemetry.fetch_ms();
        let aggregate_ms = telemetry.aggregate_ms();
        assert!(fetch_ms >= 9.0, "fetch should be ~10ms, got {}", fetch_ms);
        assert!(
            aggregate_ms >= 9.0,
            "aggregate should be ~10ms, got {}",
            aggregate_ms
        );
    }

    #[test]
    fn test_finish() {
        let command = AggregationCommand::new(
            AggregationType::Count,
            EventTemplate::any(),
            AggregationTarget::events(),
            Interval::Days,
            GroupBy::Level,
        );
        let mut telemetry = RunTelemetry::start();
        telemetry.fetched();
        telemetry.aggregated();

        let metrics = telemetry.finish(&command, 42, 3);
        assert_eq!(metrics.aggregation_type, "COUNT");
        assert_eq!(metrics.interval, "DAYS");
        assert_eq!(metrics.group, "LEVEL");
        assert_eq!(metrics.event_count, 42);
        assert_eq!(metrics.interval_count, 3);
        assert!(metrics.total_ms >= metrics.fetch_ms);

        // No recorder installed: recording is a no-op.
        log_run_success(&metrics);
        log_run_error("SUM", "boom");
    }
}
