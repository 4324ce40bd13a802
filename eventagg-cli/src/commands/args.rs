use chrono::{DateTime, Utc};
use clap::Args;
use eventagg::{
    AggregationCommand, AggregationTarget, AggregationType, EventTemplate, GroupBy, Interval,
    TargetType,
};
use std::path::PathBuf;

/// Flags describing one aggregation command.
#[derive(Args, Debug, Clone)]
pub struct CommandArgs {
    /// Reducer: COUNT, SUM, AVERAGE, MAXIMUM or MINIMUM
    #[arg(short = 't', long = "type", default_value = "COUNT", value_parser = parse_type)]
    pub aggregation_type: AggregationType,

    /// Bucket size: HOURS, DAYS, WEEKS, MONTHS, QUARTERS or YEARS
    #[arg(short, long, default_value = "DAYS", value_parser = parse_interval)]
    pub interval: Interval,

    /// Sub-grouping: EVENTS, CONTEXT, LEVEL, CODE, TRANSACTION_IDS or TAGS
    #[arg(short, long, default_value = "EVENTS", value_parser = parse_group)]
    pub group: GroupBy,

    /// Aggregated attribute: EVENTS, DATE, LEVEL, UDF or MACHINE_OF_ORIGIN
    #[arg(long, default_value = "EVENTS", value_parser = parse_target)]
    pub target: TargetType,

    /// UDF key, required with --target UDF
    #[arg(long)]
    pub identification: Option<String>,

    /// Only events with this code
    #[arg(long)]
    pub code: Option<String>,

    /// Only events with this level
    #[arg(long)]
    pub level: Option<String>,

    /// Only events from this machine
    #[arg(long)]
    pub machine: Option<String>,

    /// Only events with this context
    #[arg(long)]
    pub context: Option<String>,

    /// Only events with this transaction id
    #[arg(long)]
    pub transaction_id: Option<String>,

    /// Only events carrying this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Earliest occurrence (RFC 3339), inclusive
    #[arg(long, value_parser = parse_date)]
    pub from: Option<DateTime<Utc>>,

    /// Latest occurrence (RFC 3339), exclusive
    #[arg(long, value_parser = parse_date)]
    pub to: Option<DateTime<Utc>>,
}

impl CommandArgs {
    pub fn into_command(self) -> AggregationCommand {
        let template = EventTemplate {
            code: self.code,
            level: self.level,
            machine_of_origin: self.machine,
            context: self.context,
            transaction_id: self.transaction_id,
            tag: self.tag,
            from: self.from,
            to: self.to,
        };
        AggregationCommand::new(
            self.aggregation_type,
            template,
            AggregationTarget::new(self.target, self.identification),
            self.interval,
            self.group,
        )
    }
}

/// Where events come from and where the XML result goes.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// JSON-lines event dump ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    pub events: PathBuf,

    /// Write the XML result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Single-line XML output
    #[arg(long)]
    pub compact: bool,
}

fn parse_type(s: &str) -> Result<AggregationType, String> {
    AggregationType::parse_type(s).ok_or_else(|| format!("unknown aggregation type '{}'", s))
}

fn parse_interval(s: &str) -> Result<Interval, String> {
    Interval::parse_interval(s).ok_or_else(|| format!("unknown interval '{}'", s))
}

fn parse_group(s: &str) -> Result<GroupBy, String> {
    GroupBy::parse_group(s).ok_or_else(|| format!("unknown group '{}'", s))
}

fn parse_target(s: &str) -> Result<TargetType, String> {
    TargetType::parse_target(s).ok_or_else(|| format!("unknown target '{}'", s))
}

fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("invalid date '{}': {}", s, e))
}
