//! Calendar bucketing of events.
//!
//! [`IntervalGrouper`] peels the earliest populated calendar period off the
//! remaining events on every call, so buckets come out oldest first provided
//! the input is ordered by occurrence date. The grouper establishes that
//! ordering itself according to [`InputOrder`].

use crate::error::{AggregationError, Result};
use crate::event::Event;
use crate::group::Group;
use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDateTime, NaiveTime, Timelike,
    Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use tracing::{debug, warn};

/// Calendar granularity of the interval buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Interval {
    Hours,
    Days,
    Weeks,
    Months,
    Quarters,
    Years,
}

impl Interval {
    pub const ALL: [Interval; 6] = [
        Interval::Hours,
        Interval::Days,
        Interval::Weeks,
        Interval::Months,
        Interval::Quarters,
        Interval::Years,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Hours => "HOURS",
            Interval::Days => "DAYS",
            Interval::Weeks => "WEEKS",
            Interval::Months => "MONTHS",
            Interval::Quarters => "QUARTERS",
            Interval::Years => "YEARS",
        }
    }

    pub fn parse_interval(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|i| i.as_str() == upper)
    }

    /// Round a local timestamp down to the start of its period.
    pub fn period(&self, local: NaiveDateTime) -> Period {
        let date = local.date();
        let start = match self {
            Interval::Hours => {
                date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(local.hour()))
            }
            Interval::Days => date.and_time(NaiveTime::MIN),
            Interval::Weeks => {
                let monday = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
                monday.and_time(NaiveTime::MIN)
            }
            Interval::Months => first_of_month(date).and_time(NaiveTime::MIN),
            Interval::Quarters => {
                let back = Months::new(date.month0() % 3);
                (first_of_month(date) - back).and_time(NaiveTime::MIN)
            }
            Interval::Years => {
                (date - Days::new(u64::from(date.ordinal0()))).and_time(NaiveTime::MIN)
            }
        };
        Period(start)
    }

    /// Human-readable bucket label, e.g. `07.2024` or `3. quarter of 2024`.
    pub fn label(&self, period: &Period) -> String {
        let start = period.0;
        match self {
            Interval::Hours => start.format("%d.%m.%Y %H:00").to_string(),
            Interval::Days => start.format("%d.%m.%Y").to_string(),
            Interval::Weeks => {
                let week = start.iso_week();
                format!("{:02}. week of {}", week.week(), week.year())
            }
            Interval::Months => start.format("%m.%Y").to_string(),
            Interval::Quarters => {
                let quarter = quarter_of(start.month0());
                format!("{}. quarter of {}", quarter, start.year())
            }
            Interval::Years => start.year().to_string(),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quarter (1-4) of a zero-based month.
pub fn quarter_of(month0: u32) -> u32 {
    month0 / 3 + 1
}

fn first_of_month(date: chrono::NaiveDate) -> chrono::NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Start of a calendar period in bucketing-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(NaiveDateTime);

impl Period {
    pub fn start(&self) -> NaiveDateTime {
        self.0
    }
}

/// How the grouper treats input that is not sorted by occurrence date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrder {
    /// Stable-sort the events by occurrence date before bucketing.
    #[default]
    Sort,
    /// Refuse input that is not already ascending.
    Strict,
}

/// Single-pass iterator of interval buckets, oldest period first.
///
/// Each call scans the remaining events once: the period of the first
/// remaining event becomes the target, matching events go into the bucket
/// and everything else is deferred to the next call. Once exhausted the
/// grouper stays exhausted; build a new one for another pass.
#[derive(Debug)]
pub struct IntervalGrouper {
    interval: Interval,
    offset: FixedOffset,
    remaining: Vec<Event>,
    last_period: Option<Period>,
}

impl IntervalGrouper {
    pub fn new(
        events: impl IntoIterator<Item = Event>,
        interval: Interval,
        offset: FixedOffset,
        order: InputOrder,
    ) -> Result<Self> {
        let mut remaining: Vec<Event> = events.into_iter().collect();

        if let Some(pos) = remaining
            .windows(2)
            .position(|w| w[1].date_of_occurrence < w[0].date_of_occurrence)
        {
            match order {
                InputOrder::Strict => {
                    return Err(AggregationError::UnorderedInput {
                        previous: remaining[pos].date_of_occurrence.to_rfc3339(),
                        found: remaining[pos + 1].date_of_occurrence.to_rfc3339(),
                    });
                }
                InputOrder::Sort => {
                    warn!(
                        events = remaining.len(),
                        "Input not ordered by date, sorting"
                    );
                    remaining.sort_by_key(|e| e.date_of_occurrence);
                }
            }
        }

        Ok(Self {
            interval,
            offset,
            remaining,
            last_period: None,
        })
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// The most recently emitted period.
    pub fn last_period(&self) -> Option<Period> {
        self.last_period
    }

    pub fn period_of(&self, date: &DateTime<Utc>) -> Period {
        self.interval
            .period(date.with_timezone(&self.offset).naive_local())
    }
}

impl Iterator for IntervalGrouper {
    type Item = Group<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut pending = std::mem::take(&mut self.remaining).into_iter();
        let first = pending.next()?;
        let target = self.period_of(&first.date_of_occurrence);

        let mut items = vec![first];
        for event in pending {
            if self.period_of(&event.date_of_occurrence) == target {
                items.push(event);
            } else {
                self.remaining.push(event);
            }
        }

        debug_assert!(self.last_period.map_or(true, |last| last < target));
        self.last_period = Some(target);

        let label = self.interval.label(&target);
        debug!(
            interval = %self.interval,
            bucket = %label,
            events = items.len(),
            remaining = self.remaining.len(),
            "Peeled interval bucket"
        );
        Some(Group::new(label, items))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining.is_empty() {
            (0, Some(0))
        } else {
            (1, Some(self.remaining.len()))
        }
    }
}

impl FusedIterator for IntervalGrouper {}
