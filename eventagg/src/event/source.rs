use super::{Event, EventTemplate};
use crate::error::{AggregationError, Result};
use std::io::BufRead;

/// Supplier of events matching a template.
///
/// Implementations return a finite, fully materialized batch. The engine
/// does not stream from a live source.
pub trait EventSource {
    fn find_by_template(&self, template: &EventTemplate) -> Result<Vec<Event>>;
}

/// Event source over an in-memory batch, e.g. a replayed dump.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    events: Vec<Event>,
}

impl MemoryEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Load one JSON event per line. Blank lines are skipped.
    pub fn from_json_lines<R: BufRead>(reader: R) -> Result<Self> {
        let mut events = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| AggregationError::Source(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line)
                .map_err(|e| AggregationError::Source(format!("line {}: {}", idx + 1, e)))?;
            events.push(event);
        }
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSource for MemoryEventSource {
    /// Matching events, oldest first.
    fn find_by_template(&self, template: &EventTemplate) -> Result<Vec<Event>> {
        let mut matched: Vec<Event> = self
            .events
            .iter()
            .filter(|e| template.matches(e))
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.date_of_occurrence);
        Ok(matched)
    }
}
