//! Labeled buckets and categorical sub-grouping of interval buckets.

use crate::event::Event;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use tracing::trace;

/// A labeled, ordered bucket of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<T> {
    pub identifier: String,
    pub items: Vec<T>,
}

impl<T> Group<T> {
    pub fn new(identifier: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            identifier: identifier.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a Group<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Secondary categorical key applied inside each interval bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupBy {
    /// No sub-grouping: a single `default` group.
    Events,
    Context,
    Level,
    Code,
    TransactionIds,
    Tags,
}

impl GroupBy {
    pub const ALL: [GroupBy; 6] = [
        GroupBy::Events,
        GroupBy::Context,
        GroupBy::Level,
        GroupBy::Code,
        GroupBy::TransactionIds,
        GroupBy::Tags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Events => "EVENTS",
            GroupBy::Context => "CONTEXT",
            GroupBy::Level => "LEVEL",
            GroupBy::Code => "CODE",
            GroupBy::TransactionIds => "TRANSACTION_IDS",
            GroupBy::Tags => "TAGS",
        }
    }

    pub fn parse_group(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|g| g.as_str() == upper)
    }

    /// The sub-group key of an event, `None` when the event lacks the
    /// attribute. `Events` has no key of its own; callers label it.
    pub fn key(&self, event: &Event) -> Option<String> {
        match self {
            GroupBy::Events => None,
            GroupBy::Context => event.context.clone(),
            GroupBy::Level => Some(event.level.clone()),
            GroupBy::Code => Some(event.code.clone()),
            GroupBy::TransactionIds => event.transaction_id.clone(),
            GroupBy::Tags if event.tags.is_empty() => None,
            GroupBy::Tags => Some(event.tags.join(",")),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels used for the fixed and sentinel sub-groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLabels {
    pub default_group: String,
    pub no_value: String,
}

impl Default for GroupLabels {
    fn default() -> Self {
        Self {
            default_group: "default".to_string(),
            no_value: "no value".to_string(),
        }
    }
}

/// Split one interval bucket into categorical sub-groups, first-seen order.
pub fn partition(
    bucket: Group<Event>,
    group_by: GroupBy,
    labels: &GroupLabels,
) -> Group<Group<Event>> {
    let Group { identifier, items } = bucket;

    if group_by == GroupBy::Events {
        let default = Group::new(labels.default_group.clone(), items);
        return Group::new(identifier, vec![default]);
    }

    let mut subgroups: IndexMap<String, Vec<Event>> = IndexMap::new();
    for event in items {
        let key = group_by
            .key(&event)
            .unwrap_or_else(|| labels.no_value.clone());
        subgroups.entry(key).or_default().push(event);
    }

    trace!(
        bucket = %identifier,
        group_by = %group_by,
        groups = subgroups.len(),
        "Partitioned bucket"
    );

    Group::new(
        identifier,
        subgroups
            .into_iter()
            .map(|(label, events)| Group::new(label, events))
            .collect(),
    )
}

/// Iterator adaptor turning interval buckets into sub-grouped buckets, one
/// output per input.
#[derive(Debug)]
pub struct GroupByGrouper<I> {
    inner: I,
    group_by: GroupBy,
    labels: GroupLabels,
}

impl<I> GroupByGrouper<I>
where
    I: Iterator<Item = Group<Event>>,
{
    pub fn new(inner: I, group_by: GroupBy, labels: GroupLabels) -> Self {
        Self {
            inner,
            group_by,
            labels,
        }
    }

    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }
}

impl<I> Iterator for GroupByGrouper<I>
where
    I: Iterator<Item = Group<Event>>,
{
    type Item = Group<Group<Event>>;

    fn next(&mut self) -> Option<Self::Item> {
        let bucket = self.inner.next()?;
        Some(partition(bucket, self.group_by, &self.labels))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<I: FusedIterator<Item = Group<Event>>> FusedIterator for GroupByGrouper<I> {}
