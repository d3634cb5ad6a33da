//! Per-entity folding of decoded rows.
//!
//! Every field of an [`EntityRecord`] is reduced with a rule that is both
//! commutative and associative:
//!
//! - category and priority keep the value from the lowest row ordinal that
//!   carried one (first-seen-wins in stream order),
//! - the three lifecycle timestamps keep the earliest value, absent counting
//!   as +infinity.
//!
//! The same rules back [`EntityRecord::merge`], so partial tables built by
//! shard workers combine into exactly what a sequential scan produces.

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::decoder::Row;
use crate::timestamp::hours_between;

#[derive(Debug, Clone, PartialEq, Eq)]
struct FirstSeen {
    ordinal: u64,
    value: String,
}

fn precedes(candidate: (u64, &str), current: &Option<FirstSeen>) -> bool {
    match current {
        Some(current) => candidate < (current.ordinal, current.value.as_str()),
        None => true,
    }
}

fn keep_first(slot: &mut Option<FirstSeen>, ordinal: u64, value: Option<&str>) {
    if let Some(value) = value {
        if precedes((ordinal, value), slot) {
            *slot = Some(FirstSeen {
                ordinal,
                value: value.to_string(),
            });
        }
    }
}

fn merge_first(slot: &mut Option<FirstSeen>, other: Option<FirstSeen>) {
    if let Some(other) = other {
        if precedes((other.ordinal, other.value.as_str()), slot) {
            *slot = Some(other);
        }
    }
}

fn keep_earliest(slot: &mut Option<NaiveDateTime>, candidate: Option<NaiveDateTime>) {
    if let Some(candidate) = candidate {
        if slot.map_or(true, |current| candidate < current) {
            *slot = Some(candidate);
        }
    }
}

/// Aggregated lifecycle of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    first_seen: u64,
    category: Option<FirstSeen>,
    priority: Option<FirstSeen>,
    opened_at: Option<NaiveDateTime>,
    resolved_at: Option<NaiveDateTime>,
    closed_at: Option<NaiveDateTime>,
}

impl EntityRecord {
    pub fn from_row(row: &Row) -> Self {
        let mut record = Self {
            first_seen: row.ordinal,
            category: None,
            priority: None,
            opened_at: None,
            resolved_at: None,
            closed_at: None,
        };
        record.absorb(row);
        record
    }

    /// Fold one more row for this entity into the record.
    pub fn absorb(&mut self, row: &Row) {
        self.first_seen = self.first_seen.min(row.ordinal);
        keep_first(&mut self.category, row.ordinal, row.category.as_deref());
        keep_first(&mut self.priority, row.ordinal, row.priority.as_deref());
        keep_earliest(&mut self.opened_at, row.opened_at);
        keep_earliest(&mut self.resolved_at, row.resolved_at);
        keep_earliest(&mut self.closed_at, row.closed_at);
    }

    /// Combine two partial aggregates of the same entity.
    pub fn merge(&mut self, other: EntityRecord) {
        self.first_seen = self.first_seen.min(other.first_seen);
        merge_first(&mut self.category, other.category);
        merge_first(&mut self.priority, other.priority);
        keep_earliest(&mut self.opened_at, other.opened_at);
        keep_earliest(&mut self.resolved_at, other.resolved_at);
        keep_earliest(&mut self.closed_at, other.closed_at);
    }

    /// Ordinal of the earliest row seen for this entity.
    pub fn first_seen(&self) -> u64 {
        self.first_seen
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_ref().map(|f| f.value.as_str())
    }

    pub fn priority(&self) -> Option<&str> {
        self.priority.as_ref().map(|f| f.value.as_str())
    }

    pub fn opened_at(&self) -> Option<NaiveDateTime> {
        self.opened_at
    }

    pub fn resolved_at(&self) -> Option<NaiveDateTime> {
        self.resolved_at
    }

    pub fn closed_at(&self) -> Option<NaiveDateTime> {
        self.closed_at
    }

    /// Hours from opened to resolved. May be negative on inconsistent data.
    pub fn resolution_hours(&self) -> Option<f64> {
        match (self.opened_at, self.resolved_at) {
            (Some(opened), Some(resolved)) => Some(hours_between(opened, resolved)),
            _ => None,
        }
    }
}

/// Functional form of the fold: create the record on first occurrence,
/// otherwise absorb the row into it.
pub fn fold(record: Option<EntityRecord>, row: &Row) -> EntityRecord {
    match record {
        Some(mut record) => {
            record.absorb(row);
            record
        }
        None => EntityRecord::from_row(row),
    }
}

/// Entity id → record, iterated in first-appearance order.
///
/// Lives for exactly one scan. There is no eviction: memory grows with the
/// number of distinct entities, never with the number of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityTable {
    records: IndexMap<String, EntityRecord>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold_row(&mut self, row: Row) {
        match self.records.get_mut(&row.entity_id) {
            Some(record) => record.absorb(&row),
            None => {
                let record = EntityRecord::from_row(&row);
                self.records.insert(row.entity_id, record);
            }
        }
    }

    /// Merge another partial table into this one, then restore the order in
    /// which entities first appeared in the stream.
    pub fn merge(&mut self, other: EntityTable) {
        for (entity_id, record) in other.records {
            match self.records.get_mut(&entity_id) {
                Some(existing) => existing.merge(record),
                None => {
                    self.records.insert(entity_id, record);
                }
            }
        }
        self.records
            .sort_by(|_, a, _, b| a.first_seen.cmp(&b.first_seen));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityRecord> {
        self.records.get(entity_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn records(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.values()
    }
}
