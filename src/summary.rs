use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::EntityTable;

/// Number of entries kept in each top-K list unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 5;

/// One value of a categorical field and the number of entities carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopEntry {
    pub value: String,
    pub count: u64,
}

/// Bounded-size result of one scan.
///
/// Deserialization is lenient (every field defaults) so summaries written by
/// older runs still load as a comparison baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub rows_scanned: u64,
    pub incident_count: u64,
    pub resolved_count: u64,
    pub mean_resolution_hours: Option<f64>,
    pub top_categories: Vec<TopEntry>,
    pub top_priorities: Vec<TopEntry>,
}

/// Insertion-ordered frequency counter.
#[derive(Debug, Default)]
struct FrequencyCounter {
    counts: IndexMap<String, u64>,
}

impl FrequencyCounter {
    fn add(&mut self, value: &str) {
        match self.counts.get_mut(value) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(value.to_string(), 1);
            }
        }
    }

    /// Highest counts first; equal counts keep first-encountered order.
    fn top(self, k: usize) -> Vec<TopEntry> {
        let mut entries: Vec<TopEntry> = self
            .counts
            .into_iter()
            .map(|(value, count)| TopEntry { value, count })
            .collect();
        // stable sort: ties stay in first-encountered order
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries.truncate(k);
        entries
    }
}

/// Reduce a finalized entity table into a [`Summary`]. Does not touch the table.
pub fn summarize(table: &EntityTable, rows_scanned: u64, top_k: usize) -> Summary {
    let mut categories = FrequencyCounter::default();
    let mut priorities = FrequencyCounter::default();
    let mut total_hours = 0.0f64;
    let mut resolved_count = 0u64;

    for record in table.records() {
        if let Some(category) = record.category() {
            categories.add(category);
        }
        if let Some(priority) = record.priority() {
            priorities.add(priority);
        }
        // Negative durations (resolved before opened) are kept as-is.
        if let Some(hours) = record.resolution_hours() {
            total_hours += hours;
            resolved_count += 1;
        }
    }

    let mean_resolution_hours = if resolved_count > 0 {
        Some(total_hours / resolved_count as f64)
    } else {
        None
    };

    Summary {
        rows_scanned,
        incident_count: table.len() as u64,
        resolved_count,
        mean_resolution_hours,
        top_categories: categories.top(top_k),
        top_priorities: priorities.top(top_k),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Row;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn entry(value: &str, count: u64) -> TopEntry {
        TopEntry {
            value: value.to_string(),
            count,
        }
    }

    fn table_from(rows: Vec<Row>) -> EntityTable {
        let mut table = EntityTable::new();
        for row in rows {
            table.fold_row(row);
        }
        table
    }

    #[test]
    fn test_duplicate_open_and_tie_order_scenario() {
        let mut a1 = Row::new(1, "A");
        a1.category = Some("net".to_string());
        a1.opened_at = Some(ts(1, 0, 0));
        a1.resolved_at = Some(ts(1, 2, 0));

        let mut a2 = Row::new(2, "A");
        a2.category = Some("net".to_string());
        a2.opened_at = Some(ts(1, 0, 30));

        let mut b = Row::new(3, "B");
        b.category = Some("disk".to_string());
        b.opened_at = Some(ts(2, 0, 0));
        b.resolved_at = Some(ts(2, 1, 0));

        let summary = summarize(&table_from(vec![a1, a2, b]), 3, DEFAULT_TOP_K);

        assert_eq!(summary.rows_scanned, 3);
        assert_eq!(summary.incident_count, 2);
        assert_eq!(summary.resolved_count, 2);
        assert_eq!(summary.mean_resolution_hours, Some(1.5));
        assert_eq!(summary.top_categories, vec![entry("net", 1), entry("disk", 1)]);
        assert!(summary.top_priorities.is_empty());
    }

    #[test]
    fn test_mean_absent_without_resolved_pairs() {
        let mut open_only = Row::new(1, "A");
        open_only.opened_at = Some(ts(1, 0, 0));
        let mut resolved_only = Row::new(2, "B");
        resolved_only.resolved_at = Some(ts(1, 3, 0));

        let summary = summarize(&table_from(vec![open_only, resolved_only]), 2, 5);
        assert_eq!(summary.incident_count, 2);
        assert_eq!(summary.resolved_count, 0);
        assert_eq!(summary.mean_resolution_hours, None);
    }

    #[test]
    fn test_negative_duration_pulls_mean_down() {
        let mut forward = Row::new(1, "A");
        forward.opened_at = Some(ts(1, 0, 0));
        forward.resolved_at = Some(ts(1, 4, 0));
        let mut backward = Row::new(2, "B");
        backward.opened_at = Some(ts(1, 2, 0));
        backward.resolved_at = Some(ts(1, 0, 0));

        let summary = summarize(&table_from(vec![forward, backward]), 2, 5);
        assert_eq!(summary.mean_resolution_hours, Some(1.0));
    }

    #[test]
    fn test_top_k_descending_with_encounter_order_ties() {
        let values = ["db", "net", "disk", "net", "app", "disk", "auth", "mail"];
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut r = Row::new(i as u64 + 1, format!("INC{}", i));
                r.priority = Some(v.to_string());
                r
            })
            .collect();

        let summary = summarize(&table_from(rows), 8, 4);
        assert_eq!(
            summary.top_priorities,
            vec![entry("net", 2), entry("disk", 2), entry("db", 1), entry("app", 1)]
        );
    }

    #[test]
    fn test_counts_are_per_entity_not_per_row() {
        let rows = (1..=4)
            .map(|i| {
                let mut r = Row::new(i, "SAME");
                r.category = Some("net".to_string());
                r
            })
            .collect();
        let summary = summarize(&table_from(rows), 4, 5);
        assert_eq!(summary.top_categories, vec![entry("net", 1)]);
    }

    #[test]
    fn test_empty_table() {
        let summary = summarize(&EntityTable::new(), 0, 5);
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_lenient_deserialize() {
        let summary: Summary =
            serde_json::from_str(r#"{"incident_count": 12, "mean_resolution_hours": null}"#)
                .unwrap();
        assert_eq!(summary.incident_count, 12);
        assert_eq!(summary.mean_resolution_hours, None);
        assert!(summary.top_categories.is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let summary = Summary {
            rows_scanned: 3,
            incident_count: 2,
            resolved_count: 2,
            mean_resolution_hours: Some(1.5),
            top_categories: vec![entry("net", 1)],
            top_priorities: Vec::new(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["mean_resolution_hours"], serde_json::json!(1.5));
        assert_eq!(json["top_categories"][0]["value"], "net");
        assert_eq!(json["top_categories"][0]["count"], 1);
    }
}
