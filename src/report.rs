//! Plain-text rendering of a summary for humans and for the downstream
//! text-generation step. Every optional input may be missing.

use crate::metrics::MetricsSample;
use crate::summary::{Summary, TopEntry};

/// Entries of each top list shown in the brief.
const BRIEF_TOP_ENTRIES: usize = 2;

const PROMPT_PREAMBLE: &str =
    "You are an SRE assistant. Produce a concise incident posture summary.";
const PROMPT_INSTRUCTION: &str = "Write 4-6 sentences with: current health, likely hotspots, \
     and 2 next actions. Return plain text.";

fn format_hours(hours: Option<f64>) -> String {
    match hours {
        Some(h) => format!("{:.1}", h),
        None => "n/a".to_string(),
    }
}

fn format_top(entries: &[TopEntry]) -> String {
    entries
        .iter()
        .take(BRIEF_TOP_ENTRIES)
        .map(|e| format!("{} ({})", e.value, e.count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_delta(current: u64, previous: u64) -> String {
    let delta = current as i64 - previous as i64;
    format!("{:+}", delta)
}

/// Bullet lines describing the summary, optionally against a previous run.
pub fn brief_lines(
    summary: &Summary,
    previous: Option<&Summary>,
    metrics: Option<&MetricsSample>,
) -> Vec<String> {
    let mut lines = Vec::new();

    let mut totals = format!(
        "- Incidents total: {}, resolved: {}",
        summary.incident_count, summary.resolved_count
    );
    if let Some(prev) = previous {
        totals.push_str(&format!(
            " (previous {} / {}, change {} / {})",
            prev.incident_count,
            prev.resolved_count,
            format_delta(summary.incident_count, prev.incident_count),
            format_delta(summary.resolved_count, prev.resolved_count),
        ));
    }
    lines.push(totals);

    let mut mttr = format!(
        "- Approx MTTR (hours): {}",
        format_hours(summary.mean_resolution_hours)
    );
    if let Some(prev) = previous {
        match (summary.mean_resolution_hours, prev.mean_resolution_hours) {
            (Some(now), Some(before)) => {
                mttr.push_str(&format!(" (previous {:.1}, change {:+.1})", before, now - before))
            }
            (_, before) => mttr.push_str(&format!(" (previous {})", format_hours(before))),
        }
    }
    lines.push(mttr);

    if let Some(sample) = metrics {
        lines.push(format!(
            "- Avg CPU: {:.1} | Avg Memory: {:.1} | Avg Disk: {:.1} (over {} samples)",
            sample.averages.cpu, sample.averages.memory, sample.averages.disk, sample.count
        ));
    }

    if !summary.top_categories.is_empty() {
        lines.push(format!(
            "- Top categories: {}",
            format_top(&summary.top_categories)
        ));
    }
    if !summary.top_priorities.is_empty() {
        lines.push(format!(
            "- Top priorities: {}",
            format_top(&summary.top_priorities)
        ));
    }

    lines.push(format!("- Rows scanned: {}", summary.rows_scanned));
    lines
}

/// Human-readable brief.
pub fn render_brief(
    summary: &Summary,
    previous: Option<&Summary>,
    metrics: Option<&MetricsSample>,
) -> String {
    let mut out = String::from("Incident posture\n");
    for line in brief_lines(summary, previous, metrics) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Brief wrapped with the instructions handed to the text-generation step.
pub fn render_prompt(
    summary: &Summary,
    previous: Option<&Summary>,
    metrics: Option<&MetricsSample>,
) -> String {
    let mut lines = vec![PROMPT_PREAMBLE.to_string()];
    lines.extend(brief_lines(summary, previous, metrics));
    lines.push(PROMPT_INSTRUCTION.to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Averages;

    fn summary() -> Summary {
        Summary {
            rows_scanned: 141_712,
            incident_count: 24_918,
            resolved_count: 24_000,
            mean_resolution_hours: Some(170.4),
            top_categories: vec![
                TopEntry {
                    value: "Category 26".to_string(),
                    count: 3_000,
                },
                TopEntry {
                    value: "Category 53".to_string(),
                    count: 2_000,
                },
                TopEntry {
                    value: "Category 9".to_string(),
                    count: 1_000,
                },
            ],
            top_priorities: Vec::new(),
        }
    }

    #[test]
    fn test_brief_without_extras() {
        let text = render_brief(&summary(), None, None);
        assert!(text.contains("Incidents total: 24918, resolved: 24000\n"));
        assert!(text.contains("Approx MTTR (hours): 170.4"));
        assert!(text.contains("Top categories: Category 26 (3000), Category 53 (2000)\n"));
        assert!(!text.contains("Category 9"));
        assert!(!text.contains("Top priorities"));
        assert!(!text.contains("Avg CPU"));
    }

    #[test]
    fn test_brief_tolerates_missing_mean() {
        let mut current = summary();
        current.mean_resolution_hours = None;
        let previous = Summary::default();
        let text = render_brief(&current, Some(&previous), None);
        assert!(text.contains("Approx MTTR (hours): n/a (previous n/a)"));
        assert!(text.contains("(previous 0 / 0, change +24918 / +24000)"));
    }

    #[test]
    fn test_brief_compares_mttr() {
        let mut previous = summary();
        previous.mean_resolution_hours = Some(180.4);
        previous.incident_count = 25_000;
        let text = render_brief(&summary(), Some(&previous), None);
        assert!(text.contains("(previous 180.4, change -10.0)"));
        assert!(text.contains("change -82 / +0"));
    }

    #[test]
    fn test_prompt_includes_metrics_and_instructions() {
        let sample = MetricsSample {
            count: 30,
            averages: Averages {
                cpu: 55.04,
                memory: 61.0,
                disk: 70.44,
            },
            head: Vec::new(),
        };
        let prompt = render_prompt(&summary(), None, Some(&sample));
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(lines[0], PROMPT_PREAMBLE);
        assert_eq!(*lines.last().unwrap(), PROMPT_INSTRUCTION);
        assert!(prompt.contains("Avg CPU: 55.0 | Avg Memory: 61.0 | Avg Disk: 70.4"));
    }
}
