//! Hit aggregation and span deduplication.
//!
//! This module turns a flat list of scored hits into per-file groups:
//! hits are normalized, grouped by file in first-seen order, sorted by
//! start line, stripped of contained spans and scored.

use crate::models::{DedupedGroup, RawHit, Report, ScoredSpan};
use crate::report;
use indexmap::IndexMap;
use tracing::debug;

/// Aggregate raw hits into a rendered report.
///
/// Pure: the same hits and collection always produce the same report.
pub fn aggregate(hits: &[RawHit], collection: &str) -> Report {
    if hits.is_empty() {
        debug!("No hits for collection {}", collection);
        return report::build_report(collection, 0, Vec::new());
    }

    let spans = normalize(hits);
    let groups = group_by_file(&spans);
    debug!("Grouped {} hits into {} files", hits.len(), groups.len());

    let files: Vec<DedupedGroup> = groups
        .into_iter()
        .map(|(path, spans)| dedup_group(path, &spans))
        .collect();

    report::build_report(collection, hits.len(), files)
}

/// Project every hit onto a [`ScoredSpan`], applying payload defaults.
pub fn normalize(hits: &[RawHit]) -> Vec<ScoredSpan> {
    hits.iter().map(ScoredSpan::from).collect()
}

/// Group spans by file path.
///
/// Files keep the order in which their first span appears; spans within
/// a file are sorted by start line, keeping input order on ties.
pub fn group_by_file(spans: &[ScoredSpan]) -> IndexMap<String, Vec<ScoredSpan>> {
    let mut grouped: IndexMap<String, Vec<ScoredSpan>> = IndexMap::new();

    for span in spans {
        grouped
            .entry(span.file_path.clone())
            .or_default()
            .push(span.clone());
    }

    // Sort spans within each file by line number (stable)
    for spans in grouped.values_mut() {
        spans.sort_by_key(|s| s.start_line);
    }

    grouped
}

/// Drop every span that another span in the same file contains.
///
/// Spans with identical ranges never eliminate each other, so exact
/// duplicates are kept.
pub fn remove_contained_spans(spans: &[ScoredSpan]) -> Vec<ScoredSpan> {
    spans
        .iter()
        .enumerate()
        .filter(|(i, current)| {
            !spans
                .iter()
                .enumerate()
                .any(|(j, other)| j != *i && other.contains(current))
        })
        .map(|(_, span)| span.clone())
        .collect()
}

/// Arithmetic mean of the span scores, or 0 for no spans.
pub fn average_score(spans: &[ScoredSpan]) -> f64 {
    if spans.is_empty() {
        return 0.0;
    }

    spans.iter().map(|s| s.score).sum::<f64>() / spans.len() as f64
}

/// Dedup and score one file's sorted spans.
pub fn dedup_group(file_path: String, spans: &[ScoredSpan]) -> DedupedGroup {
    let survivors = remove_contained_spans(spans);
    let average_score = average_score(&survivors);

    debug!(
        "{}: {} spans, {} kept, avg score {:.3}",
        file_path,
        spans.len(),
        survivors.len(),
        average_score
    );

    DedupedGroup {
        file_path,
        raw_count: spans.len(),
        spans: survivors,
        average_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(score: f64, path: &str, start: i64, end: i64, code: &str) -> ScoredSpan {
        ScoredSpan::from(&RawHit::new(score, path, start, end, code))
    }

    #[test]
    fn test_empty_input() {
        let report = aggregate(&[], "c");
        assert_eq!(report.text(), r#"No results found in Qdrant collection: "c""#);
        assert_eq!(report.total_hits, 0);
        assert_eq!(report.file_count, 0);
        assert!(report.files.is_empty());
    }

    #[test]
    fn test_grouping_two_files() {
        let hits = vec![
            RawHit::new(0.9, "a.ts", 1, 5, "a1"),
            RawHit::new(0.8, "b.ts", 1, 5, "b1"),
            RawHit::new(0.7, "a.ts", 10, 15, "a2"),
        ];

        let report = aggregate(&hits, "c");

        assert_eq!(report.file_count, 2);
        assert!(report.text().contains("a.ts"));
        assert!(report.text().contains("b.ts"));
    }

    #[test]
    fn test_group_order_is_first_seen() {
        let spans = normalize(&[
            RawHit::new(0.5, "z.rs", 1, 2, "z"),
            RawHit::new(0.5, "a.rs", 1, 2, "a"),
            RawHit::new(0.5, "z.rs", 3, 4, "z2"),
            RawHit::new(0.5, "m.rs", 1, 2, "m"),
        ]);

        let grouped = group_by_file(&spans);
        let keys: Vec<&str> = grouped.keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["z.rs", "a.rs", "m.rs"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let spans = vec![
            span(0.1, "f.rs", 10, 12, "ten"),
            span(0.2, "f.rs", 5, 6, "first five"),
            span(0.3, "f.rs", 5, 8, "second five"),
        ];

        let grouped = group_by_file(&spans);
        let chunks: Vec<&str> = grouped["f.rs"]
            .iter()
            .map(|s| s.code_chunk.as_str())
            .collect();

        assert_eq!(chunks, vec!["first five", "second five", "ten"]);
    }

    #[test]
    fn test_contained_span_removed() {
        let spans = vec![span(0.9, "a.rs", 1, 50, "outer"), span(0.8, "a.rs", 10, 20, "inner")];

        let kept = remove_contained_spans(&spans);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].code_chunk, "outer");
    }

    #[test]
    fn test_shared_start_wider_end_removes_narrower() {
        let spans = vec![span(0.9, "a.rs", 5, 10, "narrow"), span(0.8, "a.rs", 5, 30, "wide")];

        let kept = remove_contained_spans(&spans);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].code_chunk, "wide");
    }

    #[test]
    fn test_identical_ranges_are_kept() {
        let spans = vec![span(0.9, "a.rs", 10, 20, "one"), span(0.4, "a.rs", 10, 20, "two")];

        let group = dedup_group("a.rs".to_string(), &spans);

        assert_eq!(group.spans.len(), 2);
        assert_eq!(group.duplicates_removed(), 0);
    }

    #[test]
    fn test_overlapping_but_not_contained_are_kept() {
        let spans = vec![span(0.9, "a.rs", 1, 10, "left"), span(0.8, "a.rs", 5, 15, "right")];

        assert_eq!(remove_contained_spans(&spans).len(), 2);
    }

    #[test]
    fn test_average_score() {
        let spans = vec![span(0.9, "a.rs", 1, 2, "x"), span(0.7, "a.rs", 3, 4, "y")];
        assert_eq!(format!("{:.3}", average_score(&spans)), "0.800");
    }

    #[test]
    fn test_average_score_empty() {
        assert_eq!(average_score(&[]), 0.0);
    }

    #[test]
    fn test_scenario_contained_chunk() {
        let hits = vec![
            RawHit::new(0.95, "x.ts", 1, 10, "fn a(){}"),
            RawHit::new(0.80, "x.ts", 3, 5, "fn b(){}"),
        ];

        let report = aggregate(&hits, "code");
        let group = &report.files[0];

        assert_eq!(group.spans.len(), 1);
        assert_eq!(group.spans[0].code_chunk, "fn a(){}");
        assert_eq!(format!("{:.3}", group.average_score), "0.950");
        assert_eq!(group.duplicates_removed(), 1);
        assert!(report.text().starts_with("Found 2 results in 1 file from"));
        assert!(report.text().contains("(1 duplicates removed)"));
        assert!(!report.text().contains("fn b(){}"));
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let hits = vec![
            RawHit::new(0.95, "x.ts", 1, 10, "fn a(){}"),
            RawHit::new(0.80, "y.ts", 3, 5, "fn b(){}"),
            RawHit::default(),
        ];

        let first = aggregate(&hits, "c");
        let second = aggregate(&hits, "c");

        assert_eq!(first.text(), second.text());
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_payloads_group_under_unknown_file() {
        let hits = vec![RawHit::default(), RawHit::default()];

        let report = aggregate(&hits, "c");

        assert_eq!(report.file_count, 1);
        assert_eq!(report.files[0].file_path, "Unknown file");
        // Both default to 0-0, an identical range, so neither is removed
        assert_eq!(report.files[0].spans.len(), 2);
    }
}
