//! Data models for search-hit aggregation.
//!
//! This module contains the core data structures used throughout
//! the application: raw hits as returned by Qdrant, the normalized spans
//! derived from them, the per-file groups and the final report.

use serde::{Deserialize, Serialize};

/// Score assigned to hits that carry none (e.g. scroll results).
pub const DEFAULT_SCORE: f64 = 1.0;

/// Path assigned to hits whose payload has no `filePath`.
pub const UNKNOWN_FILE: &str = "Unknown file";

/// Chunk text assigned to hits whose payload has no `codeChunk`.
pub const NO_CONTENT: &str = "No content available";

/// Payload stored alongside each indexed code chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitPayload {
    /// Path of the source file the chunk was cut from.
    #[serde(default)]
    pub file_path: Option<String>,
    /// First line of the chunk.
    #[serde(default)]
    pub start_line: Option<i64>,
    /// Last line of the chunk.
    #[serde(default)]
    pub end_line: Option<i64>,
    /// Raw source text of the chunk.
    #[serde(default)]
    pub code_chunk: Option<String>,
}

/// One item returned by a Qdrant search or scroll call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    /// Point id (integer or UUID string). Not used for aggregation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Similarity score; absent for scroll results.
    #[serde(default)]
    pub score: Option<f64>,
    /// Chunk payload; absent when the point was stored without one.
    #[serde(default)]
    pub payload: Option<HitPayload>,
}

impl RawHit {
    /// Creates a hit with a fully populated payload.
    #[allow(dead_code)] // Convenience constructor, mostly for tests
    pub fn new(score: f64, file_path: &str, start_line: i64, end_line: i64, code: &str) -> Self {
        Self {
            id: None,
            score: Some(score),
            payload: Some(HitPayload {
                file_path: Some(file_path.to_string()),
                start_line: Some(start_line),
                end_line: Some(end_line),
                code_chunk: Some(code.to_string()),
            }),
        }
    }
}

/// Normalized projection of a [`RawHit`] with every default applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSpan {
    /// Similarity score.
    pub score: f64,
    /// Source file path.
    pub file_path: String,
    /// First line of the span.
    pub start_line: i64,
    /// Last line of the span.
    pub end_line: i64,
    /// Code text of the span.
    pub code_chunk: String,
}

impl From<&RawHit> for ScoredSpan {
    fn from(hit: &RawHit) -> Self {
        let payload = hit.payload.as_ref();

        Self {
            score: hit.score.unwrap_or(DEFAULT_SCORE),
            file_path: payload
                .and_then(|p| p.file_path.clone())
                .unwrap_or_else(|| UNKNOWN_FILE.to_string()),
            start_line: payload.and_then(|p| p.start_line).unwrap_or(0),
            end_line: payload.and_then(|p| p.end_line).unwrap_or(0),
            code_chunk: payload
                .and_then(|p| p.code_chunk.clone())
                .unwrap_or_else(|| NO_CONTENT.to_string()),
        }
    }
}

impl ScoredSpan {
    /// Returns the `L<start>-<end>` label, or an empty string when either
    /// line is missing.
    pub fn line_label(&self) -> String {
        if self.start_line != 0 && self.end_line != 0 {
            format!("L{}-{}", self.start_line, self.end_line)
        } else {
            String::new()
        }
    }

    /// True when `self` covers `other`'s range without being the same range.
    pub fn contains(&self, other: &ScoredSpan) -> bool {
        let same_range = self.start_line == other.start_line && self.end_line == other.end_line;
        !same_range && self.start_line <= other.start_line && self.end_line >= other.end_line
    }
}

/// The spans of one file that survived containment dedup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupedGroup {
    /// Source file path shared by every span.
    pub file_path: String,
    /// Surviving spans, ordered by start line.
    pub spans: Vec<ScoredSpan>,
    /// Number of spans in the group before dedup.
    pub raw_count: usize,
    /// Mean score of the surviving spans (0 when none survive).
    pub average_score: f64,
}

impl DedupedGroup {
    /// Number of spans dropped by dedup.
    pub fn duplicates_removed(&self) -> usize {
        self.raw_count.saturating_sub(self.spans.len())
    }
}

/// A single block of report content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Always `"text"`.
    #[serde(rename = "type")]
    pub block_type: String,
    /// Rendered text.
    pub text: String,
}

impl ContentBlock {
    /// Creates a text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            block_type: "text".to_string(),
            text: text.into(),
        }
    }
}

/// The aggregated, rendered result of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Collection the hits came from (display only).
    pub collection: String,
    /// Number of raw hits handed to the aggregator.
    pub total_hits: usize,
    /// Number of distinct files among the hits.
    pub file_count: usize,
    /// Per-file groups in first-seen order.
    pub files: Vec<DedupedGroup>,
    /// Exactly one text block holding the summary.
    pub content: Vec<ContentBlock>,
}

impl Report {
    /// Returns the summary text.
    pub fn text(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or("")
    }

    /// True when no hits were aggregated.
    pub fn is_empty(&self) -> bool {
        self.total_hits == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_span_defaults() {
        let hit: RawHit = serde_json::from_str(r#"{"payload": {}}"#).unwrap();
        let span = ScoredSpan::from(&hit);

        assert_eq!(span.score, 1.0);
        assert_eq!(span.file_path, "Unknown file");
        assert_eq!(span.start_line, 0);
        assert_eq!(span.end_line, 0);
        assert_eq!(span.code_chunk, "No content available");
    }

    #[test]
    fn test_scored_span_missing_payload_and_null_score() {
        let hit: RawHit = serde_json::from_str(r#"{"id": 7, "score": null}"#).unwrap();
        let span = ScoredSpan::from(&hit);

        assert_eq!(span.score, 1.0);
        assert_eq!(span.file_path, UNKNOWN_FILE);
        assert_eq!(span.code_chunk, NO_CONTENT);
    }

    #[test]
    fn test_scored_span_from_camel_case_payload() {
        let json = r#"{
            "id": "2b1c6f4e-0000-0000-0000-000000000000",
            "score": 0.42,
            "payload": {
                "filePath": "src/lib.rs",
                "startLine": 3,
                "endLine": 9,
                "codeChunk": "pub fn x() {}",
                "language": "rust"
            }
        }"#;
        let hit: RawHit = serde_json::from_str(json).unwrap();
        let span = ScoredSpan::from(&hit);

        assert_eq!(span.score, 0.42);
        assert_eq!(span.file_path, "src/lib.rs");
        assert_eq!(span.start_line, 3);
        assert_eq!(span.end_line, 9);
        assert_eq!(span.code_chunk, "pub fn x() {}");
    }

    #[test]
    fn test_line_label() {
        let span = ScoredSpan::from(&RawHit::new(0.5, "a.rs", 10, 15, "x"));
        assert_eq!(span.line_label(), "L10-15");

        let no_end = ScoredSpan {
            end_line: 0,
            ..span.clone()
        };
        assert_eq!(no_end.line_label(), "");
    }

    #[test]
    fn test_contains_excludes_identical_range() {
        let outer = ScoredSpan::from(&RawHit::new(0.9, "a.rs", 1, 50, "outer"));
        let inner = ScoredSpan::from(&RawHit::new(0.8, "a.rs", 10, 20, "inner"));
        let twin = ScoredSpan::from(&RawHit::new(0.1, "a.rs", 1, 50, "twin"));

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(!outer.contains(&twin));
        assert!(!twin.contains(&outer));
    }

    #[test]
    fn test_content_block_shape() {
        let block = ContentBlock::text("hello");
        let json = serde_json::to_value(&block).unwrap();

        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hello");
    }
}
