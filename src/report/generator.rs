//! Text report generation.
//!
//! This module renders deduplicated file groups into the plain-text summary
//! consumed by display layers, and serializes reports to JSON.

use crate::models::{ContentBlock, DedupedGroup, Report, ScoredSpan};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Separator placed between consecutive spans of the same file.
pub const SPAN_SEPARATOR: &str = "─────";

/// Code fence wrapped around each file's spans.
const CODE_FENCE: &str = "```";

/// Assemble a [`Report`] from already-deduplicated groups.
pub fn build_report(collection: &str, total_hits: usize, files: Vec<DedupedGroup>) -> Report {
    let text = if total_hits == 0 {
        render_empty(collection)
    } else {
        render_summary(collection, total_hits, &files)
    };

    Report {
        collection: collection.to_string(),
        total_hits,
        file_count: files.len(),
        files,
        content: vec![ContentBlock::text(text)],
    }
}

/// The fixed message for a query without hits.
pub fn render_empty(collection: &str) -> String {
    format!("No results found in Qdrant collection: \"{}\"", collection)
}

/// Generate the full summary: header line, then one block per file.
pub fn render_summary(collection: &str, total_hits: usize, files: &[DedupedGroup]) -> String {
    let mut sections = Vec::with_capacity(files.len() + 1);

    sections.push(render_summary_header(total_hits, files.len(), collection));
    sections.extend(files.iter().map(render_file_block));

    sections.join("\n\n")
}

/// Generate the `Found ... from Qdrant collection` line.
pub fn render_summary_header(total_hits: usize, file_count: usize, collection: &str) -> String {
    format!(
        "Found {} {} in {} {} from Qdrant collection: \"{}\"",
        total_hits,
        pluralize(total_hits, "result"),
        file_count,
        pluralize(file_count, "file"),
        collection
    )
}

/// Generate the block for a single file.
pub fn render_file_block(group: &DedupedGroup) -> String {
    let mut block = String::new();

    block.push_str(&render_file_header(group));
    block.push('\n');

    let chunks: Vec<String> = group.spans.iter().map(render_span).collect();
    let separator = format!("\n{}\n", SPAN_SEPARATOR);

    block.push_str(CODE_FENCE);
    block.push('\n');
    block.push_str(&chunks.join(&separator));
    block.push('\n');
    block.push_str(CODE_FENCE);

    block
}

/// Generate a file header: path, average score and count suffixes.
fn render_file_header(group: &DedupedGroup) -> String {
    let mut header = format!("{} (score: {:.3})", group.file_path, group.average_score);

    if group.spans.len() > 1 {
        header.push_str(&format!(" | {} snippets", group.spans.len()));
    }

    let removed = group.duplicates_removed();
    if removed > 0 {
        header.push_str(&format!(" ({} duplicates removed)", removed));
    }

    header
}

/// Generate a single span: line label (if any) followed by the code.
pub fn render_span(span: &ScoredSpan) -> String {
    let label = span.line_label();

    if label.is_empty() {
        span.code_chunk.clone()
    } else {
        format!("{}\n{}", label, span.code_chunk)
    }
}

fn pluralize(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// Generate the plain-text report.
pub fn generate_text_report(report: &Report) -> String {
    report.text().to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a rendered report to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;

    Ok(())
}
