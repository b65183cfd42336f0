//! Core data models for the ingestion pipeline.
//!
//! These types represent one parsed CFR title (the per-title persisted
//! record) and the cross-title summary artifact. Both serialize to the
//! JSON shapes consumed by the query API.

use serde::{Deserialize, Serialize};

/// One paragraph of section text. Paragraphs are stored arena-style: a
/// flat list per section where `parent` is an index into that same list
/// and `level` is the nesting depth, so nested extracts never become
/// recursive owning structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Identifier from the source, or a generated zero-based `p{i}`.
    pub identifier: String,
    pub content: String,
    /// Nesting depth; top-level paragraphs are level 1.
    pub level: u32,
    /// Index of the enclosing paragraph within the section, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

/// One section (DIV8) of a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub number: String,
    pub name: String,
    pub full_identifier: String,
    /// Concatenation of all descendant text, whitespace-normalized.
    pub content: String,
    pub word_count: u64,
    /// Reading-ease score of `content`; 0.0 for texts below the minimum
    /// scoring length.
    pub readability_score: f64,
    pub paragraphs: Vec<Paragraph>,
}

/// One chapter (DIV5) of a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub number: String,
    pub name: String,
    pub identifier: String,
    /// Agency names found nested under this chapter.
    pub agencies: Vec<String>,
}

/// Source dates extracted from the document, plus the processing stamp.
/// The three source dates are best-effort: absent markers leave them
/// unset, never guessed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_amended_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_issue_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_to_date_as_of: Option<String>,
    /// ISO date this record was produced.
    pub processed_date: String,
}

/// Derived counts for one title. Always recomputed from the section and
/// chapter lists, never set independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleMetrics {
    pub word_count: u64,
    pub section_count: u64,
    pub paragraph_count: u64,
    pub chapter_count: u64,
    /// Mean section reading-ease score; 0.0 when the title has no
    /// sections.
    pub readability_score: f64,
}

/// The full per-title record persisted to `processed/title-{n}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTitle {
    pub number: u32,
    pub name: String,
    pub full_name: String,
    pub agencies: Vec<String>,
    pub chapters: Vec<Chapter>,
    pub sections: Vec<Section>,
    pub dates: Dates,
    pub metrics: TitleMetrics,
    pub source_url: String,
    pub source_file: String,
}

impl ParsedTitle {
    /// True when the document parsed cleanly but contained no sections
    /// (reserved or placeholder titles). Distinct from a parse failure.
    pub fn is_reserved(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Projection of one title included in the summary artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleSummary {
    pub number: u32,
    pub name: String,
    pub agencies: Vec<String>,
    pub dates: Dates,
    pub metrics: TitleMetrics,
}

/// Min/max of each date kind across titles that have that date set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_amended: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_amended: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_update: Option<String>,
    pub processing_date: String,
}

/// Elementwise sums of every included title's metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalMetrics {
    pub word_count: u64,
    pub section_count: u64,
    pub paragraph_count: u64,
    pub chapter_count: u64,
}

/// The singleton cross-title summary, recomputed wholesale from the full
/// persisted set after each batch. Titles are sorted by number; the
/// agency map contains only agencies observed in at least one title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_titles: u64,
    pub titles: Vec<TitleSummary>,
    /// Agency name → number of titles mentioning it. BTreeMap keeps the
    /// serialized form deterministic.
    pub agencies: std::collections::BTreeMap<String, u64>,
    pub date_ranges: DateRanges,
    pub total_metrics: TotalMetrics,
}
