//! Cross-title aggregation.
//!
//! The summary is recomputed wholesale from the complete set of persisted
//! titles every time a batch finishes, never patched incrementally, so
//! it always reflects the store's true current state. Date ranges take
//! the lexicographic min/max of the ISO strings, which equals
//! chronological order. The artifact is written atomically; when there is
//! nothing to aggregate, no summary is written and any prior summary
//! remains authoritative.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{DateRanges, ParsedTitle, Summary, TitleSummary, TotalMetrics};
use crate::store::summary_path;

/// Build the summary over the full current set of titles. Errors when the
/// set is empty rather than emitting a misleading empty artifact.
pub fn summarize(titles: &[ParsedTitle]) -> PipelineResult<Summary> {
    if titles.is_empty() {
        return Err(PipelineError::Aggregation(
            "no successfully processed titles to summarize".to_string(),
        ));
    }

    let mut entries: Vec<TitleSummary> = titles
        .iter()
        .map(|t| TitleSummary {
            number: t.number,
            name: t.name.clone(),
            agencies: t.agencies.clone(),
            dates: t.dates.clone(),
            metrics: t.metrics.clone(),
        })
        .collect();
    entries.sort_by_key(|t| t.number);

    let mut agencies: BTreeMap<String, u64> = BTreeMap::new();
    let mut total = TotalMetrics::default();
    let mut ranges = DateRanges {
        processing_date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
        ..DateRanges::default()
    };

    for title in &entries {
        for agency in &title.agencies {
            *agencies.entry(agency.clone()).or_insert(0) += 1;
        }

        total.word_count += title.metrics.word_count;
        total.section_count += title.metrics.section_count;
        total.paragraph_count += title.metrics.paragraph_count;
        total.chapter_count += title.metrics.chapter_count;

        widen(
            &mut ranges.earliest_amended,
            &mut ranges.latest_amended,
            title.dates.latest_amended_on.as_deref(),
        );
        widen(
            &mut ranges.earliest_issue,
            &mut ranges.latest_issue,
            title.dates.latest_issue_date.as_deref(),
        );
        widen(
            &mut ranges.earliest_update,
            &mut ranges.latest_update,
            title.dates.up_to_date_as_of.as_deref(),
        );
    }

    Ok(Summary {
        total_titles: entries.len() as u64,
        titles: entries,
        agencies,
        date_ranges: ranges,
        total_metrics: total,
    })
}

/// Widen a min/max pair with one observed ISO date, ignoring unset dates.
fn widen(earliest: &mut Option<String>, latest: &mut Option<String>, date: Option<&str>) {
    let Some(date) = date else { return };
    if earliest.as_deref().map_or(true, |e| date < e) {
        *earliest = Some(date.to_string());
    }
    if latest.as_deref().map_or(true, |l| date > l) {
        *latest = Some(date.to_string());
    }
}

/// Write the summary artifact atomically (temp file, then rename).
pub fn write_summary(processed_dir: &Path, summary: &Summary) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(processed_dir)?;
    let path = summary_path(processed_dir);
    let json = serde_json::to_vec_pretty(summary)?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json)?;
    fs::rename(&tmp, &path)?;

    Ok(path)
}

/// Load the current summary artifact, if one has been written.
pub fn load_summary(processed_dir: &Path) -> anyhow::Result<Option<Summary>> {
    let path = summary_path(processed_dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dates, TitleMetrics};

    fn title(number: u32, words: u64, agencies: &[&str], amended: Option<&str>) -> ParsedTitle {
        ParsedTitle {
            number,
            name: format!("Title {}", number),
            full_name: format!("Title {}: Title {}", number, number),
            agencies: agencies.iter().map(|s| s.to_string()).collect(),
            chapters: vec![],
            sections: vec![],
            dates: Dates {
                latest_amended_on: amended.map(str::to_string),
                processed_date: "2024-01-01".to_string(),
                ..Dates::default()
            },
            metrics: TitleMetrics {
                word_count: words,
                section_count: 1,
                paragraph_count: 2,
                chapter_count: 1,
                readability_score: 40.0,
            },
            source_url: String::new(),
            source_file: String::new(),
        }
    }

    #[test]
    fn empty_input_is_aggregation_error() {
        assert!(matches!(
            summarize(&[]),
            Err(PipelineError::Aggregation(_))
        ));
    }

    #[test]
    fn totals_are_elementwise_sums() {
        let titles = vec![
            title(2, 100, &["A"], Some("2020-06-01")),
            title(1, 50, &["A", "B"], Some("2021-01-15")),
        ];
        let summary = summarize(&titles).unwrap();

        assert_eq!(summary.total_titles, 2);
        assert_eq!(summary.total_metrics.word_count, 150);
        assert_eq!(summary.total_metrics.section_count, 2);
        assert_eq!(summary.total_metrics.paragraph_count, 4);
        assert_eq!(summary.total_metrics.chapter_count, 2);
    }

    #[test]
    fn titles_sorted_ascending() {
        let titles = vec![title(9, 1, &[], None), title(3, 1, &[], None)];
        let summary = summarize(&titles).unwrap();
        let numbers: Vec<u32> = summary.titles.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![3, 9]);
    }

    #[test]
    fn agency_counts_only_observed() {
        let titles = vec![
            title(1, 1, &["A", "B"], None),
            title(2, 1, &["A"], None),
            title(3, 1, &[], None),
        ];
        let summary = summarize(&titles).unwrap();
        assert_eq!(summary.agencies.get("A"), Some(&2));
        assert_eq!(summary.agencies.get("B"), Some(&1));
        assert_eq!(summary.agencies.len(), 2);
    }

    #[test]
    fn date_ranges_only_over_set_dates() {
        let titles = vec![
            title(1, 1, &[], Some("2021-01-15")),
            title(2, 1, &[], None),
            title(3, 1, &[], Some("2019-12-31")),
        ];
        let summary = summarize(&titles).unwrap();
        let ranges = &summary.date_ranges;

        assert_eq!(ranges.earliest_amended.as_deref(), Some("2019-12-31"));
        assert_eq!(ranges.latest_amended.as_deref(), Some("2021-01-15"));
        assert_eq!(ranges.earliest_issue, None);
        assert_eq!(ranges.latest_issue, None);

        for t in &titles {
            if let Some(d) = &t.dates.latest_amended_on {
                assert!(ranges.earliest_amended.as_deref().unwrap() <= d.as_str());
                assert!(ranges.latest_amended.as_deref().unwrap() >= d.as_str());
            }
        }
    }

    #[test]
    fn summary_is_deterministic() {
        let titles = vec![
            title(5, 10, &["B", "A"], Some("2020-02-02")),
            title(4, 20, &["A"], Some("2021-11-11")),
        ];
        let a = serde_json::to_vec(&summarize(&titles).unwrap()).unwrap();
        let b = serde_json::to_vec(&summarize(&titles).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn write_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let summary = summarize(&[title(1, 5, &["A"], None)]).unwrap();
        write_summary(dir.path(), &summary).unwrap();

        let loaded = load_summary(dir.path()).unwrap().unwrap();
        assert_eq!(loaded, summary);
        assert!(load_summary(&dir.path().join("nope")).unwrap().is_none());
    }

    #[test]
    fn zero_section_title_still_included() {
        let mut reserved = title(35, 0, &[], None);
        reserved.metrics = TitleMetrics::default();
        let summary = summarize(&[reserved]).unwrap();
        assert_eq!(summary.total_titles, 1);
        assert_eq!(summary.titles[0].number, 35);
        assert_eq!(summary.total_metrics.word_count, 0);
    }
}
