//! Per-title persistence.
//!
//! Each processed title is one JSON artifact at
//! `{processed_dir}/title-{n}.json`, keyed by title number. Storing is an
//! upsert: the whole record is replaced on every successful re-process,
//! written to a temporary path and renamed so a reader never observes a
//! half-written record. Repeated stores of the same record are
//! idempotent. Each title is only ever written by the one worker assigned
//! to it, so there is no cross-worker contention on a key.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::models::ParsedTitle;

/// Path of one title's persisted record.
pub fn title_path(processed_dir: &Path, number: u32) -> PathBuf {
    processed_dir.join(format!("title-{}.json", number))
}

/// Path of the summary artifact.
pub fn summary_path(processed_dir: &Path) -> PathBuf {
    processed_dir.join("summary.json")
}

/// Upsert one title's record. Returns the path written.
pub fn store_title(processed_dir: &Path, title: &ParsedTitle) -> PipelineResult<PathBuf> {
    let path = title_path(processed_dir, title.number);
    let persist_err = |source: std::io::Error| PipelineError::Persist {
        title: title.number,
        path: path.clone(),
        source,
    };

    fs::create_dir_all(processed_dir).map_err(persist_err)?;

    let json = serde_json::to_vec_pretty(title).map_err(|e| {
        persist_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json).map_err(persist_err)?;
    fs::rename(&tmp, &path).map_err(persist_err)?;

    Ok(path)
}

/// Load one persisted title, if present.
pub fn load_title(processed_dir: &Path, number: u32) -> anyhow::Result<Option<ParsedTitle>> {
    let path = title_path(processed_dir, number);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let title = serde_json::from_str(&content)?;
    Ok(Some(title))
}

/// Load every persisted title record, sorted by title number. This is
/// the aggregator's input: the store's full current state, not just the
/// titles touched by the latest batch. Files that fail to deserialize
/// are skipped with a warning rather than failing the scan.
pub fn load_all_titles(processed_dir: &Path) -> anyhow::Result<Vec<ParsedTitle>> {
    let mut titles: Vec<ParsedTitle> = Vec::new();

    if !processed_dir.exists() {
        return Ok(titles);
    }

    for entry in fs::read_dir(processed_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with("title-") || !name.ends_with(".json") {
            continue;
        }
        let content = fs::read_to_string(entry.path())?;
        match serde_json::from_str::<ParsedTitle>(&content) {
            Ok(title) => titles.push(title),
            Err(e) => {
                eprintln!("Warning: skipping unreadable record {}: {}", name, e);
            }
        }
    }

    titles.sort_by_key(|t| t.number);
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dates, TitleMetrics};

    fn sample(number: u32) -> ParsedTitle {
        ParsedTitle {
            number,
            name: "Sample".to_string(),
            full_name: format!("Title {}: Sample", number),
            agencies: vec!["Sample Agency".to_string()],
            chapters: vec![],
            sections: vec![],
            dates: Dates {
                latest_amended_on: Some("2021-03-03".to_string()),
                processed_date: "2021-04-01".to_string(),
                ..Dates::default()
            },
            metrics: TitleMetrics::default(),
            source_url: "https://www.ecfr.gov/current/title-1".to_string(),
            source_file: String::new(),
        }
    }

    #[test]
    fn store_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let title = sample(4);
        store_title(dir.path(), &title).unwrap();

        let loaded = load_title(dir.path(), 4).unwrap().unwrap();
        assert_eq!(loaded, title);
        assert_eq!(load_title(dir.path(), 5).unwrap(), None);
    }

    #[test]
    fn store_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let title = sample(4);

        store_title(dir.path(), &title).unwrap();
        let once = fs::read(title_path(dir.path(), 4)).unwrap();

        store_title(dir.path(), &title).unwrap();
        let twice = fs::read(title_path(dir.path(), 4)).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut title = sample(4);
        store_title(dir.path(), &title).unwrap();

        title.name = "Renamed".to_string();
        store_title(dir.path(), &title).unwrap();

        let loaded = load_title(dir.path(), 4).unwrap().unwrap();
        assert_eq!(loaded.name, "Renamed");
        // Still exactly one record for the key.
        assert_eq!(load_all_titles(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn load_all_sorted_by_number() {
        let dir = tempfile::tempdir().unwrap();
        for n in [9, 2, 17] {
            store_title(dir.path(), &sample(n)).unwrap();
        }
        let all = load_all_titles(dir.path()).unwrap();
        let numbers: Vec<u32> = all.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![2, 9, 17]);
    }

    #[test]
    fn load_all_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_all_titles(dir.path()).unwrap().is_empty());
        assert!(load_all_titles(&dir.path().join("missing")).unwrap().is_empty());
    }
}
