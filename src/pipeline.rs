//! Batch orchestration.
//!
//! Fans a list of title numbers out to bounded parallel workers, each
//! running the full per-title pipeline (fetch → parse → compute →
//! persist) inside its own task. A title moves through the states
//! Pending → Fetching → Parsing → Computing → Persisted, or Failed at any
//! stage; a failure is isolated to its own title and never cancels
//! siblings. During this phase no cross-title state is shared: each task
//! touches only its own cache file and its own persisted record. Once
//! every title has reached a terminal state (the join below is the
//! barrier), the aggregator runs exactly once, single-threaded, over the
//! full persisted set.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::error::{PipelineError, Stage};
use crate::fetch;
use crate::metrics;
use crate::models::{ParsedTitle, Summary};
use crate::parse::{self, ParseOptions};
use crate::progress::{ProgressReporter, TitleEvent};
use crate::store;
use crate::summary;

/// Terminal state of one title in a batch run.
#[derive(Debug, Clone)]
pub enum TitleOutcome {
    /// Persisted successfully. `cached` when the raw XML came from the
    /// on-disk cache; `reserved` when the title parsed to zero sections.
    Persisted { cached: bool, reserved: bool },
    Failed { stage: Stage, message: String },
}

impl TitleOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, TitleOutcome::Persisted { .. })
    }
}

/// Result of one batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// Per-title terminal state, keyed by title number.
    pub outcomes: BTreeMap<u32, TitleOutcome>,
    /// The freshly written summary, or `None` when aggregation found no
    /// persisted titles at all (the prior summary, if any, is untouched).
    pub summary: Option<Summary>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Run a full batch over `title_nums` with at most `max_workers` titles
/// in flight, then aggregate. Per-title failures are reported in the
/// result map, never propagated as an error of the run itself.
pub async fn run_batch(
    config: &Config,
    title_nums: &[u32],
    max_workers: usize,
    force: bool,
    progress: Arc<dyn ProgressReporter>,
) -> Result<BatchReport> {
    let client = fetch::build_client(&config.fetch)?;
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));

    let mut handles = Vec::with_capacity(title_nums.len());
    for &title in title_nums {
        let permit = semaphore.clone().acquire_owned().await?;
        let client = client.clone();
        let config = config.clone();
        let progress = progress.clone();

        handles.push((
            title,
            tokio::spawn(async move {
                let _permit = permit;
                process_title(&client, &config, title, force, progress.as_ref()).await
            }),
        ));
    }

    let mut outcomes = BTreeMap::new();
    for (title, handle) in handles {
        let outcome = match handle.await {
            Ok(Ok(done)) => {
                progress.report(TitleEvent::Done {
                    title,
                    cached: done.cached,
                });
                TitleOutcome::Persisted {
                    cached: done.cached,
                    reserved: done.reserved,
                }
            }
            Ok(Err(e)) => {
                let stage = e.stage();
                progress.report(TitleEvent::Failed { title, stage });
                eprintln!("Warning: {}", e);
                TitleOutcome::Failed {
                    stage,
                    message: e.to_string(),
                }
            }
            Err(e) => {
                // Task panicked or was cancelled; isolate like any other
                // per-title failure.
                progress.report(TitleEvent::Failed {
                    title,
                    stage: Stage::Computing,
                });
                eprintln!("Warning: task for title {} aborted: {}", title, e);
                TitleOutcome::Failed {
                    stage: Stage::Computing,
                    message: e.to_string(),
                }
            }
        };
        outcomes.insert(title, outcome);
    }

    // All titles are terminal; aggregate once over the store's full
    // current state, not just this batch.
    let processed_dir = config.processed_dir();
    let all_titles = store::load_all_titles(&processed_dir)?;
    let summary = match summary::summarize(&all_titles) {
        Ok(s) => {
            summary::write_summary(&processed_dir, &s)?;
            Some(s)
        }
        Err(e) => {
            eprintln!("Warning: {}", e);
            None
        }
    };

    Ok(BatchReport { outcomes, summary })
}

struct TitleDone {
    cached: bool,
    reserved: bool,
}

/// One title's pipeline, run entirely within its own task.
async fn process_title(
    client: &reqwest::Client,
    config: &Config,
    title: u32,
    force: bool,
    progress: &dyn ProgressReporter,
) -> Result<TitleDone, PipelineError> {
    progress.report(TitleEvent::Stage {
        title,
        stage: Stage::Fetching,
    });
    let fetched = fetch::fetch_title(client, &config.fetch, &config.xml_dir(), title, force).await?;

    progress.report(TitleEvent::Stage {
        title,
        stage: Stage::Parsing,
    });
    let raw = std::fs::read(&fetched.path).map_err(|e| PipelineError::Parse {
        title,
        message: format!("cannot read {}: {}", fetched.path.display(), e),
    })?;
    let xml = String::from_utf8_lossy(&raw);

    let options = ParseOptions {
        min_readability_len: config.metrics.min_readability_len,
        source_file: fetched.path.display().to_string(),
    };
    let mut parsed: ParsedTitle = parse::parse_title(&xml, title, &options)?;

    progress.report(TitleEvent::Stage {
        title,
        stage: Stage::Computing,
    });
    parsed.metrics = metrics::compute(&parsed);

    progress.report(TitleEvent::Stage {
        title,
        stage: Stage::Persisting,
    });
    store::store_title(&config.processed_dir(), &parsed)?;

    Ok(TitleDone {
        cached: fetched.cached,
        reserved: parsed.is_reserved(),
    })
}
