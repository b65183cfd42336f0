//! Bulk XML fetcher with idempotent on-disk caching.
//!
//! One XML document per title, cached at `{xml_dir}/title-{n}.xml`. A
//! nonzero-size cached file is reused unless the caller forces a
//! re-fetch, so a second run performs no network calls. Downloads are
//! written to a temporary path and renamed into place, so a partially
//! written file from an interrupted run is never mistaken for a valid
//! cache hit. Transient failures retry with exponential backoff; final
//! failure is reported to the orchestrator, not fatal to the batch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{PipelineError, PipelineResult};

/// Outcome of a successful fetch (or cache hit).
#[derive(Debug, Clone)]
pub struct Fetched {
    pub path: PathBuf,
    pub bytes: u64,
    /// True when the cached artifact was reused without a network call.
    pub cached: bool,
}

/// URL of one title's bulk XML document.
pub fn title_url(base_url: &str, title: u32) -> String {
    format!(
        "{}/title-{}/ECFR-title{}.xml",
        base_url.trim_end_matches('/'),
        title,
        title
    )
}

/// Delay before retry number `attempt` (zero-based): the base delay
/// doubling each attempt. Kept separate from the I/O loop so the policy
/// is testable on its own.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

/// Build the HTTP client used for all downloads in a run.
pub fn build_client(config: &FetchConfig) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Fetch one title's XML into `xml_dir`.
///
/// With `force == false` an existing nonzero-size file is a cache hit and
/// returns immediately. Otherwise the document is downloaded with up to
/// `max_retries` attempts, and a minimum inter-request delay is inserted
/// after every network download to bound the request rate.
pub async fn fetch_title(
    client: &reqwest::Client,
    config: &FetchConfig,
    xml_dir: &Path,
    title: u32,
    force: bool,
) -> PipelineResult<Fetched> {
    std::fs::create_dir_all(xml_dir).map_err(|e| PipelineError::Fetch {
        title,
        message: format!("cannot create {}: {}", xml_dir.display(), e),
    })?;

    let path = xml_dir.join(format!("title-{}.xml", title));

    if !force {
        if let Ok(meta) = std::fs::metadata(&path) {
            if meta.len() > 0 {
                return Ok(Fetched {
                    path,
                    bytes: meta.len(),
                    cached: true,
                });
            }
        }
    }

    let url = title_url(&config.base_url, title);
    let base = Duration::from_secs(config.retry_delay_secs);
    let mut last_error = String::new();

    for attempt in 0..config.max_retries {
        match download(client, &url, &path).await {
            Ok(bytes) => {
                tokio::time::sleep(config.request_delay()).await;
                return Ok(Fetched {
                    path,
                    bytes,
                    cached: false,
                });
            }
            Err(e) => {
                last_error = e;
                if attempt + 1 < config.max_retries {
                    tokio::time::sleep(backoff_delay(base, attempt)).await;
                }
            }
        }
    }

    Err(PipelineError::Fetch {
        title,
        message: format!(
            "{} after {} attempts: {}",
            url, config.max_retries, last_error
        ),
    })
}

/// One download attempt: GET, check status, write to a temporary path,
/// rename into place.
async fn download(client: &reqwest::Client, url: &str, path: &Path) -> Result<u64, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| e.to_string())?
        .error_for_status()
        .map_err(|e| e.to_string())?;

    let body = response.bytes().await.map_err(|e| e.to_string())?;
    if body.is_empty() {
        return Err("empty response body".to_string());
    }

    let tmp = path.with_extension("xml.tmp");
    std::fs::write(&tmp, &body).map_err(|e| e.to_string())?;
    std::fs::rename(&tmp, path).map_err(|e| e.to_string())?;

    Ok(body.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;

    fn no_network_config() -> FetchConfig {
        FetchConfig {
            // Nothing listens here; any actual request fails fast.
            base_url: "http://127.0.0.1:1".to_string(),
            retry_delay_secs: 0,
            request_delay_secs: 0,
            timeout_secs: 2,
            ..FetchConfig::default()
        }
    }

    #[test]
    fn url_shape() {
        assert_eq!(
            title_url("https://www.govinfo.gov/bulkdata/ECFR", 7),
            "https://www.govinfo.gov/bulkdata/ECFR/title-7/ECFR-title7.xml"
        );
        assert_eq!(
            title_url("http://host/base/", 50),
            "http://host/base/title-50/ECFR-title50.xml"
        );
    }

    #[test]
    fn backoff_doubles() {
        let base = Duration::from_secs(10);
        assert_eq!(backoff_delay(base, 0), Duration::from_secs(10));
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(20));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(40));
    }

    #[tokio::test]
    async fn cache_hit_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let config = no_network_config();
        let path = dir.path().join("title-3.xml");
        std::fs::write(&path, b"<ECFR/>").unwrap();

        let client = build_client(&config).unwrap();
        let first = fetch_title(&client, &config, dir.path(), 3, false)
            .await
            .unwrap();
        assert!(first.cached);
        assert_eq!(first.bytes, 7);

        // Second call is identical: same size, still no network.
        let second = fetch_title(&client, &config, dir.path(), 3, false)
            .await
            .unwrap();
        assert!(second.cached);
        assert_eq!(second.bytes, first.bytes);
    }

    #[tokio::test]
    async fn zero_size_file_is_not_a_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let config = no_network_config();
        std::fs::write(dir.path().join("title-3.xml"), b"").unwrap();

        let client = build_client(&config).unwrap();
        let result = fetch_title(&client, &config, dir.path(), 3, false).await;
        assert!(matches!(result, Err(PipelineError::Fetch { title: 3, .. })));
    }

    #[tokio::test]
    async fn exhausted_retries_report_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = no_network_config();

        let client = build_client(&config).unwrap();
        let result = fetch_title(&client, &config, dir.path(), 9, true).await;
        match result {
            Err(PipelineError::Fetch { title, message }) => {
                assert_eq!(title, 9);
                assert!(message.contains("3 attempts"), "message: {}", message);
            }
            other => panic!("expected fetch error, got {:?}", other.map(|f| f.path)),
        }
        // No partial file left behind.
        assert!(!dir.path().join("title-9.xml").exists());
    }
}
