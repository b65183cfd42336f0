use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Base data directory. Raw XML lands in `{data_dir}/xml`, per-title
    /// records and the summary in `{data_dir}/processed`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff delay; doubles on each retry.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Minimum pause after every network download, cache misses included.
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    /// Texts shorter than this are not scored for readability; the score
    /// short-circuits to 0.0.
    #[serde(default = "default_min_readability_len")]
    pub min_readability_len: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_base_url() -> String {
    "https://www.govinfo.gov/bulkdata/ECFR".to_string()
}
fn default_user_agent() -> String {
    format!("ecfr-pipeline/{}", env!("CARGO_PKG_VERSION"))
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_secs() -> u64 {
    10
}
fn default_request_delay_secs() -> u64 {
    3
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_workers() -> usize {
    3
}
fn default_min_readability_len() -> usize {
    100
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            request_delay_secs: default_request_delay_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            min_readability_len: default_min_readability_len(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            fetch: FetchConfig::default(),
            pipeline: PipelineConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    pub fn xml_dir(&self) -> PathBuf {
        self.storage.data_dir.join("xml")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.storage.data_dir.join("processed")
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }
}

/// Load configuration from a TOML file. A missing file yields the
/// built-in defaults so the CLI works without any setup.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.pipeline.max_workers == 0 {
        anyhow::bail!("pipeline.max_workers must be > 0");
    }

    if config.fetch.max_retries == 0 {
        anyhow::bail!("fetch.max_retries must be > 0");
    }

    if config.fetch.base_url.is_empty() {
        anyhow::bail!("fetch.base_url must not be empty");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_config(Path::new("/nonexistent/ecfr.toml")).unwrap();
        assert_eq!(cfg.pipeline.max_workers, 3);
        assert_eq!(cfg.fetch.max_retries, 3);
        assert_eq!(cfg.metrics.min_readability_len, 100);
    }

    #[test]
    fn rejects_zero_workers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecfr.toml");
        std::fs::write(&path, "[pipeline]\nmax_workers = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_zero_retries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecfr.toml");
        std::fs::write(&path, "[fetch]\nmax_retries = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecfr.toml");
        std::fs::write(&path, "[storage]\ndata_dir = \"/tmp/ecfr-data\"\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.storage.data_dir, PathBuf::from("/tmp/ecfr-data"));
        assert_eq!(cfg.fetch.request_delay_secs, 3);
    }
}
