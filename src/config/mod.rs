//! Configuration for the catalog pipeline
//!
//! Loaded from a TOML file; every tuning knob has a serde default so a
//! minimal config only needs source definitions. A missing config file is
//! created with defaults rather than treated as an error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::errors::{AppError, AppResult};

pub mod duration_serde;

/// Pipeline tuning: timeouts, retry policy and the probe concurrency ceiling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Total timeout for one catalog fetch
    #[serde(with = "duration_serde", default = "default_fetch_timeout")]
    pub fetch_timeout: Duration,
    /// Timeout for one liveness probe; kept well below the fetch timeout
    #[serde(with = "duration_serde", default = "default_probe_timeout")]
    pub probe_timeout: Duration,
    /// Maximum in-flight liveness probes across all sources
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
    /// Fetch attempts before a source is given up on
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff between fetch attempts (doubled per attempt, plus jitter)
    #[serde(with = "duration_serde", default = "default_retry_backoff")]
    pub retry_backoff: Duration,
    /// Where the generated catalog is written
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}
fn default_probe_concurrency() -> usize {
    50
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_backoff() -> Duration {
    Duration::from_millis(500)
}
fn default_output_path() -> PathBuf {
    PathBuf::from("catalog.json")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: default_fetch_timeout(),
            probe_timeout: default_probe_timeout(),
            probe_concurrency: default_probe_concurrency(),
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
            output_path: default_output_path(),
        }
    }
}

/// An Xtream Codes API source (credentialed vendor JSON API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XtreamSourceConfig {
    /// Provenance label, used for logging and dedup tie-breaks
    pub alias: String,
    /// Base host, scheme optional
    pub url: String,
    pub username: String,
    pub password: String,
    /// Dedup tie-break weight; higher wins when quality ties
    #[serde(default)]
    pub priority: u32,
}

/// A plaintext playlist source (M3U over HTTP)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSourceConfig {
    pub alias: String,
    pub url: String,
    #[serde(default)]
    pub priority: u32,
}

/// All configured catalog sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub xtream: Vec<XtreamSourceConfig>,
    #[serde(default)]
    pub playlist: Vec<PlaylistSourceConfig>,
}

impl SourcesConfig {
    pub fn is_empty(&self) -> bool {
        self.xtream.is_empty() && self.playlist.is_empty()
    }

    /// Aliases of every configured source, in declaration order
    pub fn aliases(&self) -> Vec<String> {
        self.xtream
            .iter()
            .map(|s| s.alias.clone())
            .chain(self.playlist.iter().map(|s| s.alias.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Config {
    pub fn load_from_file(config_file: &str) -> AppResult<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)
                .map_err(|e| AppError::configuration(format!("invalid config file: {e}")))
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)
                .map_err(|e| AppError::configuration(format!("cannot render defaults: {e}")))?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [[sources.playlist]]
            alias = "backup"
            url = "http://example.com/list.m3u"
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.pipeline.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.pipeline.probe_concurrency, 50);
        assert_eq!(config.sources.playlist.len(), 1);
        assert_eq!(config.sources.playlist[0].priority, 0);
    }

    #[test]
    fn probe_timeout_defaults_below_fetch_timeout() {
        let config = Config::default();
        assert!(config.pipeline.probe_timeout < config.pipeline.fetch_timeout);
    }

    #[test]
    fn full_source_definitions_parse() {
        let config: Config = toml::from_str(
            r#"
            [pipeline]
            fetch_timeout = "45s"
            probe_concurrency = 10

            [[sources.xtream]]
            alias = "main"
            url = "host:8080"
            username = "u"
            password = "p"
            priority = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.fetch_timeout, Duration::from_secs(45));
        assert_eq!(config.pipeline.probe_concurrency, 10);
        assert_eq!(config.sources.xtream[0].priority, 10);
        assert_eq!(config.sources.aliases(), vec!["main".to_string()]);
    }

    #[test]
    fn missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let config = Config::load_from_file(path_str).unwrap();
        assert!(config.sources.is_empty());
        assert!(path.exists());

        // Second load reads the file that was just written
        let reloaded = Config::load_from_file(path_str).unwrap();
        assert_eq!(
            reloaded.pipeline.probe_concurrency,
            config.pipeline.probe_concurrency
        );
    }
}
