//! Application configuration for noderank.
//!
//! User config lives at `~/.noderank/noderank.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NodeRankError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "noderank.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".noderank";

// ---------------------------------------------------------------------------
// Config structs (matching noderank.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream endpoints.
    #[serde(default)]
    pub source: SourceConfig,

    /// Worker pool settings.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Output file settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the ranked base list.
    #[serde(default = "default_list_url")]
    pub list_url: String,

    /// Base URL for per-node lookups; `<base>/<public_key>/json` is fetched.
    #[serde(default = "default_node_url_base")]
    pub node_url_base: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            list_url: default_list_url(),
            node_url_base: default_node_url_base(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_list_url() -> String {
    "https://nodes.lightning.computer/availability/v1/btc.json".into()
}
fn default_node_url_base() -> String {
    "https://1ml.com/node".into()
}
fn default_timeout_ms() -> u64 {
    2_000
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Number of enrichment workers. Unset means one per logical CPU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the aggregate JSON is written.
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> String {
    "web/data/export.json".into()
}

/// One worker per logical processor, falling back to a single worker.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration, passed explicitly to the coordinator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// URL of the ranked base list.
    pub list_url: Url,
    /// Base URL for per-node lookups.
    pub node_url_base: Url,
    /// Timeout applied to every single request.
    pub timeout: Duration,
    /// Size of the worker pool.
    pub workers: usize,
    /// Output file path.
    pub output_path: PathBuf,
}

impl PipelineConfig {
    /// Build and validate a runtime config from the file config.
    pub fn from_app(config: &AppConfig) -> Result<Self> {
        let pipeline = Self {
            list_url: parse_url("source.list_url", &config.source.list_url)?,
            node_url_base: parse_url("source.node_url_base", &config.source.node_url_base)?,
            timeout: Duration::from_millis(config.source.timeout_ms),
            workers: config.pipeline.workers.unwrap_or_else(default_worker_count),
            output_path: PathBuf::from(&config.output.path),
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Check invariants that CLI overrides could break.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(NodeRankError::validation("worker count must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(NodeRankError::validation("timeout must be greater than zero"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(NodeRankError::validation("output path must not be empty"));
        }
        Ok(())
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| NodeRankError::config(format!("{key}: invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(NodeRankError::config(format!(
            "{key}: unsupported scheme '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.noderank/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| NodeRankError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.noderank/noderank.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NodeRankError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NodeRankError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NodeRankError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| NodeRankError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NodeRankError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("list_url"));
        assert!(toml_str.contains("1ml.com"));
        assert!(!toml_str.contains("workers"));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let toml_str = r#"
[pipeline]
workers = 3

[output]
path = "/tmp/out.json"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.pipeline.workers, Some(3));
        assert_eq!(config.output.path, "/tmp/out.json");
        assert_eq!(config.source.timeout_ms, 2_000);
        assert_eq!(config.source.node_url_base, "https://1ml.com/node");
    }

    #[test]
    fn pipeline_config_from_defaults() {
        let pipeline = PipelineConfig::from_app(&AppConfig::default()).expect("valid defaults");
        assert_eq!(pipeline.timeout, Duration::from_secs(2));
        assert!(pipeline.workers >= 1);
        assert_eq!(pipeline.output_path, PathBuf::from("web/data/export.json"));
        assert_eq!(pipeline.list_url.host_str(), Some("nodes.lightning.computer"));
    }

    #[test]
    fn pipeline_config_rejects_zero_workers() {
        let mut app = AppConfig::default();
        app.pipeline.workers = Some(0);
        let err = PipelineConfig::from_app(&app).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn pipeline_config_rejects_bad_urls() {
        let mut app = AppConfig::default();
        app.source.node_url_base = "not a url".into();
        assert!(PipelineConfig::from_app(&app).is_err());

        app.source.node_url_base = "ftp://example.com/node".into();
        let err = PipelineConfig::from_app(&app).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }
}
