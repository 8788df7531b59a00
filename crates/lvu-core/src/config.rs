use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::resolver::DEFAULT_MEDIA_HOST;
use crate::retry::{RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::scan::{
    DEFAULT_BLOCKER_CLASSES, DEFAULT_CONTAINER_SELECTORS, DEFAULT_PLACEHOLDER_SELECTORS,
};

/// Retry parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first failed load.
    pub max_retries: u32,
    /// Fixed delay before each retry, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
        }
    }
}

/// Selector overrides (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Selectors for poster placeholders.
    pub placeholders: Vec<String>,
    /// Selectors for containers emphasized after a swap.
    pub containers: Vec<String>,
    /// Class names of overlay elements to remove.
    pub blockers: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        let owned = |s: &[&str]| s.iter().map(|x| x.to_string()).collect();
        Self {
            placeholders: owned(DEFAULT_PLACEHOLDER_SELECTORS),
            containers: owned(DEFAULT_CONTAINER_SELECTORS),
            blockers: owned(DEFAULT_BLOCKER_CLASSES),
        }
    }
}

fn default_media_host() -> String {
    DEFAULT_MEDIA_HOST.to_string()
}

/// Global configuration loaded from `~/.config/lvu/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LvuConfig {
    /// Scheme and host serving the video files.
    #[serde(default = "default_media_host")]
    pub media_host: String,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional selector overrides; if missing, built-in defaults are used.
    #[serde(default)]
    pub selectors: Option<SelectorConfig>,
}

impl Default for LvuConfig {
    fn default() -> Self {
        Self {
            media_host: default_media_host(),
            retry: None,
            selectors: None,
        }
    }
}

impl LvuConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = self.retry.clone().unwrap_or_default();
        RetryPolicy {
            max_retries: retry.max_retries,
            delay: Duration::from_millis(retry.retry_delay_ms),
        }
    }

    /// Media host checked to be an absolute http(s) URL with a host, without
    /// a trailing slash.
    pub fn validated_media_host(&self) -> Result<String> {
        let parsed = url::Url::parse(&self.media_host)
            .with_context(|| format!("invalid media_host: {}", self.media_host))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("media_host must use http or https: {}", self.media_host);
        }
        if parsed.host_str().is_none() {
            bail!("media_host has no host: {}", self.media_host);
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            bail!("media_host must not carry a query or fragment: {}", self.media_host);
        }
        Ok(self.media_host.trim_end_matches('/').to_string())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("lvu")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LvuConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LvuConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<LvuConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: LvuConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
