use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a resource URL is turned into a file name inside the cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiskNaming {
    /// SHA-256 of the full URL plus the original extension. Distinct URLs never share a file.
    #[default]
    UrlHash,
    /// Final path segment only. Two URLs ending in the same segment share one file.
    LastSegment,
}

/// Global configuration loaded from `~/.config/wvcache/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding cached resource files. Defaults to the XDG cache dir.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Prefix the host puts in front of the real scheme (`custom-` + `https://...`).
    pub scheme_marker: String,
    /// File naming strategy for the disk cache.
    #[serde(default)]
    pub disk_naming: DiskNaming,
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout in seconds (None = no limit).
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
    /// Maximum prefetch downloads in flight (None = one task per manifest entry).
    #[serde(default)]
    pub max_concurrent_prefetch: Option<usize>,
    /// Optional `User-Agent` sent with every request.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            scheme_marker: "custom-".to_string(),
            disk_naming: DiskNaming::UrlHash,
            connect_timeout_secs: 15,
            fetch_timeout_secs: Some(60),
            max_concurrent_prefetch: Some(8),
            user_agent: None,
        }
    }
}

impl CacheConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    /// Configured cache directory, or `~/.cache/wvcache/resources`.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        default_cache_dir()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("wvcache")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

pub fn default_cache_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("wvcache")?;
    Ok(xdg_dirs.get_cache_home().join("wvcache").join("resources"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CacheConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CacheConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file (e.g. `--config`).
pub fn load_from_path(path: &Path) -> Result<CacheConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: CacheConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
