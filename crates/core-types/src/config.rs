//! TOML-backed application configuration with environment overrides.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{env, fs};

/// Which nearest-neighbor backend serves the approximate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Flat,
    Hnsw,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "hnsw" => Ok(Self::Hnsw),
            other => bail!("unknown backend '{other}' (expected flat or hnsw)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub dim: usize,
    pub backend: BackendKind,
    pub overfetch_multiplier: usize,
    pub ef_search: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dim: 128,
            backend: BackendKind::Flat,
            overfetch_multiplier: 20,
            ef_search: 100,
        }
    }
}

/// Graph construction parameters for the HNSW backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswConfig {
    pub max_degree: usize,
    pub ef_construction: usize,
    pub max_elements: usize,
    pub max_layer: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            max_degree: 16,
            ef_construction: 200,
            max_elements: 100_000,
            max_layer: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Optional log file; stderr only when unset.
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub index: IndexConfig,
    pub hnsw: HnswConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Reject values the index cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.index.dim == 0 {
            bail!("index.dim must be greater than zero");
        }
        if self.index.overfetch_multiplier == 0 {
            bail!("index.overfetch_multiplier must be greater than zero");
        }
        if self.index.ef_search == 0 {
            bail!("index.ef_search must be greater than zero");
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_var("MULTIVEC_DIM") {
            self.index.dim = v.parse().context("MULTIVEC_DIM")?;
        }
        if let Some(v) = env_var("MULTIVEC_BACKEND") {
            self.index.backend = v.parse()?;
        }
        if let Some(v) = env_var("MULTIVEC_OVERFETCH") {
            self.index.overfetch_multiplier = v.parse().context("MULTIVEC_OVERFETCH")?;
        }
        if let Some(v) = env_var("MULTIVEC_EF_SEARCH") {
            self.index.ef_search = v.parse().context("MULTIVEC_EF_SEARCH")?;
        }
        if let Some(v) = env_var("MULTIVEC_LOG_LEVEL") {
            self.logging.level = v;
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a config document without touching the environment.
pub fn parse_config(text: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(text).context("invalid config TOML")?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load configuration: `.env`, then the TOML file (defaults if absent), then
/// `MULTIVEC_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut cfg = match path {
        Some(p) if p.exists() => {
            let text = fs::read_to_string(p)
                .with_context(|| format!("failed to read config {}", p.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("invalid config TOML in {}", p.display()))?
        }
        _ => AppConfig::default(),
    };

    cfg.apply_env_overrides()?;
    cfg.validate()?;
    Ok(cfg)
}
