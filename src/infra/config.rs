use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "substack-mcp.toml";

/// Limits for aggregated search. Every option and its default lives here so
/// the tool boundary validates once instead of at each call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: u32,
    pub max_limit: u32,
    pub max_in_flight: usize,
    pub source_timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 10,
            max_in_flight: 4,
            source_timeout_ms: 10_000,
        }
    }
}

impl SearchConfig {
    /// Clamp a caller-supplied per-source limit into `[1, max_limit]`.
    pub fn effective_limit(&self, requested: Option<i64>) -> usize {
        let max = i64::from(self.max_limit.max(1));
        requested.unwrap_or(i64::from(self.default_limit)).clamp(1, max) as usize
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
    pub retries: u32,
    pub profile_base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 2_000,
            timeout_ms: 8_000,
            retries: 1,
            profile_base_url: "https://substack.com".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    mode: Option<String>,
    port: Option<u16>,
    search: SearchConfig,
    client: ClientConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: String, // "server" or "stdio"
    pub port: u16,
    pub search: SearchConfig,
    pub client: ClientConfig,
}

impl Config {
    /// Environment only; built-in defaults for everything else.
    pub fn from_env() -> Self {
        Self::from_file_config(FileConfig::default())
    }

    /// Optional TOML file (`SUBSTACK_MCP_CONFIG`, else `substack-mcp.toml` if
    /// present), then environment overrides on top.
    pub fn from_env_and_toml() -> anyhow::Result<Self> {
        let file = match config_path() {
            Some(path) => load_file(&path)?,
            None => FileConfig::default(),
        };
        Ok(Self::from_file_config(file))
    }

    fn from_file_config(file: FileConfig) -> Self {
        let mode = std::env::var("MODE")
            .ok()
            .or(file.mode)
            .unwrap_or_else(|| "server".into());
        let port = env_parse("PORT").or(file.port).unwrap_or(8080);

        let mut search = file.search;
        if let Some(v) = env_parse("SEARCH_DEFAULT_LIMIT") {
            search.default_limit = v;
        }
        if let Some(v) = env_parse("SEARCH_MAX_LIMIT") {
            search.max_limit = v;
        }
        if let Some(v) = env_parse("SEARCH_MAX_IN_FLIGHT") {
            search.max_in_flight = v;
        }
        if let Some(v) = env_parse("SEARCH_SOURCE_TIMEOUT_MS") {
            search.source_timeout_ms = v;
        }

        let mut client = file.client;
        if let Some(v) = env_parse("HTTP_CONNECT_TIMEOUT_MS") {
            client.connect_timeout_ms = v;
        }
        if let Some(v) = env_parse("HTTP_TIMEOUT_MS") {
            client.timeout_ms = v;
        }
        if let Some(v) = env_parse("HTTP_RETRIES") {
            client.retries = v;
        }
        if let Ok(v) = std::env::var("SUBSTACK_PROFILE_BASE_URL") {
            if !v.trim().is_empty() {
                client.profile_base_url = v;
            }
        }

        Self { mode, port, search, client }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !matches!(self.mode.as_str(), "server" | "stdio") {
            bail!("Invalid MODE: {}. Must be 'server' or 'stdio'", self.mode);
        }
        if self.mode == "server" && self.port == 0 {
            bail!("PORT cannot be 0");
        }
        let s = &self.search;
        if s.max_limit == 0 {
            bail!("search.max_limit must be at least 1");
        }
        if s.default_limit == 0 || s.default_limit > s.max_limit {
            bail!(
                "search.default_limit must be within [1, {}], got {}",
                s.max_limit,
                s.default_limit
            );
        }
        if s.max_in_flight == 0 {
            bail!("search.max_in_flight must be at least 1");
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn config_path() -> Option<PathBuf> {
    match std::env::var("SUBSTACK_MCP_CONFIG") {
        Ok(p) if !p.trim().is_empty() => Some(PathBuf::from(p)),
        _ => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

fn load_file(path: &Path) -> anyhow::Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
}
