use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the marketplace API; notification routes live under `/notifications`.
    /// Set via MARKET_API_URL. Default: http://localhost:8000/api/v1.
    pub api_url: String,
    /// Bearer token used by the CLI when `--token` is not given.
    pub api_token: Option<String>,
    /// Seconds between page-1 refetches while polling. Default: 10.
    pub poll_interval_secs: u64,
    /// Items requested per page. Default: 20.
    pub page_size: u32,
    /// Whole-request timeout for the HTTP client. Default: 30.
    pub http_timeout_secs: u64,
    /// Lifetime of entries in the query cache. Default: 60.
    pub cache_ttl_secs: u64,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from an arbitrary variable source. `load` passes the process env.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let api_url = lookup("MARKET_API_URL")
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(defaults.api_url);
    url::Url::parse(&api_url)
        .map_err(|e| anyhow::anyhow!("MARKET_API_URL '{}' is not a valid URL: {}", api_url, e))?;

    let cfg = Config {
        api_url,
        api_token: lookup("MARKET_API_TOKEN").filter(|v| !v.trim().is_empty()),
        poll_interval_secs: lookup("MARKET_POLL_INTERVAL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.poll_interval_secs),
        page_size: lookup("MARKET_PAGE_SIZE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.page_size),
        http_timeout_secs: lookup("MARKET_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.http_timeout_secs),
        cache_ttl_secs: lookup("MARKET_CACHE_TTL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.cache_ttl_secs),
    };

    if cfg.poll_interval_secs == 0 {
        anyhow::bail!("MARKET_POLL_INTERVAL_SECS must be at least 1");
    }
    if cfg.page_size == 0 {
        anyhow::bail!("MARKET_PAGE_SIZE must be at least 1");
    }

    Ok(cfg)
}
