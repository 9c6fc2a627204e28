use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, Context, Result};

use super::{
    validator, ApiFunction, CacheConfig, Config, FetchConfig, OutputSize, ProviderConfig,
    DEFAULT_BASE_URL, DEFAULT_CACHE_TTL, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_TIMEOUT,
};

/// Environment variable consulted when neither the file nor the CLI sets a key.
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

/// Values supplied on the command line; they win over the file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub output_size: Option<String>,
}

/// Load the JSON configuration at `path` (or defaults when `None`), apply the
/// environment fallback and CLI overrides, then validate the result.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config> {
    let raw = match path {
        Some(path) => read_raw_config(path)?,
        None => RawConfig::default(),
    };

    let mut config = raw.into_config()?;

    if config.provider.api_key.trim().is_empty() {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.provider.api_key = key;
        }
    }

    if let Some(key) = &overrides.api_key {
        config.provider.api_key = key.clone();
    }

    if let Some(size) = &overrides.output_size {
        config.provider.output_size = OutputSize::parse(size).ok_or_else(|| {
            AppError::message(format!("unsupported output size `{size}`"))
        })?;
    }

    validator::validate_config(&config)?;
    Ok(config)
}

fn read_raw_config(path: &Path) -> Result<RawConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config JSON at {}", path.display()))?;

    let raw: RawConfig = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse config JSON at {}", path.display()))?;

    Ok(raw)
}

/// Replace `${NAME}` placeholders with the value of the named environment variable.
pub fn expand_env_vars(value: &str) -> Result<String> {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            while let Some(&next) = chars.peek() {
                chars.next();
                if next == '}' {
                    closed = true;
                    break;
                }
                name.push(next);
            }

            if name.is_empty() {
                return Err(AppError::message(
                    "Encountered empty environment placeholder in config value",
                ));
            }

            if !closed {
                return Err(AppError::message(
                    "Unterminated environment placeholder in config value",
                ));
            }

            let value = std::env::var(&name).with_context(|| {
                format!("Environment variable {} required by config is not set", name)
            })?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    provider: RawProviderConfig,
    #[serde(default)]
    cache: RawCacheConfig,
    #[serde(default)]
    fetch: RawFetchConfig,
}

impl RawConfig {
    fn into_config(self) -> Result<Config> {
        Ok(Config {
            provider: self.provider.into_provider_config()?,
            cache: self.cache.into_cache_config(),
            fetch: self.fetch.into_fetch_config(),
        })
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawProviderConfig {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    function: Option<String>,
    #[serde(default)]
    output_size: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl RawProviderConfig {
    fn into_provider_config(self) -> Result<ProviderConfig> {
        let base_url = match self.base_url {
            Some(url) => expand_env_vars(&url)?,
            None => DEFAULT_BASE_URL.to_string(),
        };

        let api_key = match self.api_key {
            Some(key) => expand_env_vars(&key)?,
            None => String::new(),
        };

        let function = match self.function {
            Some(name) => ApiFunction::parse(&name).ok_or_else(|| {
                AppError::message(format!("unsupported provider.function `{name}`"))
            })?,
            None => ApiFunction::DailyAdjusted,
        };

        let output_size = match self.output_size {
            Some(size) => OutputSize::parse(&size).ok_or_else(|| {
                AppError::message(format!("unsupported provider.output_size `{size}`"))
            })?,
            None => OutputSize::default(),
        };

        let timeout = self
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(ProviderConfig {
            base_url,
            api_key,
            function,
            output_size,
            timeout,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawCacheConfig {
    #[serde(default)]
    ttl_secs: Option<u64>,
}

impl RawCacheConfig {
    fn into_cache_config(self) -> CacheConfig {
        CacheConfig {
            ttl: self
                .ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CACHE_TTL),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawFetchConfig {
    #[serde(default)]
    concurrency_limit: Option<usize>,
}

impl RawFetchConfig {
    fn into_fetch_config(self) -> FetchConfig {
        FetchConfig {
            concurrency_limit: self.concurrency_limit.unwrap_or(DEFAULT_CONCURRENCY_LIMIT),
        }
    }
}
