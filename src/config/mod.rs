use std::fmt;
use std::time::Duration;

pub mod loader;
pub mod validator;

pub use loader::{expand_env_vars, load_config, ConfigOverrides, API_KEY_ENV};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
/// Default concurrency guard applied when several symbols are fetched at once.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// Provider endpoint selected through the `function` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiFunction {
    DailyAdjusted,
    Daily,
    Overview,
}

impl ApiFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiFunction::DailyAdjusted => "TIME_SERIES_DAILY_ADJUSTED",
            ApiFunction::Daily => "TIME_SERIES_DAILY",
            ApiFunction::Overview => "OVERVIEW",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TIME_SERIES_DAILY_ADJUSTED" => Some(ApiFunction::DailyAdjusted),
            "TIME_SERIES_DAILY" => Some(ApiFunction::Daily),
            "OVERVIEW" => Some(ApiFunction::Overview),
            _ => None,
        }
    }

    pub fn is_time_series(&self) -> bool {
        !matches!(self, ApiFunction::Overview)
    }
}

impl fmt::Display for ApiFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `compact` returns the latest 100 bars, `full` the whole history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputSize {
    #[default]
    Compact,
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(OutputSize::Compact),
            "full" => Some(OutputSize::Full),
            _ => None,
        }
    }
}

/// Everything needed to reach the quote provider. Passed explicitly to the
/// fetcher so tests can point it at a fake transport.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub function: ApiFunction,
    pub output_size: OutputSize,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            function: ApiFunction::DailyAdjusted,
            output_size: OutputSize::Compact,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub concurrency_limit: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub fetch: FetchConfig,
}

impl Config {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            provider: ProviderConfig::new(api_key),
            cache: CacheConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_names_parse_case_insensitively() {
        assert_eq!(
            ApiFunction::parse(" time_series_daily "),
            Some(ApiFunction::Daily)
        );
        assert_eq!(ApiFunction::parse("INTRADAY"), None);
        assert_eq!(OutputSize::parse("FULL"), Some(OutputSize::Full));
    }

    #[test]
    fn only_price_functions_are_time_series() {
        assert!(ApiFunction::DailyAdjusted.is_time_series());
        assert!(ApiFunction::Daily.is_time_series());
        assert!(!ApiFunction::Overview.is_time_series());
    }
}
