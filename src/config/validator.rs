use crate::error::{AppError, Result};

use super::Config;

/// Validate a loaded configuration and report every problem at once.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut issues = Vec::new();

    validate_provider(config, &mut issues);
    validate_fetch(config, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "configuration invalid:\n  - {}",
            issues.join("\n  - ")
        )))
    }
}

fn validate_provider(config: &Config, issues: &mut Vec<String>) {
    let provider = &config.provider;

    let base_url = provider.base_url.trim();
    if base_url.is_empty() {
        issues.push("provider.base_url must not be empty".to_string());
    } else if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        issues.push(format!(
            "provider.base_url must be an http(s) URL, got `{base_url}`"
        ));
    }

    if provider.api_key.trim().is_empty() {
        issues.push(format!(
            "provider.api_key is empty; set it in the config file, \
             the {} environment variable, or --api-key",
            super::API_KEY_ENV
        ));
    }

    if !provider.function.is_time_series() {
        issues.push("provider.function must select a daily time series".to_string());
    }

    if provider.timeout.is_zero() {
        issues.push("provider.timeout_secs must be greater than zero".to_string());
    }
}

fn validate_fetch(config: &Config, issues: &mut Vec<String>) {
    if config.fetch.concurrency_limit == 0 {
        issues.push("fetch.concurrency_limit must be at least 1".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiFunction;
    use std::time::Duration;

    #[test]
    fn accepts_defaults_with_key() {
        let config = Config::with_api_key("demo");
        validate_config(&config).expect("default config should be valid");
    }

    #[test]
    fn reports_all_issues_together() {
        let mut config = Config::with_api_key("  ");
        config.provider.base_url = "ftp://quotes".to_string();
        config.provider.timeout = Duration::ZERO;
        config.fetch.concurrency_limit = 0;

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("http(s) URL"), "unexpected message: {message}");
        assert!(message.contains("api_key"), "unexpected message: {message}");
        assert!(message.contains("timeout_secs"), "unexpected message: {message}");
        assert!(message.contains("concurrency_limit"), "unexpected message: {message}");
    }

    #[test]
    fn rejects_overview_as_price_function() {
        let mut config = Config::with_api_key("demo");
        config.provider.function = ApiFunction::Overview;

        let err = validate_config(&config).expect_err("validation should fail");
        assert!(
            err.to_string().contains("daily time series"),
            "unexpected error message: {err}"
        );
    }
}
