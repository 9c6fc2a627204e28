use std::fmt;
use std::time::Duration;

use crate::config::{ApiFunction, OutputSize, ProviderConfig};
use crate::series::Symbol;

/// Parameters besides the symbol that change what the provider returns.
/// Together with the symbol this is the cache identity of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryShape {
    pub function: ApiFunction,
    pub output_size: Option<OutputSize>,
}

impl QueryShape {
    pub fn daily(function: ApiFunction, output_size: OutputSize) -> Self {
        Self {
            function,
            output_size: Some(output_size),
        }
    }

    pub fn overview() -> Self {
        Self {
            function: ApiFunction::Overview,
            output_size: None,
        }
    }
}

/// Fully resolved GET request, ready for a [`super::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
    pub timeout: Duration,
}

impl PreparedRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Renders the request as a URL with the API key masked, safe for logs.
impl fmt::Display for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)?;
        for (idx, (key, value)) in self.params.iter().enumerate() {
            let sep = if idx == 0 { '?' } else { '&' };
            let shown = if key == "apikey" { "***" } else { value.as_str() };
            write!(f, "{sep}{key}={shown}")?;
        }
        Ok(())
    }
}

pub fn prepare_request(
    provider: &ProviderConfig,
    symbol: &Symbol,
    shape: &QueryShape,
) -> PreparedRequest {
    let mut params = vec![
        ("function".to_string(), shape.function.as_str().to_string()),
        ("symbol".to_string(), symbol.as_str().to_string()),
        ("apikey".to_string(), provider.api_key.clone()),
    ];

    if let Some(size) = shape.output_size {
        params.push(("outputsize".to_string(), size.as_str().to_string()));
    }

    PreparedRequest {
        url: provider.base_url.clone(),
        params,
        timeout: provider.timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_request_carries_all_parameters() {
        let provider = ProviderConfig::new("secret");
        let symbol = Symbol::parse("msft").unwrap();
        let shape = QueryShape::daily(ApiFunction::DailyAdjusted, OutputSize::Compact);

        let request = prepare_request(&provider, &symbol, &shape);

        assert_eq!(request.url, "https://www.alphavantage.co/query");
        assert_eq!(request.param("function"), Some("TIME_SERIES_DAILY_ADJUSTED"));
        assert_eq!(request.param("symbol"), Some("MSFT"));
        assert_eq!(request.param("apikey"), Some("secret"));
        assert_eq!(request.param("outputsize"), Some("compact"));
        assert_eq!(request.timeout, Duration::from_secs(10));
    }

    #[test]
    fn overview_request_has_no_output_size() {
        let provider = ProviderConfig::new("secret");
        let symbol = Symbol::parse("IBM").unwrap();

        let request = prepare_request(&provider, &symbol, &QueryShape::overview());

        assert_eq!(request.param("function"), Some("OVERVIEW"));
        assert_eq!(request.param("outputsize"), None);
    }

    #[test]
    fn display_masks_api_key() {
        let provider = ProviderConfig::new("secret");
        let symbol = Symbol::parse("IBM").unwrap();
        let request = prepare_request(&provider, &symbol, &QueryShape::overview());

        let rendered = request.to_string();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("apikey=***"));
        assert!(rendered.starts_with("https://www.alphavantage.co/query?function=OVERVIEW"));
    }
}
