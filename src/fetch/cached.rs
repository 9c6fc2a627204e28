use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::debug;

use crate::cache::{CacheKey, Clock, QuoteCache, SystemClock};
use crate::config::Config;
use crate::series::{PriceSeries, Symbol};

use super::client::QuoteClient;
use super::overview::CompanyOverview;
use super::request::QueryShape;
use super::{ensure_concurrency_limit, FetchResult};

/// [`QuoteClient`] with TTL memoization of successful responses.
pub struct CachedClient {
    client: QuoteClient,
    prices: QuoteCache<PriceSeries>,
    overviews: QuoteCache<CompanyOverview>,
    concurrency_limit: usize,
}

impl CachedClient {
    pub fn new(config: &Config) -> FetchResult<Self> {
        let client = QuoteClient::new(config.provider.clone())?;
        Ok(Self::with_client(
            client,
            config,
            Arc::new(SystemClock),
        ))
    }

    pub fn with_client(client: QuoteClient, config: &Config, clock: Arc<dyn Clock>) -> Self {
        let ttl = config.cache.ttl;
        Self {
            client,
            prices: QuoteCache::with_clock(ttl, Arc::clone(&clock)),
            overviews: QuoteCache::with_clock(ttl, clock),
            concurrency_limit: ensure_concurrency_limit(config.fetch.concurrency_limit),
        }
    }

    pub fn client(&self) -> &QuoteClient {
        &self.client
    }

    pub fn price_cache(&self) -> &QuoteCache<PriceSeries> {
        &self.prices
    }

    pub fn overview_cache(&self) -> &QuoteCache<CompanyOverview> {
        &self.overviews
    }

    /// Daily bars for a raw symbol, served from cache while fresh.
    pub async fn prices(&self, symbol: &str) -> FetchResult<Arc<PriceSeries>> {
        let symbol = Symbol::parse(symbol)?;
        self.prices_for(&symbol).await
    }

    pub async fn prices_for(&self, symbol: &Symbol) -> FetchResult<Arc<PriceSeries>> {
        let key = CacheKey::new(symbol.clone(), self.client.price_shape());
        if let Some(hit) = self.prices.get(&key) {
            debug!("cache hit for {key}");
            return Ok(hit);
        }
        debug!("cache miss for {key}");

        let series = self.client.fetch_prices(symbol).await?;
        Ok(self.prices.insert(key, series))
    }

    pub async fn overview(&self, symbol: &str) -> FetchResult<Arc<CompanyOverview>> {
        let symbol = Symbol::parse(symbol)?;
        let key = CacheKey::new(symbol.clone(), QueryShape::overview());
        if let Some(hit) = self.overviews.get(&key) {
            debug!("cache hit for {key}");
            return Ok(hit);
        }
        debug!("cache miss for {key}");

        let overview = self.client.fetch_overview(&symbol).await?;
        Ok(self.overviews.insert(key, overview))
    }

    /// Fetch several symbols with at most `concurrency_limit` requests in
    /// flight. Results come back in input order, one per symbol.
    pub async fn prices_many(
        &self,
        symbols: &[Symbol],
    ) -> Vec<(Symbol, FetchResult<Arc<PriceSeries>>)> {
        let mut results: Vec<(usize, Symbol, FetchResult<Arc<PriceSeries>>)> =
            stream::iter(symbols.iter().cloned().enumerate())
                .map(|(idx, symbol)| async move {
                    let result = self.prices_for(&symbol).await;
                    (idx, symbol, result)
                })
                .buffer_unordered(self.concurrency_limit)
                .collect()
                .await;

        results.sort_by_key(|(idx, _, _)| *idx);
        results
            .into_iter()
            .map(|(_, symbol, result)| (symbol, result))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::ManualClock;
    use crate::error::FetchError;
    use crate::fetch::client::testing::{daily_body, ScriptedTransport};

    fn cached(
        transport: Arc<ScriptedTransport>,
        ttl_secs: u64,
    ) -> (CachedClient, Arc<ManualClock>) {
        let mut config = Config::with_api_key("key");
        config.cache.ttl = Duration::from_secs(ttl_secs);
        let client = QuoteClient::with_transport(config.provider.clone(), transport);
        let clock = Arc::new(ManualClock::new());
        (CachedClient::with_client(client, &config, clock.clone()), clock)
    }

    #[tokio::test]
    async fn second_call_within_ttl_is_served_from_cache() {
        let transport = Arc::new(ScriptedTransport::repeating(&daily_body(&[1.0, 2.0]), 2));
        let (client, clock) = cached(transport.clone(), 60);

        let first = client.prices("ibm").await.unwrap();
        clock.advance(Duration::from_secs(30));
        let second = client.prices("IBM").await.unwrap();

        assert_eq!(transport.call_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn expired_entry_triggers_new_request() {
        let transport = Arc::new(ScriptedTransport::repeating(&daily_body(&[1.0, 2.0]), 2));
        let (client, clock) = cached(transport.clone(), 60);

        client.prices("IBM").await.unwrap();
        clock.advance(Duration::from_secs(61));
        client.prices("IBM").await.unwrap();

        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(r#"{"Note": "slow down"}"#.to_string()),
            Ok(daily_body(&[3.0])),
        ]));
        let (client, _) = cached(transport.clone(), 60);

        assert!(matches!(
            client.prices("IBM").await,
            Err(FetchError::RateLimited(_))
        ));
        let series = client.prices("IBM").await.unwrap();

        assert_eq!(series.closes(), vec![3.0]);
        assert_eq!(transport.call_count(), 2);
        assert_eq!(client.price_cache().len(), 1);
    }

    #[tokio::test]
    async fn zero_ttl_always_hits_network() {
        let transport = Arc::new(ScriptedTransport::repeating(&daily_body(&[1.0]), 2));
        let (client, _) = cached(transport.clone(), 0);

        client.prices("IBM").await.unwrap();
        client.prices("IBM").await.unwrap();

        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn overview_and_prices_use_separate_keys() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(daily_body(&[1.0])),
            Ok(r#"{"Symbol": "IBM", "Name": "IBM"}"#.to_string()),
        ]));
        let (client, _) = cached(transport.clone(), 60);

        client.prices("IBM").await.unwrap();
        client.overview("IBM").await.unwrap();
        client.overview("IBM").await.unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(client.overview_cache().len(), 1);
    }

    #[tokio::test]
    async fn prices_many_keeps_input_order() {
        let transport = Arc::new(ScriptedTransport::repeating(&daily_body(&[5.0]), 3));
        let (client, _) = cached(transport.clone(), 60);
        let symbols: Vec<Symbol> = ["MSFT", "AAPL", "IBM"]
            .iter()
            .map(|s| Symbol::parse(s).unwrap())
            .collect();

        let results = client.prices_many(&symbols).await;

        let order: Vec<&str> = results.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["MSFT", "AAPL", "IBM"]);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(transport.call_count(), 3);
    }
}
