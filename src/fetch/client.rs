use std::sync::Arc;

use log::{debug, info};

use crate::config::ProviderConfig;
use crate::series::{PriceSeries, Symbol};

use super::decode::decode_price_payload;
use super::overview::{decode_overview_payload, CompanyOverview};
use super::request::{prepare_request, QueryShape};
use super::transport::{ReqwestTransport, Transport};
use super::{FetchOutcome, FetchResult};

/// Uncached access to the quote provider. Every call issues exactly one request.
#[derive(Clone)]
pub struct QuoteClient {
    provider: ProviderConfig,
    transport: Arc<dyn Transport>,
}

impl QuoteClient {
    /// Build a client over the default reqwest transport, honouring the
    /// configured timeout.
    pub fn new(provider: ProviderConfig) -> FetchResult<Self> {
        let transport = ReqwestTransport::new(provider.timeout)?;
        Ok(Self::with_transport(provider, Arc::new(transport)))
    }

    pub fn with_transport(provider: ProviderConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            provider,
            transport,
        }
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Shape of the daily time-series request this client issues.
    pub fn price_shape(&self) -> QueryShape {
        QueryShape::daily(self.provider.function, self.provider.output_size)
    }

    /// Fetch daily bars for a raw, user-typed symbol.
    pub async fn fetch(&self, symbol: &str) -> FetchResult<PriceSeries> {
        let symbol = Symbol::parse(symbol)?;
        self.fetch_prices(&symbol).await
    }

    pub async fn fetch_prices(&self, symbol: &Symbol) -> FetchResult<PriceSeries> {
        let request = prepare_request(&self.provider, symbol, &self.price_shape());
        debug!("GET {request}");

        let result = match self.transport.get(&request).await {
            Ok(body) => decode_price_payload(symbol, &body),
            Err(err) => Err(err),
        };

        match &result {
            Ok(series) => info!("fetched {} daily bars for {symbol}", series.len()),
            Err(err) => info!(
                "price fetch for {symbol} ended in {}: {err}",
                FetchOutcome::of(&result)
            ),
        }
        result
    }

    pub async fn fetch_overview(&self, symbol: &Symbol) -> FetchResult<CompanyOverview> {
        let request = prepare_request(&self.provider, symbol, &QueryShape::overview());
        debug!("GET {request}");

        let body = self.transport.get(&request).await?;
        let result = decode_overview_payload(symbol, &body);
        if let Err(err) = &result {
            info!(
                "overview fetch for {symbol} ended in {}: {err}",
                FetchOutcome::of(&result)
            );
        }
        result
    }
}
