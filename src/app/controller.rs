use std::path::Path;

use log::{info, warn};

use crate::cli::Commands;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::fetch::{CachedClient, FetchResult};
use crate::indicators::Indicator;
use crate::portfolio::{allocate, Weighting};
use crate::records::{export_csv, load_csv};
use crate::series::{PriceSeries, Symbol};
use crate::ui::{
    render_allocations, render_fetch_error, render_overview, render_technical, COMPANY_OVERVIEW,
    STOCK_DATA,
};

/// Runs one command against the cached provider client and returns the text
/// to show the user.
pub struct AppController {
    fetcher: CachedClient,
}

impl AppController {
    pub fn new(config: &Config) -> Result<Self> {
        let fetcher = CachedClient::new(config)?;
        Ok(Self::with_fetcher(fetcher))
    }

    pub fn with_fetcher(fetcher: CachedClient) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &CachedClient {
        &self.fetcher
    }

    pub async fn execute(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Overview { symbol } => self.overview(&symbol).await,
            Commands::Technical {
                symbol,
                indicator,
                window,
                rows,
                from_csv,
            } => {
                self.technical(&symbol, with_window(indicator, window), rows, from_csv.as_deref())
                    .await
            }
            Commands::Allocate {
                symbols,
                amount,
                weights,
            } => self.allocate(&symbols, amount, weights.unwrap_or_default()).await,
            Commands::Export {
                symbol,
                output,
                indicator,
                window,
            } => {
                let indicators: Vec<Indicator> = indicator
                    .into_iter()
                    .map(|ind| with_window(ind, window))
                    .collect();
                self.export(&symbol, &indicators, &output).await
            }
        }
    }

    async fn overview(&self, symbol: &str) -> Result<String> {
        let overview = user_facing(COMPANY_OVERVIEW, self.fetcher.overview(symbol).await)?;
        Ok(render_overview(&overview))
    }

    async fn technical(
        &self,
        symbol: &str,
        indicator: Indicator,
        rows: usize,
        from_csv: Option<&Path>,
    ) -> Result<String> {
        let mut series = match from_csv {
            Some(path) => {
                let symbol = user_facing(STOCK_DATA, Symbol::parse(symbol))?;
                load_csv(path, symbol)?
            }
            None => self.price_series(symbol).await?,
        };
        indicator.apply(&mut series)?;
        info!("computed {indicator} for {}", series.symbol());
        Ok(render_technical(&series, &indicator, rows))
    }

    async fn allocate(
        &self,
        raw_symbols: &[String],
        amount: f64,
        weighting: Weighting,
    ) -> Result<String> {
        let symbols = raw_symbols
            .iter()
            .map(|raw| user_facing(STOCK_DATA, Symbol::parse(raw)))
            .collect::<Result<Vec<_>>>()?;
        let allocations = allocate(&symbols, amount, &weighting)?;

        let latest_closes: Vec<Option<f64>> = self
            .fetcher
            .prices_many(&symbols)
            .await
            .into_iter()
            .map(|(symbol, result)| match result {
                Ok(series) => series.latest().map(|bar| bar.close),
                Err(err) => {
                    warn!("no price for {symbol}: {err}");
                    None
                }
            })
            .collect();

        Ok(render_allocations(&allocations, &latest_closes))
    }

    async fn export(
        &self,
        symbol: &str,
        indicators: &[Indicator],
        output: &Path,
    ) -> Result<String> {
        let mut series = self.price_series(symbol).await?;
        for indicator in indicators {
            indicator.apply(&mut series)?;
        }
        export_csv(&series, output)?;
        Ok(format!(
            "Saved {} rows for {} to {}",
            series.len(),
            series.symbol(),
            output.display()
        ))
    }

    /// Owned copy of the cached series, so indicator columns never leak into the cache.
    async fn price_series(&self, symbol: &str) -> Result<PriceSeries> {
        let shared = user_facing(STOCK_DATA, self.fetcher.prices(symbol).await)?;
        Ok(PriceSeries::clone(&shared))
    }
}

fn with_window(indicator: Indicator, window: Option<usize>) -> Indicator {
    match window {
        Some(window) => indicator.with_window(window),
        None => indicator,
    }
}

/// Turn a fetch failure into the message shown to the user, hint included.
fn user_facing<T>(subject: &str, result: FetchResult<T>) -> Result<T> {
    result.map_err(|err| AppError::message(render_fetch_error(subject, &err)))
}
