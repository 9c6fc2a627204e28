pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod indicators;
pub mod portfolio;
pub mod records;
pub mod series;
pub mod ui;

pub use error::{AppError, FetchError, Result};
pub use fetch::{CachedClient, FetchResult, QuoteClient};
pub use indicators::Indicator;
pub use series::{IndicatorSeries, PriceBar, PriceSeries, Symbol};
