use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{FetchError, IndicatorError};

/// Upper-cased ticker symbol accepted by the quote provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Symbol(String);

impl Symbol {
    /// Normalise user input into a ticker. Rejects empty input and characters
    /// no listed ticker uses, before any network call is made.
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FetchError::InvalidSymbol(
                "ticker symbol must not be empty".to_string(),
            ));
        }

        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
        {
            return Err(FetchError::InvalidSymbol(format!(
                "ticker `{trimmed}` contains unsupported character `{bad}`"
            )));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One trading day of adjusted OHLCV data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Build a bar, checking that prices are finite, positive and that the
    /// high/low range encloses open and close.
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        adjusted_close: f64,
        volume: u64,
    ) -> Result<Self, String> {
        for (label, value) in [
            ("open", open),
            ("high", high),
            ("low", low),
            ("close", close),
            ("adjusted close", adjusted_close),
        ] {
            if !value.is_finite() {
                return Err(format!("{label} is not a finite number"));
            }
            if value <= 0.0 {
                return Err(format!("{label} must be positive, got {value}"));
            }
        }

        if high < open.max(close).max(low) {
            return Err(format!(
                "high {high} is below the open/close/low range"
            ));
        }
        if low > open.min(close).min(high) {
            return Err(format!("low {low} is above the open/close/high range"));
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            adjusted_close,
            volume,
        })
    }
}

/// Derived values aligned by position with the bars of a [`PriceSeries`].
/// `None` marks positions inside the warm-up window.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    name: String,
    values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Number of leading undefined positions.
    pub fn warm_up_len(&self) -> usize {
        self.values.iter().take_while(|value| value.is_none()).count()
    }

    pub fn last_defined(&self) -> Option<f64> {
        self.values.iter().rev().find_map(|value| *value)
    }
}

/// Daily bars for one symbol, ascending by date without duplicates.
///
/// The bars are fixed at construction; only indicator columns can be added
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: Symbol,
    bars: Vec<PriceBar>,
    columns: Vec<IndicatorSeries>,
}

impl PriceSeries {
    /// Sorts the bars by date and keeps the first bar seen for any repeated date.
    pub fn new(symbol: Symbol, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        bars.dedup_by_key(|bar| bar.date);
        Self {
            symbol,
            bars,
            columns: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|bar| bar.date).collect()
    }

    pub fn columns(&self) -> &[IndicatorSeries] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&IndicatorSeries> {
        self.columns.iter().find(|column| column.name() == name)
    }

    /// Append an indicator column, replacing any existing column of the same name.
    pub fn push_column(&mut self, column: IndicatorSeries) -> Result<(), IndicatorError> {
        if column.len() != self.bars.len() {
            return Err(IndicatorError::Misaligned {
                name: column.name().to_string(),
                expected: self.bars.len(),
                actual: column.len(),
            });
        }

        match self
            .columns
            .iter_mut()
            .find(|existing| existing.name() == column.name())
        {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn date(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    /// Series whose bars all open and close at the given prices.
    pub fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(idx, &close)| {
                PriceBar::new(date(idx as i64), close, close, close, close, close, 1_000).unwrap()
            })
            .collect();
        PriceSeries::new(Symbol::parse("TEST").unwrap(), bars)
    }
}
