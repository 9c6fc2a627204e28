//! Technical indicators computed over the closing prices of a [`PriceSeries`].
//!
//! Every function returns values aligned by position with the input. Positions
//! without enough history are `None`; only an empty series is an error.

use std::fmt;
use std::str::FromStr;

use crate::error::IndicatorError;
use crate::series::{IndicatorSeries, PriceSeries};

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{calculate_bollinger, BollingerBands};
pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdResult};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

/// Default look-back used for the moving averages when none is given.
pub const DEFAULT_AVERAGE_WINDOW: usize = 20;

pub fn simple_moving_average(
    series: &PriceSeries,
    window: usize,
) -> Result<IndicatorSeries, IndicatorError> {
    let values = calculate_sma(&series.closes(), window)?;
    Ok(IndicatorSeries::new("SMA", values))
}

pub fn exponential_moving_average(
    series: &PriceSeries,
    window: usize,
) -> Result<IndicatorSeries, IndicatorError> {
    let values = calculate_ema(&series.closes(), window)?;
    Ok(IndicatorSeries::new("EMA", values))
}

/// Returns the `MACD`, `Signal` and `Histogram` columns, in that order.
pub fn macd(series: &PriceSeries) -> Result<Vec<IndicatorSeries>, IndicatorError> {
    let result = calculate_macd(&series.closes())?;
    Ok(vec![
        IndicatorSeries::new("MACD", result.macd),
        IndicatorSeries::new("Signal", result.signal),
        IndicatorSeries::new("Histogram", result.histogram),
    ])
}

pub fn relative_strength_index(
    series: &PriceSeries,
    window: usize,
) -> Result<IndicatorSeries, IndicatorError> {
    let values = calculate_rsi(&series.closes(), window)?;
    Ok(IndicatorSeries::new("RSI", values))
}

/// Returns the `Middle`, `Upper` and `Lower` band columns, in that order.
pub fn bollinger_bands(
    series: &PriceSeries,
    window: usize,
    k: f64,
) -> Result<Vec<IndicatorSeries>, IndicatorError> {
    let bands = calculate_bollinger(&series.closes(), window, k)?;
    Ok(vec![
        IndicatorSeries::new("Middle", bands.middle),
        IndicatorSeries::new("Upper", bands.upper),
        IndicatorSeries::new("Lower", bands.lower),
    ])
}

/// Indicator selection as offered to the user, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Indicator {
    Sma { window: usize },
    Ema { window: usize },
    Macd,
    Rsi { window: usize },
    Bollinger { window: usize, k: f64 },
}

impl Indicator {
    /// Replace the look-back window. MACD uses fixed windows and ignores this.
    pub fn with_window(self, window: usize) -> Self {
        match self {
            Indicator::Sma { .. } => Indicator::Sma { window },
            Indicator::Ema { .. } => Indicator::Ema { window },
            Indicator::Macd => Indicator::Macd,
            Indicator::Rsi { .. } => Indicator::Rsi { window },
            Indicator::Bollinger { k, .. } => Indicator::Bollinger { window, k },
        }
    }

    /// Names of the columns `apply` adds to a series.
    pub fn column_names(&self) -> &'static [&'static str] {
        match self {
            Indicator::Sma { .. } => &["SMA"],
            Indicator::Ema { .. } => &["EMA"],
            Indicator::Macd => &["MACD", "Signal", "Histogram"],
            Indicator::Rsi { .. } => &["RSI"],
            Indicator::Bollinger { .. } => &["Middle", "Upper", "Lower"],
        }
    }

    /// Whether the indicator is drawn on the price scale next to the closes.
    pub fn overlays_price(&self) -> bool {
        matches!(
            self,
            Indicator::Sma { .. } | Indicator::Ema { .. } | Indicator::Bollinger { .. }
        )
    }

    pub fn compute(&self, series: &PriceSeries) -> Result<Vec<IndicatorSeries>, IndicatorError> {
        match *self {
            Indicator::Sma { window } => Ok(vec![simple_moving_average(series, window)?]),
            Indicator::Ema { window } => Ok(vec![exponential_moving_average(series, window)?]),
            Indicator::Macd => macd(series),
            Indicator::Rsi { window } => Ok(vec![relative_strength_index(series, window)?]),
            Indicator::Bollinger { window, k } => bollinger_bands(series, window, k),
        }
    }

    /// Compute the indicator and append its columns to `series`.
    pub fn apply(&self, series: &mut PriceSeries) -> Result<(), IndicatorError> {
        for column in self.compute(series)? {
            series.push_column(column)?;
        }
        Ok(())
    }
}

impl FromStr for Indicator {
    type Err = IndicatorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(Indicator::Sma {
                window: DEFAULT_AVERAGE_WINDOW,
            }),
            "ema" => Ok(Indicator::Ema {
                window: DEFAULT_AVERAGE_WINDOW,
            }),
            "macd" => Ok(Indicator::Macd),
            "rsi" => Ok(Indicator::Rsi {
                window: rsi::DEFAULT_WINDOW,
            }),
            "bollinger" | "bollinger bands" | "bb" => Ok(Indicator::Bollinger {
                window: bollinger::DEFAULT_WINDOW,
                k: bollinger::DEFAULT_MULTIPLIER,
            }),
            other => Err(IndicatorError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Sma { window } => write!(f, "SMA({window})"),
            Indicator::Ema { window } => write!(f, "EMA({window})"),
            Indicator::Macd => f.write_str("MACD(12, 26, 9)"),
            Indicator::Rsi { window } => write!(f, "RSI({window})"),
            Indicator::Bollinger { window, k } => write!(f, "Bollinger Bands({window}, {k})"),
        }
    }
}

pub(crate) fn ensure_input(values: &[f64], window: usize) -> Result<(), IndicatorError> {
    if values.is_empty() {
        return Err(IndicatorError::EmptySeries);
    }
    if window == 0 {
        return Err(IndicatorError::InvalidWindow);
    }
    Ok(())
}

pub(crate) fn mean(slice: &[f64]) -> f64 {
    slice.iter().sum::<f64>() / slice.len() as f64
}

/// Apply `f` to every full trailing window; positions before the first full
/// window stay `None`.
pub(crate) fn rolling<F>(values: &[f64], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    for (offset, slice) in values.windows(window).enumerate() {
        out[offset + window - 1] = f(slice);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::fixtures::series_from_closes;

    #[test]
    fn parses_user_selection() {
        assert_eq!("SMA".parse::<Indicator>().unwrap(), Indicator::Sma { window: 20 });
        assert_eq!(" rsi ".parse::<Indicator>().unwrap(), Indicator::Rsi { window: 14 });
        assert_eq!(
            "Bollinger Bands".parse::<Indicator>().unwrap(),
            Indicator::Bollinger { window: 20, k: 2.0 }
        );
        assert!(matches!(
            "vwap".parse::<Indicator>(),
            Err(IndicatorError::Unknown(_))
        ));
    }

    #[test]
    fn with_window_keeps_macd_fixed() {
        assert_eq!(Indicator::Macd.with_window(5), Indicator::Macd);
        assert_eq!(
            Indicator::Bollinger { window: 20, k: 2.5 }.with_window(10),
            Indicator::Bollinger { window: 10, k: 2.5 }
        );
    }

    #[test]
    fn apply_appends_named_columns_without_touching_bars() {
        let closes: Vec<f64> = (10..=40).map(f64::from).collect();
        let mut series = series_from_closes(&closes);
        let before = series.bars().to_vec();

        Indicator::Macd.apply(&mut series).unwrap();
        Indicator::Bollinger { window: 20, k: 2.0 }
            .apply(&mut series)
            .unwrap();

        let names: Vec<&str> = series.columns().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["MACD", "Signal", "Histogram", "Middle", "Upper", "Lower"]);
        assert!(series.columns().iter().all(|c| c.len() == series.len()));
        assert_eq!(series.bars(), before.as_slice());
    }

    #[test]
    fn short_series_gets_warm_up_columns() {
        let mut series = series_from_closes(&[1.0, 2.0, 3.0]);
        Indicator::Sma { window: 20 }.apply(&mut series).unwrap();
        let sma = series.column("SMA").unwrap();
        assert_eq!(sma.warm_up_len(), 3);
    }

    #[test]
    fn empty_series_is_an_error() {
        let series = series_from_closes(&[]);
        assert_eq!(
            simple_moving_average(&series, 5),
            Err(IndicatorError::EmptySeries)
        );
        assert_eq!(macd(&series), Err(IndicatorError::EmptySeries));
    }

    #[test]
    fn rolling_handles_window_longer_than_input() {
        let out = rolling(&[1.0, 2.0], 3, |s| Some(mean(s)));
        assert_eq!(out, vec![None, None]);
    }
}
