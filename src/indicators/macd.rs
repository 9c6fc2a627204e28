use crate::error::IndicatorError;

use super::ema::ema_values;
use super::ensure_input;

pub const FAST_WINDOW: usize = 12;
pub const SLOW_WINDOW: usize = 26;
pub const SIGNAL_WINDOW: usize = 9;

/// MACD line, its signal line, and the difference between them.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdResult {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// `MACD = EMA(12) - EMA(26)`, `Signal = EMA(9)` of the MACD line.
///
/// Both averages are zero warm-up, so every position is defined.
pub fn calculate_macd(values: &[f64]) -> Result<MacdResult, IndicatorError> {
    ensure_input(values, SLOW_WINDOW)?;

    let fast = ema_values(values, FAST_WINDOW);
    let slow = ema_values(values, SLOW_WINDOW);
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema_values(&line, SIGNAL_WINDOW);

    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(m, s)| Some(m - s))
        .collect();

    Ok(MacdResult {
        macd: line.into_iter().map(Some).collect(),
        signal: signal.into_iter().map(Some).collect(),
        histogram,
    })
}
