use crate::error::IndicatorError;

use super::ensure_input;

/// Smoothing factor for an exponential average spanning `window` bars.
pub fn smoothing_factor(window: usize) -> f64 {
    2.0 / (window as f64 + 1.0)
}

/// Exponential moving average with zero warm-up.
///
/// `ema[0] = values[0]`, then `ema[i] = α·values[i] + (1 - α)·ema[i - 1]`
/// with `α = 2 / (window + 1)`. Every position is defined.
pub fn calculate_ema(values: &[f64], window: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    ensure_input(values, window)?;
    Ok(ema_values(values, window).into_iter().map(Some).collect())
}

/// Raw recursion shared with MACD, which needs plain floats to chain averages.
pub(crate) fn ema_values(values: &[f64], window: usize) -> Vec<f64> {
    let alpha = smoothing_factor(window);
    let mut out = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;

    for &value in values {
        let next = match previous {
            None => value,
            Some(prev) => alpha * value + (1.0 - alpha) * prev,
        };
        out.push(next);
        previous = Some(next);
    }

    out
}
