use crate::error::IndicatorError;

use super::{ensure_input, mean, rolling};

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Middle band (SMA) with upper/lower bands `k` sample deviations away.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Bollinger Bands using the sample standard deviation (n - 1 denominator).
///
/// A one-bar window has no sample deviation, so its bands stay undefined
/// while the middle band is still reported.
pub fn calculate_bollinger(
    values: &[f64],
    window: usize,
    k: f64,
) -> Result<BollingerBands, IndicatorError> {
    ensure_input(values, window)?;
    if !k.is_finite() || k < 0.0 {
        return Err(IndicatorError::InvalidMultiplier(k));
    }

    let middle = rolling(values, window, |slice| Some(mean(slice)));
    let deviation = rolling(values, window, sample_std);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&deviation)
            .map(|(m, sd)| match (m, sd) {
                (Some(m), Some(sd)) => Some(m + sign * k * sd),
                _ => None,
            })
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    Ok(BollingerBands {
        middle,
        upper,
        lower,
    })
}

fn sample_std(slice: &[f64]) -> Option<f64> {
    if slice.len() < 2 {
        return None;
    }
    let m = mean(slice);
    let variance = slice.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (slice.len() - 1) as f64;
    Some(variance.sqrt())
}
