use crate::error::IndicatorError;

use super::{ensure_input, mean, rolling};

pub const DEFAULT_WINDOW: usize = 14;

/// Relative Strength Index over simple rolling averages of gains and losses.
///
/// The first bar has no prior close and counts as a zero gain and zero loss,
/// so the first defined value sits at index `window - 1`. A window with no
/// losses reads 100, flat windows included.
pub fn calculate_rsi(values: &[f64], window: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    ensure_input(values, window)?;

    let deltas: Vec<f64> = std::iter::once(0.0)
        .chain(values.windows(2).map(|pair| pair[1] - pair[0]))
        .collect();
    let gains: Vec<f64> = deltas.iter().map(|delta| delta.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|delta| (-delta).max(0.0)).collect();

    let avg_gains = rolling(&gains, window, |slice| Some(mean(slice)));
    let avg_losses = rolling(&losses, window, |slice| Some(mean(slice)));

    Ok(avg_gains
        .into_iter()
        .zip(avg_losses)
        .map(|(gain, loss)| Some(rsi_from_averages(gain?, loss?)))
        .collect())
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
