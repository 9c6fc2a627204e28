use crate::error::IndicatorError;

use super::{ensure_input, mean, rolling};

/// Arithmetic mean of the trailing `window` values, current value included.
///
/// The first `window - 1` positions are `None`. A series shorter than the
/// window yields all `None` rather than an error.
pub fn calculate_sma(values: &[f64], window: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    ensure_input(values, window)?;
    Ok(rolling(values, window, |slice| Some(mean(slice))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_matches_trailing_mean() {
        let closes: Vec<f64> = (10..=20).map(f64::from).collect();
        let sma = calculate_sma(&closes, 5).unwrap();

        assert_eq!(sma.len(), closes.len());
        assert!(sma[..4].iter().all(Option::is_none));
        assert_eq!(sma[4], Some(12.0));
        for i in 4..closes.len() {
            let expected = closes[i - 4..=i].iter().sum::<f64>() / 5.0;
            assert_eq!(sma[i], Some(expected));
        }
    }

    #[test]
    fn short_input_is_all_warm_up() {
        let sma = calculate_sma(&[1.0, 2.0, 3.0], 20).unwrap();
        assert_eq!(sma, vec![None, None, None]);
    }

    #[test]
    fn window_of_one_is_identity() {
        let sma = calculate_sma(&[4.0, 5.5], 1).unwrap();
        assert_eq!(sma, vec![Some(4.0), Some(5.5)]);
    }

    #[test]
    fn rejects_empty_input_and_zero_window() {
        assert_eq!(calculate_sma(&[], 3), Err(IndicatorError::EmptySeries));
        assert_eq!(calculate_sma(&[1.0], 0), Err(IndicatorError::InvalidWindow));
    }
}
