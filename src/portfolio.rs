//! Splitting an investment amount across symbols by percentage weight.

use std::collections::HashSet;
use std::str::FromStr;

use crate::error::AllocationError;
use crate::series::Symbol;

/// Custom weights must add up to 100 within this tolerance.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Weighting {
    #[default]
    Equal,
    /// Percentages, one per symbol, in symbol order.
    Custom(Vec<f64>),
}

impl FromStr for Weighting {
    type Err = AllocationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("equal") {
            return Ok(Weighting::Equal);
        }
        parse_weights(raw).map(Weighting::Custom)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub symbol: Symbol,
    pub weight_pct: f64,
    pub amount: f64,
}

impl Allocation {
    /// Whole shares affordable at `price`, if the price is usable.
    pub fn shares_at(&self, price: f64) -> Option<f64> {
        if price.is_finite() && price > 0.0 {
            Some((self.amount / price).floor())
        } else {
            None
        }
    }
}

/// Split `amount` across `symbols` according to `weighting`.
pub fn allocate(
    symbols: &[Symbol],
    amount: f64,
    weighting: &Weighting,
) -> Result<Vec<Allocation>, AllocationError> {
    if symbols.is_empty() {
        return Err(AllocationError::NoSymbols);
    }
    let mut seen = HashSet::with_capacity(symbols.len());
    for symbol in symbols {
        if !seen.insert(symbol) {
            return Err(AllocationError::DuplicateSymbol(symbol.to_string()));
        }
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AllocationError::InvalidAmount(amount));
    }

    let weights = match weighting {
        Weighting::Equal => vec![100.0 / symbols.len() as f64; symbols.len()],
        Weighting::Custom(weights) => {
            validate_weights(weights, symbols.len())?;
            weights.clone()
        }
    };

    Ok(symbols
        .iter()
        .zip(weights)
        .map(|(symbol, weight_pct)| Allocation {
            symbol: symbol.clone(),
            weight_pct,
            amount: amount * weight_pct / 100.0,
        })
        .collect())
}

/// Parse a comma-separated list of percentages such as `"50,30,20"`.
pub fn parse_weights(raw: &str) -> Result<Vec<f64>, AllocationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.trim_end_matches('%')
                .trim()
                .parse::<f64>()
                .map_err(|_| AllocationError::InvalidWeights(format!("`{part}` is not a number")))
        })
        .collect()
}

fn validate_weights(weights: &[f64], expected: usize) -> Result<(), AllocationError> {
    if weights.len() != expected {
        return Err(AllocationError::WeightCountMismatch {
            expected,
            actual: weights.len(),
        });
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(AllocationError::InvalidWeights(format!(
            "weight {bad} must be a finite, non-negative percentage"
        )));
    }
    let total: f64 = weights.iter().sum();
    if (total - 100.0).abs() > WEIGHT_TOLERANCE {
        return Err(AllocationError::InvalidWeights(format!(
            "weights sum to {total}, expected 100"
        )));
    }
    Ok(())
}
