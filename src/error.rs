use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }
}

/// Failure taxonomy for a single provider call. Exactly one variant describes
/// why a fetch did not produce data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Provider quota exhausted. Surfaced to the caller, never retried here.
    #[error("{0}")]
    RateLimited(String),
    /// Unknown or unsupported ticker.
    #[error("{0}")]
    InvalidSymbol(String),
    /// Network failure, bad status, or a payload we could not make sense of.
    #[error("{0}")]
    Transport(String),
}

impl FetchError {
    pub fn message(&self) -> &str {
        match self {
            FetchError::RateLimited(msg)
            | FetchError::InvalidSymbol(msg)
            | FetchError::Transport(msg) => msg,
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::InvalidSymbol(_))
    }

    /// Short user-facing advice shown next to the raw provider message.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            FetchError::RateLimited(_) => {
                Some("You may have hit the API request limit. Try again later.")
            }
            FetchError::InvalidSymbol(_) => Some("Invalid ticker or unsupported stock symbol."),
            FetchError::Transport(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("cannot compute indicators over an empty price series")]
    EmptySeries,
    #[error("indicator window must be at least 1")]
    InvalidWindow,
    #[error("band multiplier must be finite and non-negative, got {0}")]
    InvalidMultiplier(f64),
    #[error("indicator `{name}` has {actual} values but the series has {expected} bars")]
    Misaligned {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("unknown indicator `{0}`")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    #[error("at least one symbol is required for an allocation")]
    NoSymbols,
    #[error("symbol `{0}` appears more than once")]
    DuplicateSymbol(String),
    #[error("investment amount must be a positive number, got {0}")]
    InvalidAmount(f64),
    #[error("expected {expected} weights, got {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },
    #[error("invalid weights: {0}")]
    InvalidWeights(String),
}
