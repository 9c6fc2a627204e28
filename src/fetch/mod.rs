use std::fmt;

use crate::error::FetchError;

pub mod cached;
pub mod client;
pub mod decode;
pub mod overview;
pub mod request;
pub mod transport;

pub use cached::CachedClient;
pub use client::QuoteClient;
pub use overview::CompanyOverview;
pub use request::{prepare_request, PreparedRequest, QueryShape};
pub use transport::{ReqwestTransport, Transport, TransportFuture};

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Label describing which arm a fetch ended in, for logs and status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    RateLimited,
    InvalidSymbol,
    TransportError,
}

impl FetchOutcome {
    pub fn of<T>(result: &FetchResult<T>) -> Self {
        match result {
            Ok(_) => FetchOutcome::Success,
            Err(FetchError::RateLimited(_)) => FetchOutcome::RateLimited,
            Err(FetchError::InvalidSymbol(_)) => FetchOutcome::InvalidSymbol,
            Err(FetchError::Transport(_)) => FetchOutcome::TransportError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Success => "success",
            FetchOutcome::RateLimited => "rate_limited",
            FetchOutcome::InvalidSymbol => "invalid_symbol",
            FetchOutcome::TransportError => "transport_error",
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[inline]
pub fn ensure_concurrency_limit(limit: usize) -> usize {
    limit.max(1)
}
