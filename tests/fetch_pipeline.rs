use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stock_dash::cache::ManualClock;
use stock_dash::config::Config;
use stock_dash::fetch::{PreparedRequest, Transport, TransportFuture};
use stock_dash::indicators::Indicator;
use stock_dash::{CachedClient, FetchError, QuoteClient};

/// Answers every request with the same body and counts calls.
struct FixedTransport {
    body: String,
    calls: AtomicUsize,
}

impl FixedTransport {
    fn new(body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            body: body.into(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for FixedTransport {
    fn get<'a>(&'a self, _request: &'a PreparedRequest) -> TransportFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = self.body.clone();
        Box::pin(async move { Ok(body) })
    }
}

fn time_series(closes: &[f64]) -> String {
    let rows: Vec<String> = closes
        .iter()
        .enumerate()
        .map(|(idx, close)| {
            format!(
                concat!(
                    r#""2024-02-{day:02}": {{"1. open": "{close}", "2. high": "{close}", "#,
                    r#""3. low": "{close}", "4. close": "{close}", "#,
                    r#""5. adjusted close": "{close}", "6. volume": "500"}}"#,
                ),
                day = idx + 1,
                close = close,
            )
        })
        .collect();
    format!(
        r#"{{"Meta Data": {{"1. Information": "Daily Prices"}}, "Time Series (Daily)": {{{}}}}}"#,
        rows.join(",")
    )
}

fn cached_client(
    transport: Arc<FixedTransport>,
    ttl_secs: u64,
) -> (CachedClient, Arc<ManualClock>) {
    let mut config = Config::with_api_key("demo");
    config.cache.ttl = Duration::from_secs(ttl_secs);
    let client = QuoteClient::with_transport(config.provider.clone(), transport);
    let clock = Arc::new(ManualClock::new());
    (CachedClient::with_client(client, &config, clock.clone()), clock)
}

#[tokio::test]
async fn identical_requests_within_ttl_hit_network_once() {
    let transport = FixedTransport::new(time_series(&[1.0, 2.0, 3.0]));
    let (client, clock) = cached_client(transport.clone(), 300);

    client.prices("AAPL").await.unwrap();
    clock.advance(Duration::from_secs(299));
    client.prices("aapl").await.unwrap();
    assert_eq!(transport.calls(), 1);

    clock.advance(Duration::from_secs(1));
    client.prices("AAPL").await.unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn note_payload_is_rate_limited_and_not_cached() {
    let note = "Thank you for using Alpha Vantage! \
                Our standard API call frequency is 5 calls per minute.";
    let transport = FixedTransport::new(format!(r#"{{"Note": "{note}"}}"#));
    let (client, _) = cached_client(transport.clone(), 300);

    for _ in 0..2 {
        let err = client.prices("AAPL").await.unwrap_err();
        assert_eq!(err, FetchError::RateLimited(note.to_string()));
        assert!(err.is_retryable());
    }
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn fetched_series_feeds_indicators() {
    let closes: Vec<f64> = (10..=20).map(f64::from).collect();
    let transport = FixedTransport::new(time_series(&closes));
    let (client, _) = cached_client(transport, 300);

    let shared = client.prices("IBM").await.unwrap();
    let mut series = (*shared).clone();
    Indicator::Sma { window: 5 }.apply(&mut series).unwrap();
    Indicator::Rsi { window: 5 }.apply(&mut series).unwrap();

    let sma = series.column("SMA").unwrap();
    assert_eq!(sma.len(), closes.len());
    assert!(sma.values()[..4].iter().all(Option::is_none));
    assert!((sma.get(4).unwrap() - 12.0).abs() < 1e-9);

    // Monotonic rise: no losses anywhere, so RSI pins at 100 once defined.
    let rsi = series.column("RSI").unwrap();
    assert_eq!(rsi.get(3), None);
    assert_eq!(rsi.get(4), Some(100.0));
}

#[tokio::test]
async fn invalid_symbol_never_reaches_transport() {
    let transport = FixedTransport::new(time_series(&[1.0]));
    let (client, _) = cached_client(transport.clone(), 300);

    let err = client.prices("not a ticker!").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidSymbol(_)));
    assert!(!err.is_retryable());
    assert_eq!(transport.calls(), 0);
}
