use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;

use crate::error::FetchError;

use super::request::PreparedRequest;

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, FetchError>> + Send + 'a>>;

/// One outbound GET returning the response body. Failures of any kind below
/// the payload level surface as [`FetchError::Transport`].
pub trait Transport: Send + Sync {
    fn get<'a>(&'a self, request: &'a PreparedRequest) -> TransportFuture<'a>;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stock-dash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to construct HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn get<'a>(&'a self, request: &'a PreparedRequest) -> TransportFuture<'a> {
        Box::pin(async move {
            // reqwest errors embed the full URL, which carries the API key.
            let response = self
                .client
                .get(&request.url)
                .query(&request.params)
                .timeout(request.timeout)
                .send()
                .await
                .map_err(|e| {
                    let e = e.without_url();
                    if e.is_timeout() {
                        FetchError::Transport(format!("request timed out: {e}"))
                    } else if e.is_connect() {
                        FetchError::Transport(format!("connection failed: {e}"))
                    } else {
                        FetchError::Transport(format!("request failed: {e}"))
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Transport(format!(
                    "provider returned status {status}"
                )));
            }

            response.text().await.map_err(|e| {
                let e = e.without_url();
                FetchError::Transport(format!("failed to read response body: {e}"))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    const KEY: &str = "secret-key";

    /// Serves one connection: reads the request head, sends it back on the
    /// channel, then writes `reply` (or holds the socket open when `None`).
    async fn serve_once(
        reply: Option<&'static str>,
    ) -> (String, tokio::sync::oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());
            match reply {
                Some(reply) => {
                    socket.write_all(reply.as_bytes()).await.unwrap();
                    socket.shutdown().await.unwrap();
                }
                None => tokio::time::sleep(Duration::from_secs(5)).await,
            }
        });

        (format!("http://{addr}/query"), rx)
    }

    fn request(url: String, timeout: Duration) -> PreparedRequest {
        PreparedRequest {
            url,
            params: vec![
                ("function".to_string(), "TIME_SERIES_DAILY".to_string()),
                ("symbol".to_string(), "IBM".to_string()),
                ("apikey".to_string(), KEY.to_string()),
            ],
            timeout,
        }
    }

    #[tokio::test]
    async fn returns_body_and_sends_query() {
        let (url, seen) = serve_once(Some(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        ))
        .await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let body = transport
            .get(&request(url, Duration::from_secs(5)))
            .await
            .unwrap();

        assert_eq!(body, "{}");
        let head = seen.await.unwrap();
        assert!(head.starts_with(
            "GET /query?function=TIME_SERIES_DAILY&symbol=IBM&apikey=secret-key HTTP/1.1"
        ));
    }

    #[tokio::test]
    async fn error_status_is_transport_without_key() {
        let (url, _seen) = serve_once(Some(
            "HTTP/1.1 500 Internal Server Error\r\n\
             Content-Length: 0\r\nConnection: close\r\n\r\n",
        ))
        .await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let err = transport
            .get(&request(url, Duration::from_secs(5)))
            .await
            .unwrap_err();

        let FetchError::Transport(message) = &err else {
            panic!("expected a transport error, got {err:?}");
        };
        assert!(message.contains("500"), "{message}");
        assert!(!message.contains(KEY), "{message}");
    }

    #[tokio::test]
    async fn stalled_server_times_out_without_key() {
        let (url, _seen) = serve_once(None).await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let err = transport
            .get(&request(url, Duration::from_millis(200)))
            .await
            .unwrap_err();

        let FetchError::Transport(message) = &err else {
            panic!("expected a transport error, got {err:?}");
        };
        assert!(message.starts_with("request timed out"), "{message}");
        assert!(!message.contains(KEY), "{message}");
    }

    #[tokio::test]
    async fn refused_connection_is_transport_without_key() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let err = transport
            .get(&request(format!("http://{addr}/query"), Duration::from_secs(5)))
            .await
            .unwrap_err();

        let FetchError::Transport(message) = &err else {
            panic!("expected a transport error, got {err:?}");
        };
        assert!(!message.contains(KEY), "{message}");
    }
}
