// src/feed/client.rs
// =============================================================================
// This module talks to the feed API over HTTP.
//
// Key functionality:
// - Makes one GET request per page against {base_url}/public
// - Serializes the query parameters as a URL query string
// - Throttles itself through an owned RateLimiter
// - Turns every transport problem (network, status, body) into a FeedError
//
// The FeedSource trait is the seam between "how a page is fetched" and
// "how pages are walked". The iterator only ever sees a FeedSource, which is
// what lets the tests feed it scripted pages instead of a live server.
//
// Rust concepts:
// - Traits returning BoxFuture: async methods without the async-trait crate
// - thiserror: typed error enums with Display generated for us
// - Generic structs: HttpFeedClient<C> is generic over the limiter's clock
// =============================================================================

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::page::{Page, QueryParams};
use super::rate::{Clock, RateLimiter, TokioClock};

// Everything that can go wrong while fetching a single page.
//
// All variants are transport failures: the core never retries them, it just
// stops the harvest and reports where it was.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network-level problem (DNS, connect, timeout, ...)
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-2xx status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// The body was not a JSON page
    #[error("malformed response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

// Problems building the client itself, before any request is made
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL '{base_url}': {source}")]
    InvalidBaseUrl {
        base_url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("could not build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

// Something that can fetch one page of the feed for a set of parameters.
pub trait FeedSource {
    fn fetch<'a>(&'a mut self, params: &'a QueryParams) -> BoxFuture<'a, Result<Page, FeedError>>;
}

/// Settings for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://venmo.com/api/v5`
    pub base_url: String,
    /// Minimum time between two requests
    pub request_rate: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://venmo.com/api/v5".to_string(),
            request_rate: Duration::from_secs(30),
            timeout: Duration::from_secs(30),
        }
    }
}

// The production FeedSource: reqwest + rate limiter.
pub struct HttpFeedClient<C = TokioClock> {
    http: Client,
    endpoint: Url,
    limiter: RateLimiter<C>,
}

impl HttpFeedClient<TokioClock> {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let limiter = RateLimiter::new(config.request_rate);
        Self::with_limiter(config, limiter)
    }
}

impl<C: Clock> HttpFeedClient<C> {
    pub fn with_limiter(config: &ClientConfig, limiter: RateLimiter<C>) -> Result<Self, ClientError> {
        let endpoint = public_endpoint(&config.base_url)?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("feedgraph/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            limiter,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    // Fetches one page. Waits on the rate limiter first, and marks the
    // limiter once the call is over (success or not), so the gap between the
    // end of one call and the start of the next is at least `request_rate`.
    pub async fn fetch_page(&mut self, params: &QueryParams) -> Result<Page, FeedError> {
        self.limiter.wait().await;
        let result = self.request(params).await;
        self.limiter.mark();
        result
    }

    async fn request(&self, params: &QueryParams) -> Result<Page, FeedError> {
        let url = self.endpoint.to_string();
        debug!(%url, ?params, "requesting page");

        let response = self
            .http
            .get(self.endpoint.clone())
            .query(params)
            .send()
            .await
            .map_err(|source| FeedError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status { url, status });
        }

        response
            .json::<Page>()
            .await
            .map_err(|source| FeedError::Decode { url, source })
    }
}

impl<C: Clock> FeedSource for HttpFeedClient<C> {
    fn fetch<'a>(&'a mut self, params: &'a QueryParams) -> BoxFuture<'a, Result<Page, FeedError>> {
        Box::pin(self.fetch_page(params))
    }
}

// Builds `{base_url}/public`, tolerating a trailing slash on the base
fn public_endpoint(base_url: &str) -> Result<Url, ClientError> {
    let base = base_url.trim_end_matches('/');
    Url::parse(&format!("{}/public", base)).map_err(|source| ClientError::InvalidBaseUrl {
        base_url: base_url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use std::time::Instant;
    use tokio::task::JoinHandle;

    // Serves exactly one HTTP response on a random local port and hands back
    // the request line it received (e.g. "GET /public?limit=50 HTTP/1.1").
    async fn one_shot_server(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            let text = String::from_utf8_lossy(&received).to_string();
            text.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{}", addr), handle)
    }

    // Serves two requests on separate connections. The first response is held
    // back for `first_delay`; returns the instant each request arrived.
    async fn two_shot_server(first_delay: Duration) -> (String, JoinHandle<Vec<Instant>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = r#"{"data":[]}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let mut arrivals = Vec::new();
            for i in 0..2 {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut received = Vec::new();
                let mut buf = [0u8; 1024];
                while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    received.extend_from_slice(&buf[..n]);
                }
                arrivals.push(Instant::now());
                if i == 0 {
                    tokio::time::sleep(first_delay).await;
                }
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            arrivals
        });

        (format!("http://{}", addr), handle)
    }

    fn config(base_url: String) -> ClientConfig {
        ClientConfig {
            base_url,
            request_rate: Duration::ZERO,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_public_endpoint() {
        let url = public_endpoint("https://venmo.com/api/v5/").unwrap();
        assert_eq!(url.as_str(), "https://venmo.com/api/v5/public");
    }

    #[test]
    fn test_public_endpoint_invalid() {
        let err = public_endpoint("not a url").unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let result = HttpFeedClient::new(&config("::nope".to_string()));
        assert!(matches!(result, Err(ClientError::InvalidBaseUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_sends_query_and_parses_page() {
        let body = r#"{"data":[{"type":"payment"}],"paging":{"next":"/public?before=7"}}"#;
        let (base, server) = one_shot_server("200 OK", body).await;
        let mut client = HttpFeedClient::new(&config(base)).unwrap();

        let mut params = QueryParams::new();
        params.insert("limit".to_string(), "50".to_string());
        params.insert("since".to_string(), "100".to_string());

        let page = client.fetch(&params).await.unwrap();
        assert_eq!(page.data.map(|d| d.len()), Some(1));
        assert_eq!(page.paging.and_then(|p| p.next).as_deref(), Some("/public?before=7"));

        let request_line = server.await.unwrap();
        assert_eq!(request_line, "GET /public?limit=50&since=100 HTTP/1.1");
    }

    #[tokio::test]
    async fn test_interval_counts_from_end_of_slow_call() {
        let (base, server) = two_shot_server(Duration::from_millis(300)).await;
        let mut client = HttpFeedClient::new(&ClientConfig {
            request_rate: Duration::from_millis(400),
            ..config(base)
        })
        .unwrap();

        client.fetch(&QueryParams::new()).await.unwrap();
        let first_done = Instant::now();
        client.fetch(&QueryParams::new()).await.unwrap();

        let arrivals = server.await.unwrap();
        let gap = arrivals[1].duration_since(first_done);
        assert!(gap >= Duration::from_millis(400), "gap was {:?}", gap);
    }

    #[tokio::test]
    async fn test_non_success_status_is_status_error() {
        let (base, server) = one_shot_server("503 Service Unavailable", "{}").await;
        let mut client = HttpFeedClient::new(&config(base)).unwrap();

        let err = client.fetch(&QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, FeedError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let (base, server) = one_shot_server("200 OK", "<html>nope</html>").await;
        let mut client = HttpFeedClient::new(&config(base)).unwrap();

        let err = client.fetch(&QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, FeedError::Decode { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        // Bind then drop to get a port nobody is listening on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut client = HttpFeedClient::new(&config(format!("http://{}", addr))).unwrap();
        let err = client.fetch(&QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, FeedError::Request { .. }));
    }
}
