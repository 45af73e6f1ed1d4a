//! Page fetcher with fixed browser-like headers and a linear retry loop.
//!
//! - One [`HttpClient`] per run: `User-Agent` and `Accept-Language` are set
//!   once as default headers, every request gets the same timeout
//! - [`HttpClient::fetch`] makes exactly one attempt; anything but `200 OK`
//!   is an [`HttpError::Status`]
//! - [`retry`] drives repeated attempts with `wait = step × attempt`
//! - Optional *raw* request/response logging via `DAYTEXT_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), daytext_http::HttpError> {
//! use daytext_http::{ClientOptions, HttpClient, NoopObserver, RetryPolicy, retry};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = HttpClient::new(&ClientOptions::default())?;
//! let cancel = CancellationToken::new();
//! let body = retry(&RetryPolicy::default(), &cancel, &mut NoopObserver, |_| {
//!     client.fetch("https://wol.jw.org/en/wol/h/r1/lp-e/2024/8/13")
//! })
//! .await?;
//! assert!(!body.is_empty());
//! # Ok(()) }
//! ```
//!
//! Observability: `tracing` events are emitted for request start, response
//! status and size, failures, and (optionally) raw request/response lines
//! under target `http.raw`.

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, StatusCode, Url};
use std::env;
use std::time::Duration;
use thiserror::Error;

pub mod retry;

pub use retry::{NoopObserver, RetryObserver, RetryPolicy, retry};

// ==============================
// Defaults
// ==============================

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.102 Safari/537.36 Edge/18.19042";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US, en;q=0.5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "DAYTEXT_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a curl command reproducing the request, cookies redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("cookie") || key.eq_ignore_ascii_case("set-cookie") {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("client build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {}: {reason}", status.as_u16())]
    Status { status: StatusCode, reason: String },
    #[error("cancelled")]
    Cancelled,
    #[error("giving up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: usize,
        last: Box<HttpError>,
    },
}

impl HttpError {
    /// Whether another attempt could succeed. Bad URLs and client setup
    /// errors fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HttpError::Network(_) | HttpError::Status { .. })
    }
}

// ==============================
// Client options
// ==============================

/// Fixed request headers and timeout for a client.
///
/// ```
/// use daytext_http::{ClientOptions, DEFAULT_ACCEPT_LANGUAGE};
/// use std::time::Duration;
///
/// let opts = ClientOptions::default();
/// assert_eq!(opts.timeout, Duration::from_secs(20));
/// assert_eq!(opts.accept_language, DEFAULT_ACCEPT_LANGUAGE);
/// ```
#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    headers: HeaderMap,
    pub timeout: Duration,
}

impl HttpClient {
    /// Build a client sending `opts`' headers on every request.
    ///
    /// ```
    /// use daytext_http::{ClientOptions, HttpClient, HttpError};
    ///
    /// let bad = ClientOptions { user_agent: "line\nbreak".into(), ..Default::default() };
    /// assert!(matches!(HttpClient::new(&bad), Err(HttpError::Build(_))));
    /// ```
    pub fn new(opts: &ClientOptions) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("User-Agent", &opts.user_agent)?);
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("Accept-Language", &opts.accept_language)?,
        );

        let inner = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .default_headers(headers.clone())
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            headers,
            timeout: opts.timeout,
        })
    }

    /// GET `url` once and return the body of a `200 OK` response.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(format!("{url}: {e}")))?;
        let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());

        tracing::debug!(
            method = "GET",
            host_path = %host_path,
            timeout_ms = self.timeout.as_millis() as u64,
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&Method::GET, &url, &self.headers);
            tracing::debug!(target: "http.raw", %curl, "request");
        }

        let t0 = std::time::Instant::now();
        let resp = self
            .inner
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| network_error(&host_path, e))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| network_error(&host_path, e))?;
        let duration_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            host_path = %host_path,
            %status,
            duration_ms,
            body_len = bytes.len(),
            "http.response"
        );
        if raw_enabled() {
            let mut body = bytes.to_vec();
            let truncated = body.len() > RAW_MAX_BODY;
            body.truncate(RAW_MAX_BODY);
            tracing::info!(
                target: "http.raw",
                %status,
                duration_ms,
                headers = ?redact_headers(&headers),
                body = %String::from_utf8_lossy(&body),
                truncated
            );
        }

        if status != StatusCode::OK {
            let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
            tracing::warn!(
                host_path = %host_path,
                %status,
                body_snippet = %snip_body(&bytes),
                "http.error"
            );
            return Err(HttpError::Status { status, reason });
        }

        Ok(bytes.to_vec())
    }
}

// ==============================
// Helpers
// ==============================

fn header_value(name: &str, value: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value).map_err(|e| HttpError::Build(format!("invalid {name} header: {e}")))
}

fn network_error(host_path: &str, err: reqwest::Error) -> HttpError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    };
    tracing::warn!(host_path = %host_path, message = %message, "http.network_error");
    HttpError::Network(message)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        let mut cut = 500;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}
