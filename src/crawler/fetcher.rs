//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building an HTTP client with browser-like default headers
//! - Retrying failed requests with exponential backoff
//! - Resolving the character encoding of the response body

use crate::config::FetcherConfig;
use crate::FetchError;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use regex::bytes::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// How far into the body to look for a `<meta>` charset declaration
const META_SNIFF_LIMIT: usize = 1024;

/// Longest wait between two attempts, in seconds
const MAX_BACKOFF_SECS: f64 = 3600.0;

/// Builds an HTTP client with browser-like default headers
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(FetchError::Client)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(FetchError::Client)
}

/// Delay before the attempt following failed attempt `attempt` (1-based)
///
/// The delay is `backoff_factor^(attempt - 1)` seconds, so with the default
/// factor of 1.5 the waits are 1s, 1.5s, 2.25s, ... Waits are capped at one hour.
pub fn backoff_delay(backoff_factor: f64, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    let secs = backoff_factor.powi(exponent);
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs.min(MAX_BACKOFF_SECS)).unwrap_or(Duration::ZERO)
}

/// Fetches pages as decoded text with bounded retries
///
/// Every call goes to the network; nothing is cached.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    max_retries: u32,
    backoff_factor: f64,
}

impl Fetcher {
    /// Creates a fetcher from the configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client(config)?,
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries.max(1),
            backoff_factor: config.backoff_factor,
        })
    }

    /// Total number of attempts made per URL
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fetches a URL and returns its decoded body
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Transport error (timeout, refused, TLS) | Retry |
    /// | Non-2xx status | Retry |
    /// | Attempts exhausted | `FetchError::Exhausted` with the last cause |
    ///
    /// Delays between attempts follow [`backoff_delay`].
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.max_retries => {
                    let delay = backoff_delay(self.backoff_factor, attempt);
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        self.max_retries,
                        url,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: e,
        })?;

        Ok(decode_body(&bytes, declared.as_deref()))
    }
}

/// Extracts the `charset` parameter of a Content-Type header value
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches(['"', '\'']).to_string())
        .filter(|value| !value.is_empty())
}

/// Finds a charset declared by `<meta charset>` or `<meta http-equiv>` near the top of a page
pub fn sniff_meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_SNIFF_LIMIT)];
    let pattern = Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([A-Za-z0-9_.:-]+)"#).ok()?;
    let label = pattern.captures(head)?.get(1)?.as_bytes();
    Encoding::for_label(label)
}

/// Guesses the encoding of an undeclared body from its bytes; valid UTF-8 wins
pub fn detect_charset(body: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(body, true);
    detector.guess(None, true)
}

/// Decodes a body: declared charset first, then `<meta>`, then content detection
///
/// A byte order mark overrides all three. Malformed sequences become U+FFFD.
pub fn decode_body(body: &[u8], declared: Option<&str>) -> String {
    let encoding = declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| sniff_meta_charset(body))
        .unwrap_or_else(|| detect_charset(body));

    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        tracing::debug!("Body contained malformed {} sequences", used.name());
    }
    text.into_owned()
}
