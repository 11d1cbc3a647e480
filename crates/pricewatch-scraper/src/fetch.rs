use std::path::Path;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;

use pricewatch_core::AppConfig;

use crate::error::FetchError;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Retrieves raw page text over HTTP, or from a pinned local capture.
///
/// Requests carry a browser-like header set. `Accept-Encoding` is negotiated
/// by the client itself, which also decodes gzip, brotli and deflate bodies.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

impl Fetcher {
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        policy: RetryPolicy,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(browser_headers())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, policy })
    }

    /// # Errors
    ///
    /// Returns [`FetchError`] when the retry policy is invalid or the client
    /// cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, FetchError> {
        let policy = RetryPolicy::from_app_config(config)?;
        Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            policy,
        )
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`, retrying any transport error or non-2xx status until
    /// the policy's attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] observed once all attempts fail.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        retry_with_backoff(&self.policy, url, || async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    url: url.to_owned(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;
            tracing::debug!(url, bytes = body.len(), "fetched page");
            Ok(body)
        })
        .await
    }

    /// Reads a previously captured page instead of going to the network.
    ///
    /// Capture reads are not retried.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] when the file does not exist and
    /// [`FetchError::CaptureRead`] for any other I/O failure.
    pub async fn fetch_from_capture(&self, path: &Path) -> Result<String, FetchError> {
        match tokio::fs::read_to_string(path).await {
            Ok(body) => {
                tracing::debug!(path = %path.display(), bytes = body.len(), "read capture");
                Ok(body)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(FetchError::CaptureRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
