//! HTTP transfers using reqwest.

use std::time::Duration;

use bytes::Bytes;
use patchplay_core::{
    Error, FetchCallback, FetchResponse, Fetcher, HttpError, Result, STATUS_NETWORK_FAILURE,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::{debug, warn};
use url::Url;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches resources over HTTP(S).
///
/// Transfers are spawned with [`tokio::task::spawn_local`], so `fetch` must
/// be called from inside a [`tokio::task::LocalSet`]. Completion callbacks
/// run on that same thread.
#[derive(Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with default settings.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("patchplay/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// Perform one GET and collect the body.
    ///
    /// Non-200 responses are returned as a [`FetchResponse`] with an empty
    /// body; only failures to get any response at all are errors.
    pub async fn get(&self, location: &str) -> Result<FetchResponse> {
        let url = Url::parse(location)
            .map_err(|e| Error::Http(HttpError::InvalidUrl(format!("{location}: {e}"))))?;

        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Http(HttpError::Timeout)
            } else if e.is_connect() {
                Error::Http(HttpError::ConnectionFailed(e.to_string()))
            } else {
                Error::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            debug!("GET {location} returned {status}");
            return Ok(FetchResponse::failed(status));
        }

        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {e}")))?;

        debug!("Fetched {} bytes from {location}", body.len());
        Ok(FetchResponse { status, body })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, location: &str, on_complete: FetchCallback) {
        let fetcher = self.clone();
        let location = location.to_string();

        tokio::task::spawn_local(async move {
            let response = match fetcher.get(&location).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Transfer of {location} failed: {e}");
                    FetchResponse::failed(STATUS_NETWORK_FAILURE)
                }
            };
            on_complete(response);
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;
    use tokio::task::LocalSet;

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.get("not a url").await.unwrap_err();
        assert!(matches!(err, Error::Http(HttpError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_failed_transfer_reports_network_status() {
        let fetcher = HttpFetcher::new().unwrap();
        let local = LocalSet::new();

        let response = local
            .run_until(async move {
                let (tx, rx) = oneshot::channel();
                fetcher.fetch(
                    "::bad::",
                    Box::new(move |response| {
                        let _ = tx.send(response);
                    }),
                );
                rx.await.unwrap()
            })
            .await;

        assert_eq!(response.status, STATUS_NETWORK_FAILURE);
        assert!(response.body.is_empty());
    }
}
