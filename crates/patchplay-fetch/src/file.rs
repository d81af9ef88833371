//! Transfers that read from the local filesystem.

use std::io::ErrorKind;
use std::path::PathBuf;

use patchplay_core::{FetchCallback, FetchResponse, Fetcher};
use tracing::{debug, warn};
use url::Url;

/// Serves locations as local paths, mapping IO failures to HTTP-like
/// statuses (404, 403, 500).
///
/// Like [`HttpFetcher`](crate::HttpFetcher), `fetch` must run inside a
/// [`tokio::task::LocalSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    pub const fn new() -> Self {
        Self
    }

    /// Accept both plain paths and `file://` URLs.
    fn to_path(location: &str) -> PathBuf {
        Url::parse(location)
            .ok()
            .filter(|url| url.scheme() == "file")
            .and_then(|url| url.to_file_path().ok())
            .unwrap_or_else(|| PathBuf::from(location))
    }

    /// Read one file into a response.
    pub async fn read(location: &str) -> FetchResponse {
        let path = Self::to_path(location);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!("Read {} bytes from {}", data.len(), path.display());
                FetchResponse::ok(data)
            }
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                let status = match e.kind() {
                    ErrorKind::NotFound => 404,
                    ErrorKind::PermissionDenied => 403,
                    _ => 500,
                };
                FetchResponse::failed(status)
            }
        }
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, location: &str, on_complete: FetchCallback) {
        let location = location.to_string();
        tokio::task::spawn_local(async move {
            let response = Self::read(&location).await;
            on_complete(response);
        });
    }
}
