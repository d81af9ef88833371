//! Per-location choice between HTTP and local transfers.

use patchplay_core::{FetchCallback, Fetcher, Result};
use tracing::trace;

use crate::{is_remote, FileFetcher, HttpFetcher};

/// Sends `http`/`https` locations to an [`HttpFetcher`] and everything else
/// to a [`FileFetcher`], so songs and patches may live in different places.
#[derive(Clone)]
pub struct RoutingFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl RoutingFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self::with_http(HttpFetcher::new()?))
    }

    pub const fn with_http(http: HttpFetcher) -> Self {
        Self {
            http,
            file: FileFetcher::new(),
        }
    }
}

impl Fetcher for RoutingFetcher {
    fn fetch(&self, location: &str, on_complete: FetchCallback) {
        if is_remote(location) {
            trace!("Routing {location} over HTTP");
            self.http.fetch(location, on_complete);
        } else {
            trace!("Routing {location} to the filesystem");
            self.file.fetch(location, on_complete);
        }
    }
}
