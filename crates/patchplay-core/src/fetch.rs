//! The byte-fetch capability consumed by the player.

use bytes::Bytes;

/// Status reported when a transfer never produced an HTTP response.
pub const STATUS_NETWORK_FAILURE: u16 = 0;

/// Outcome of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn failed(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
        }
    }

    /// Only `200` counts as success.
    pub const fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Completion callback for one transfer. Called exactly once.
pub type FetchCallback = Box<dyn FnOnce(FetchResponse)>;

/// Starts non-blocking transfers.
///
/// `on_complete` may run before `fetch` returns or at any later point on the
/// same thread.
pub trait Fetcher {
    fn fetch(&self, location: &str, on_complete: FetchCallback);
}
