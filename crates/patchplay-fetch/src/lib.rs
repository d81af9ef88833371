//! # patchplay-fetch
//!
//! [`Fetcher`](patchplay_core::Fetcher) implementations for patchplay.
//!
//! - [`HttpFetcher`]: reqwest transfers on a tokio `LocalSet`
//! - [`FileFetcher`]: local files read through tokio's fs
//! - [`QueuedFetcher`]: transfers the host completes by hand
//! - [`RoutingFetcher`]: HTTP or local, chosen per location

pub mod file;
pub mod http;
pub mod queued;
pub mod routing;

pub use file::FileFetcher;
pub use http::HttpFetcher;
pub use queued::QueuedFetcher;
pub use routing::RoutingFetcher;

/// Whether `location` names something [`HttpFetcher`] should handle.
pub fn is_remote(location: &str) -> bool {
    url::Url::parse(location).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/patches/"));
        assert!(is_remote("http://localhost:8000/a.mid"));
        assert!(!is_remote("/srv/patches"));
        assert!(!is_remote("file:///srv/patches"));
        assert!(!is_remote("patches/"));
    }
}
