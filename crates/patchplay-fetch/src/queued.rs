//! A fetcher whose transfers are completed explicitly by the host.
//!
//! Useful when the embedding environment owns the network (a browser bridge,
//! a custom download manager) and in tests that need to control completion
//! order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use patchplay_core::{FetchCallback, FetchResponse, Fetcher};
use tracing::{debug, warn};

struct Transfer {
    location: String,
    on_complete: FetchCallback,
}

#[derive(Default)]
struct Queue {
    pending: VecDeque<Transfer>,
    started: Vec<String>,
}

/// Records every transfer until [`QueuedFetcher::complete`] resolves it.
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct QueuedFetcher {
    queue: Rc<RefCell<Queue>>,
}

impl QueuedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locations of transfers still waiting, oldest first.
    pub fn pending(&self) -> Vec<String> {
        self.queue
            .borrow()
            .pending
            .iter()
            .map(|t| t.location.clone())
            .collect()
    }

    /// Every location ever requested, in request order.
    pub fn started(&self) -> Vec<String> {
        self.queue.borrow().started.clone()
    }

    /// Number of transfers started for `location`.
    pub fn started_count(&self, location: &str) -> usize {
        self.queue
            .borrow()
            .started
            .iter()
            .filter(|l| *l == location)
            .count()
    }

    /// Resolve the oldest pending transfer for `location`.
    ///
    /// Returns false if nothing was waiting on it.
    pub fn complete(&self, location: &str, response: FetchResponse) -> bool {
        let transfer = {
            let mut queue = self.queue.borrow_mut();
            let Some(index) = queue.pending.iter().position(|t| t.location == location) else {
                warn!("No pending transfer for {location}");
                return false;
            };
            queue.pending.remove(index)
        };

        if let Some(transfer) = transfer {
            debug!("Completing {} with status {}", location, response.status);
            (transfer.on_complete)(response);
            true
        } else {
            false
        }
    }

    /// Resolve the oldest pending transfer, whatever its location.
    pub fn complete_next(&self, response: FetchResponse) -> Option<String> {
        let transfer = self.queue.borrow_mut().pending.pop_front()?;
        let location = transfer.location.clone();
        (transfer.on_complete)(response);
        Some(location)
    }
}

impl Fetcher for QueuedFetcher {
    fn fetch(&self, location: &str, on_complete: FetchCallback) {
        debug!("Queued transfer for {location}");
        let mut queue = self.queue.borrow_mut();
        queue.started.push(location.to_string());
        queue.pending.push_back(Transfer {
            location: location.to_string(),
            on_complete,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_complete_out_of_order() {
        let fetcher = QueuedFetcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for location in ["a", "b"] {
            let log = log.clone();
            fetcher.fetch(
                location,
                Box::new(move |response| log.borrow_mut().push((location, response.status))),
            );
        }
        assert_eq!(fetcher.pending(), vec!["a", "b"]);

        assert!(fetcher.complete("b", FetchResponse::failed(404)));
        assert!(fetcher.complete("a", FetchResponse::ok(vec![1])));
        assert!(!fetcher.complete("a", FetchResponse::ok(vec![1])));

        assert_eq!(*log.borrow(), vec![("b", 404), ("a", 200)]);
        assert!(fetcher.pending().is_empty());
        assert_eq!(fetcher.started(), vec!["a", "b"]);
    }

    #[test]
    fn test_callback_may_start_new_transfer() {
        let fetcher = QueuedFetcher::new();
        let done = Rc::new(Cell::new(false));

        let inner = fetcher.clone();
        let flag = done.clone();
        fetcher.fetch(
            "first",
            Box::new(move |_| {
                inner.fetch("second", Box::new(move |_| flag.set(true)));
            }),
        );

        assert_eq!(fetcher.complete_next(FetchResponse::ok(vec![])).unwrap(), "first");
        assert_eq!(fetcher.pending(), vec!["second"]);
        fetcher.complete_next(FetchResponse::ok(vec![]));
        assert!(done.get());
        assert_eq!(fetcher.started_count("second"), 1);
    }
}
