//! Table of in-flight patch transfers, keyed by resource name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// Called with the resource name once its bytes are in the engine.
pub type PatchWaiter = Box<dyn FnOnce(&str)>;

/// One in-flight transfer and everyone waiting on it.
struct PendingFetch {
    location: String,
    waiters: Vec<PatchWaiter>,
}

/// At most one record exists per name. A record lives from the first request
/// until its transfer completes.
#[derive(Default)]
pub struct PatchRequests {
    pending: RefCell<HashMap<String, PendingFetch>>,
}

impl PatchRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `waiter` on the transfer for `name`.
    ///
    /// Returns true when no transfer was in flight and the caller must start
    /// one for `location`.
    pub fn enqueue(&self, name: &str, location: &str, waiter: PatchWaiter) -> bool {
        let mut pending = self.pending.borrow_mut();
        if let Some(record) = pending.get_mut(name) {
            record.waiters.push(waiter);
            return false;
        }

        pending.insert(
            name.to_string(),
            PendingFetch {
                location: location.to_string(),
                waiters: vec![waiter],
            },
        );
        true
    }

    /// Remove the record for `name`, handing back its waiters in queue order.
    pub fn finish(&self, name: &str) -> Vec<PatchWaiter> {
        self.pending
            .borrow_mut()
            .remove(name)
            .map(|record| record.waiters)
            .unwrap_or_default()
    }

    /// Names with a transfer in flight, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.pending.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for PatchRequests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.pending.borrow();
        let mut locations: Vec<_> = pending
            .iter()
            .map(|(name, record)| (name.as_str(), record.location.as_str()))
            .collect();
        locations.sort_unstable();
        f.debug_map().entries(locations).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_first_request_starts_transfer() {
        let requests = PatchRequests::new();
        assert!(requests.enqueue("a.pat", "/data/a.pat", Box::new(|_| {})));
        assert!(!requests.enqueue("a.pat", "/data/a.pat", Box::new(|_| {})));
        assert!(requests.enqueue("b.pat", "/data/b.pat", Box::new(|_| {})));

        assert_eq!(requests.names(), vec!["a.pat", "b.pat"]);
        assert_eq!(
            format!("{requests:?}"),
            r#"{"a.pat": "/data/a.pat", "b.pat": "/data/b.pat"}"#
        );
        assert_eq!(requests.finish("a.pat").len(), 2);
    }

    #[test]
    fn test_finish_returns_waiters_in_order() {
        let requests = PatchRequests::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for id in 0..4 {
            let log = log.clone();
            requests.enqueue(
                "x",
                "/x",
                Box::new(move |name| log.borrow_mut().push(format!("{id}:{name}"))),
            );
        }

        let waiters = requests.finish("x");
        assert!(requests.names().is_empty());
        for waiter in waiters {
            waiter("x");
        }
        assert_eq!(*log.borrow(), vec!["0:x", "1:x", "2:x", "3:x"]);

        // A finished name starts over.
        assert!(requests.finish("x").is_empty());
        assert!(requests.enqueue("x", "/x", Box::new(|_| {})));
    }
}
