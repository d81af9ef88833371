//! Synchronous, single-threaded event channels.
//!
//! Each object exposes a fixed set of channels. Subscribers run in
//! subscription order on the thread that emits.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One named event with zero or more subscribers.
pub struct EventChannel<T> {
    handlers: RefCell<Vec<Rc<dyn Fn(&T)>>>,
}

impl<T> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Add a subscriber.
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) {
        self.handlers.borrow_mut().push(Rc::new(handler));
    }

    /// Invoke every subscriber with `payload`.
    ///
    /// Handlers may subscribe further handlers while running; those only see
    /// later emissions.
    pub fn emit(&self, payload: &T) {
        let handlers: Vec<_> = self.handlers.borrow().clone();
        for handler in handlers {
            handler(payload);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &self.len())
            .finish()
    }
}
