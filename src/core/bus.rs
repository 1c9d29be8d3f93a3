//! Event Bus
//!
//! Typed publish/subscribe dispatcher. The sole channel through which the
//! two side-local views learn about world changes; undo replays through it
//! as well, so views update identically either way.
//!
//! Dispatch is synchronous and reentrant-safe: handlers may publish further
//! events or (un)subscribe mid-dispatch without affecting the in-flight
//! delivery, which always runs against a snapshot of the handler list taken
//! when `publish` was entered.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use tracing::error;

use crate::game::events::{Topic, WorldEvent};

type Handler = Rc<RefCell<dyn FnMut(&WorldEvent)>>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription {
    topic: Topic,
    id: u64,
}

impl Subscription {
    /// Topic this subscription listens on.
    #[inline]
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

/// Single-threaded typed event dispatcher.
///
/// Handlers are synchronous and side-effect-only; nothing here suspends or
/// blocks. A handler that panics is isolated and logged; it never aborts
/// delivery to the remaining handlers.
#[derive(Default)]
pub struct EventBus {
    next_id: Cell<u64>,
    subscribers: RefCell<BTreeMap<Topic, Vec<(u64, Handler)>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`, in subscription order.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: FnMut(&WorldEvent) + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers
            .borrow_mut()
            .entry(topic)
            .or_default()
            .push((id, Rc::new(RefCell::new(handler))));
        Subscription { topic, id }
    }

    /// Remove a previously registered handler.
    ///
    /// Safe to call during a dispatch; the in-flight snapshot is unaffected.
    pub fn unsubscribe(&self, subscription: Subscription) {
        if let Some(handlers) = self.subscribers.borrow_mut().get_mut(&subscription.topic) {
            handlers.retain(|(id, _)| *id != subscription.id);
        }
    }

    /// Number of live handlers for a topic.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers
            .borrow()
            .get(&topic)
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }

    /// Deliver `event` to every handler subscribed to its topic.
    ///
    /// Handlers run in subscription order against a snapshot taken on
    /// entry. A panicking handler is caught and logged; dispatch continues.
    pub fn publish(&self, event: &WorldEvent) {
        let topic = event.topic();

        // Snapshot before iterating so nested subscribe/unsubscribe cannot
        // invalidate the in-flight dispatch.
        let snapshot: Vec<(u64, Handler)> = self
            .subscribers
            .borrow()
            .get(&topic)
            .map(|handlers| handlers.to_vec())
            .unwrap_or_default();

        for (id, handler) in snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                (&mut *handler.borrow_mut())(event);
            }));
            if outcome.is_err() {
                error!(?topic, handler_id = id, "event handler panicked; continuing dispatch");
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<(Topic, usize)> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(topic, handlers)| (*topic, handlers.len()))
            .collect();
        f.debug_struct("EventBus").field("subscribers", &counts).finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
