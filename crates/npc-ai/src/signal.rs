//! Named-signal bus with RAII subscriptions.
//!
//! Producers call [`SignalBus::emit`]; every live [`Subscription`] whose name
//! filter matches buffers the signal until its owner drains it.  Dropping a
//! subscription unsubscribes it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::trace;

type Inbox = Rc<RefCell<Vec<String>>>;

struct Subscriber {
    names: Vec<String>,
    inbox: Inbox,
}

#[derive(Default)]
struct BusInner {
    next_id:     u64,
    subscribers: BTreeMap<u64, Subscriber>,
}

/// Cheaply clonable handle to a shared signal bus.
#[derive(Clone, Default)]
pub struct SignalBus {
    inner: Rc<RefCell<BusInner>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `names`.  An empty list receives every signal.
    pub fn subscribe<I, S>(&self, names: I) -> Subscription
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let inbox: Inbox = Rc::default();
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(
            id,
            Subscriber {
                names: names.into_iter().map(Into::into).collect(),
                inbox: Rc::clone(&inbox),
            },
        );
        Subscription { id, bus: Rc::downgrade(&self.inner), inbox }
    }

    /// Deliver `name` to every matching subscription.
    pub fn emit(&self, name: &str) {
        let inner = self.inner.borrow();
        let mut delivered = 0usize;
        for sub in inner.subscribers.values() {
            if sub.names.is_empty() || sub.names.iter().any(|n| n == name) {
                sub.inbox.borrow_mut().push(name.to_owned());
                delivered += 1;
            }
        }
        trace!(signal = name, delivered, "signal emitted");
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// A live subscription.  Unsubscribes on drop.
pub struct Subscription {
    id:    u64,
    bus:   Weak<RefCell<BusInner>>,
    inbox: Inbox,
}

impl Subscription {
    /// Take every signal received since the last drain, in arrival order.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.inbox.borrow_mut())
    }

    pub fn pending(&self) -> usize {
        self.inbox.borrow().len()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut().subscribers.remove(&self.id);
        }
    }
}
