//! Change notification bus.
//!
//! A payload-free invalidation signal. Whoever mutates the client state store
//! publishes; anything displaying derived state (cart badge, wishlist count,
//! order list) subscribes and re-reads the store when signalled.
//!
//! Delivery is synchronous: every handler registered at the time of
//! [`ChangeBus::publish`] has run before `publish` returns. Handlers added
//! later do not see earlier signals.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    handlers: Mutex<BTreeMap<u64, Handler>>,
}

/// Broadcast "the store changed" to every live subscriber.
///
/// Cheap to clone; clones share the same subscriber set.
#[derive(Clone, Default)]
pub struct ChangeBus {
    inner: Arc<BusInner>,
}

impl ChangeBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` until the returned [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, handler: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(handler));

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Signal every current subscriber, in subscription order.
    ///
    /// The subscriber set is snapshotted first, so handlers may subscribe,
    /// unsubscribe, or publish again without deadlocking.
    pub fn publish(&self) {
        let handlers: Vec<Handler> = self
            .inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        tracing::trace!(subscribers = handlers.len(), "Publishing store change");
        for handler in handlers {
            handler();
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle for a registered handler. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.handlers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        (count, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = ChangeBus::new();
        let (a, handler_a) = counter();
        let (b, handler_b) = counter();
        let _sub_a = bus.subscribe(handler_a);
        let _sub_b = bus.subscribe(handler_b);

        bus.publish();

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = ChangeBus::new();
        let (count, handler) = counter();
        let sub = bus.subscribe(handler);
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        bus.publish();

        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_signal() {
        let bus = ChangeBus::new();
        bus.publish();

        let (count, handler) = counter();
        let _sub = bus.subscribe(handler);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clones_share_subscribers() {
        let bus = ChangeBus::new();
        let (count, handler) = counter();
        let _sub = bus.subscribe(handler);

        bus.clone().publish();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_subscribe_during_publish() {
        let bus = ChangeBus::new();
        let inner_bus = bus.clone();
        let nested: Arc<Mutex<Vec<Subscription>>> = Arc::default();
        let nested_handle = Arc::clone(&nested);

        let _sub = bus.subscribe(move || {
            let sub = inner_bus.subscribe(|| {});
            nested_handle.lock().unwrap_or_else(PoisonError::into_inner).push(sub);
        });

        bus.publish();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_subscription_outliving_bus_is_harmless() {
        let bus = ChangeBus::new();
        let sub = bus.subscribe(|| {});
        drop(bus);
        drop(sub);
    }
}
