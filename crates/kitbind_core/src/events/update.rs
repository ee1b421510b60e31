//! Per-frame update event feed.
//!
//! # Responsibility
//! - Define the observation contract extensions use to follow host updates.
//! - Provide the in-process dispatcher the harness and tests drive.
//!
//! # Invariants
//! - Observers run in ascending `order`, ties in subscription order.
//! - Dropping a [`Subscription`] removes its observer; no later dispatch
//!   reaches it.
//! - Callbacks run outside the observer lock and may cancel subscriptions.

use log::{debug, trace};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use uuid::Uuid;

/// One host update tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateEvent {
    /// Zero-based tick index assigned by the source.
    pub tick: u64,
    /// Seconds elapsed since the previous tick.
    pub delta_seconds: f64,
}

/// Observer callback invoked synchronously for every update.
pub type UpdateCallback = Arc<dyn Fn(&UpdateEvent) + Send + Sync>;

/// Source of update events owned by the host.
pub trait UpdateEventSource: Send + Sync {
    /// Starts observing updates until the returned handle is dropped.
    fn observe(&self, name: &str, order: i32, callback: UpdateCallback) -> Subscription;
}

/// RAII observer handle.
pub struct Subscription {
    id: Uuid,
    name: String,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(name: impl Into<String>, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops observing now. Dropping the handle does the same.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            debug!(
                "event=update_unsubscribe module=events status=ok name={} subscription={}",
                self.name, self.id
            );
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct Observer {
    id: Uuid,
    order: i32,
    callback: UpdateCallback,
}

#[derive(Default)]
struct DispatcherInner {
    observers: Mutex<Vec<Observer>>,
}

impl DispatcherInner {
    fn lock(&self) -> MutexGuard<'_, Vec<Observer>> {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: Uuid) {
        self.lock().retain(|observer| observer.id != id);
    }
}

/// In-process update event dispatcher.
#[derive(Default)]
pub struct UpdateDispatcher {
    inner: Arc<DispatcherInner>,
    next_tick: AtomicU64,
}

impl UpdateDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers one update to every live observer.
    ///
    /// Returns the number of observers notified.
    pub fn dispatch(&self, delta_seconds: f64) -> usize {
        let event = UpdateEvent {
            tick: self.next_tick.fetch_add(1, Ordering::Relaxed),
            delta_seconds,
        };
        let callbacks: Vec<UpdateCallback> = self
            .inner
            .lock()
            .iter()
            .map(|observer| observer.callback.clone())
            .collect();
        for callback in &callbacks {
            callback(&event);
        }
        trace!(
            "event=update_dispatch module=events tick={} observers={}",
            event.tick,
            callbacks.len()
        );
        callbacks.len()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.lock().len()
    }

    /// Number of ticks dispatched so far.
    pub fn ticks(&self) -> u64 {
        self.next_tick.load(Ordering::Relaxed)
    }
}

impl UpdateEventSource for UpdateDispatcher {
    fn observe(&self, name: &str, order: i32, callback: UpdateCallback) -> Subscription {
        let id = Uuid::new_v4();
        {
            let mut observers = self.inner.lock();
            let position = observers.partition_point(|observer| observer.order <= order);
            observers.insert(
                position,
                Observer {
                    id,
                    order,
                    callback,
                },
            );
        }
        debug!("event=update_subscribe module=events status=ok name={name} order={order}");

        let inner: Weak<DispatcherInner> = Arc::downgrade(&self.inner);
        Subscription::new(name, move || {
            if let Some(inner) = inner.upgrade() {
                inner.remove(id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Subscription, UpdateDispatcher, UpdateEvent, UpdateEventSource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn dispatch_reaches_observers_until_dropped() {
        let dispatcher = UpdateDispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let subscription = dispatcher.observe(
            "test.update",
            0,
            Arc::new(move |_: &UpdateEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(dispatcher.dispatch(0.016), 1);
        assert_eq!(dispatcher.dispatch(0.016), 1);
        drop(subscription);
        assert_eq!(dispatcher.dispatch(0.016), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.ticks(), 3);
    }

    #[test]
    fn observers_run_in_order_then_subscription_order() {
        let dispatcher = UpdateDispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subscriptions = Vec::new();
        for (label, order) in [("late", 10), ("first", -5), ("mid-a", 0), ("mid-b", 0)] {
            let seen = seen.clone();
            subscriptions.push(dispatcher.observe(
                label,
                order,
                Arc::new(move |_: &UpdateEvent| seen.lock().expect("seen lock").push(label)),
            ));
        }

        dispatcher.dispatch(0.0);
        assert_eq!(
            *seen.lock().expect("seen lock"),
            vec!["first", "mid-a", "mid-b", "late"]
        );
    }

    #[test]
    fn cancel_after_dispatcher_dropped_is_noop() {
        let dispatcher = UpdateDispatcher::new();
        let subscription = dispatcher.observe("orphan", 0, Arc::new(|_: &UpdateEvent| {}));
        assert_eq!(subscription.name(), "orphan");
        drop(dispatcher);
        subscription.cancel();
    }

    #[test]
    fn callback_may_cancel_its_own_subscription() {
        let dispatcher = Arc::new(UpdateDispatcher::new());
        let slot = Arc::new(Mutex::new(None::<Subscription>));
        let slot_in_callback = slot.clone();
        let subscription = dispatcher.observe(
            "self-cancel",
            0,
            Arc::new(move |_: &UpdateEvent| {
                slot_in_callback.lock().expect("slot lock").take();
            }),
        );
        *slot.lock().expect("slot lock") = Some(subscription);

        assert_eq!(dispatcher.dispatch(0.0), 1);
        assert_eq!(dispatcher.observer_count(), 0);
        assert_eq!(dispatcher.dispatch(0.0), 0);
    }
}
