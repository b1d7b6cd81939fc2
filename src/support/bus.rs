// SPDX-License-Identifier: MPL-2.0
//! Label-keyed event subscription registry.
//!
//! Subscribers for a label run in registration order on publish. There is no
//! abstract base type to inherit from: components that need event
//! capabilities own an [`EventBus`] and expose what they choose of it.
//!
//! Removal is by [`SubscriptionId`] token rather than callback identity, and
//! [`EventBus::subscribe_once`] registrations remove themselves when fired,
//! which makes completion callbacks safe against double delivery.

use std::collections::HashMap;

/// Token identifying one subscription, returned by the subscribe methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registration<E> {
    id: SubscriptionId,
    once: bool,
    callback: Box<dyn FnMut(&E) + Send>,
}

/// Label-keyed subscriber registry for events of type `E`.
pub struct EventBus<E> {
    listeners: HashMap<String, Vec<Registration<E>>>,
    next_id: u64,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
        }
    }

    /// Registers a callback for `label`.
    pub fn subscribe(
        &mut self,
        label: impl Into<String>,
        callback: impl FnMut(&E) + Send + 'static,
    ) -> SubscriptionId {
        self.register(label.into(), false, Box::new(callback))
    }

    /// Registers a callback for `label` that is removed after its first
    /// delivery.
    pub fn subscribe_once(
        &mut self,
        label: impl Into<String>,
        callback: impl FnMut(&E) + Send + 'static,
    ) -> SubscriptionId {
        self.register(label.into(), true, Box::new(callback))
    }

    fn register(
        &mut self,
        label: String,
        once: bool,
        callback: Box<dyn FnMut(&E) + Send>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        self.listeners
            .entry(label)
            .or_default()
            .push(Registration { id, once, callback });

        id
    }

    /// Whether any subscriber is registered for `label`.
    #[must_use]
    pub fn has_subscribers(&self, label: &str) -> bool {
        self.listeners.get(label).is_some_and(|l| !l.is_empty())
    }

    /// Removes one subscription. Returns whether anything was removed;
    /// removing an already-removed id is a no-op.
    pub fn unsubscribe(&mut self, label: &str, id: SubscriptionId) -> bool {
        let Some(registrations) = self.listeners.get_mut(label) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;

        if registrations.is_empty() {
            self.listeners.remove(label);
        }

        removed
    }

    /// Delivers `event` to every subscriber of `label` in registration
    /// order. One-shot subscriptions are removed before their callback runs.
    pub fn publish(&mut self, label: &str, event: &E) {
        let Some(mut registrations) = self.listeners.remove(label) else {
            return;
        };

        let mut retained = Vec::with_capacity(registrations.len());
        for mut registration in registrations.drain(..) {
            (registration.callback)(event);
            if !registration.once {
                retained.push(registration);
            }
        }

        if !retained.is_empty() {
            // Callbacks may have registered new subscribers for the same
            // label; append them after the surviving originals.
            match self.listeners.get_mut(label) {
                Some(new) => {
                    retained.append(new);
                    *new = retained;
                }
                None => {
                    self.listeners.insert(label.to_string(), retained);
                }
            }
        }
    }

    /// Clears every subscription.
    pub fn dispose(&mut self) {
        self.listeners.clear();
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .listeners
            .iter()
            .map(|(label, regs)| (label.as_str(), regs.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn publish_runs_subscribers_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bus: EventBus<u32> = EventBus::new();

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe("tick", move |_| order.lock().unwrap().push(tag));
        }

        bus.publish("tick", &0);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let mut bus: EventBus<u32> = EventBus::new();
        bus.publish("silent", &1);
        assert!(!bus.has_subscribers("silent"));
    }

    #[test]
    fn subscribe_once_fires_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut bus: EventBus<u32> = EventBus::new();

        let counter = Arc::clone(&count);
        bus.subscribe_once("done", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish("done", &0);
        bus.publish("done", &0);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!bus.has_subscribers("done"));
    }

    #[test]
    fn unsubscribe_removes_only_the_given_token() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut bus: EventBus<u32> = EventBus::new();

        let first = {
            let counter = Arc::clone(&count);
            bus.subscribe("tick", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };
        let counter = Arc::clone(&count);
        bus.subscribe("tick", move |_| {
            counter.fetch_add(10, Ordering::SeqCst);
        });

        assert!(bus.unsubscribe("tick", first));
        assert!(!bus.unsubscribe("tick", first));

        bus.publish("tick", &0);
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn events_carry_payloads() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus: EventBus<(u64, u64)> = EventBus::new();

        let sink = Arc::clone(&seen);
        bus.subscribe("progress", move |event| sink.lock().unwrap().push(*event));

        bus.publish("progress", &(10, 100));
        bus.publish("progress", &(100, 100));

        assert_eq!(*seen.lock().unwrap(), vec![(10, 100), (100, 100)]);
    }

    #[test]
    fn dispose_clears_all_labels() {
        let mut bus: EventBus<u32> = EventBus::new();
        bus.subscribe("a", |_| {});
        bus.subscribe("b", |_| {});

        bus.dispose();

        assert!(!bus.has_subscribers("a"));
        assert!(!bus.has_subscribers("b"));
    }
}
