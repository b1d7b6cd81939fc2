// SPDX-License-Identifier: MPL-2.0
//! Transition timing and completion sequencing.
//!
//! Transitions are explicit values advanced by the application tick; nothing
//! here polls or sleeps. Completion handling is a keyed wait registry:
//! callers start a [`Transition`] with [`Sequencer::begin`], register the
//! action to run when it finishes, and drain fired actions from
//! [`Sequencer::tick`]. Waiters remove themselves when fired, and a
//! completion whose transition was cancelled (element already detached) is
//! a no-op rather than an error.

use std::collections::HashMap;
use std::time::Duration;

/// Key identifying one live transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionKey(u64);

/// One style transition with a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    duration: Duration,
    elapsed: Duration,
}

impl Transition {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
        }
    }

    /// Completion fraction in `[0, 1]`. Zero-duration transitions are
    /// complete immediately.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Advances by `dt`; returns whether the transition just finished.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.is_finished() {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        self.is_finished()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Waiter {
    Single,
    Group(u64),
}

/// Advances live transitions and dispatches completion actions of type `A`.
#[derive(Debug)]
pub struct Sequencer<A> {
    next_key: u64,
    next_group: u64,
    // Live transitions in begin order; completions fire in this order.
    active: Vec<(TransitionKey, Transition)>,
    waiters: HashMap<TransitionKey, (Waiter, Option<A>)>,
    // Group id -> (remaining member count, action fired when it reaches 0).
    groups: HashMap<u64, (usize, A)>,
    deferred: Vec<A>,
}

impl<A> Default for Sequencer<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Sequencer<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_key: 0,
            next_group: 0,
            active: Vec::new(),
            waiters: HashMap::new(),
            groups: HashMap::new(),
            deferred: Vec::new(),
        }
    }

    /// Starts a transition and returns its key.
    pub fn begin(&mut self, duration: Duration) -> TransitionKey {
        let key = TransitionKey(self.next_key);
        self.next_key += 1;
        self.active.push((key, Transition::new(duration)));
        key
    }

    /// Registers `action` to fire when `key` completes. One waiter per
    /// transition; registering again replaces the action.
    pub fn on_complete(&mut self, key: TransitionKey, action: A) {
        self.waiters.insert(key, (Waiter::Single, Some(action)));
    }

    /// Registers `action` to fire when every listed transition has
    /// completed (a wait-for-N-of-M counter). An empty list fires on the
    /// next tick.
    pub fn on_complete_all(&mut self, keys: &[TransitionKey], action: A) {
        let live: Vec<TransitionKey> = keys
            .iter()
            .copied()
            .filter(|key| self.active.iter().any(|(k, _)| k == key))
            .collect();

        if live.is_empty() {
            self.deferred.push(action);
            return;
        }

        let group = self.next_group;
        self.next_group += 1;
        self.groups.insert(group, (live.len(), action));
        for key in live {
            self.waiters.insert(key, (Waiter::Group(group), None));
        }
    }

    /// Schedules `action` for the next tick, unconditionally. This is the
    /// explicit yield-one-tick step used to force a layout recomputation
    /// between detaching the last cascaded node and appending its
    /// replacement.
    pub fn defer(&mut self, action: A) {
        self.deferred.push(action);
    }

    /// Drops a live transition and any waiter attached to it, without
    /// firing. Completions observed later for this key are no-ops. Returns
    /// whether the key was live.
    pub fn cancel(&mut self, key: TransitionKey) -> bool {
        let before = self.active.len();
        self.active.retain(|(k, _)| *k != key);

        if let Some((Waiter::Group(group), _)) = self.waiters.remove(&key) {
            // The group can no longer complete through this member; shrink
            // its count so the remaining members still release it.
            if let Some((remaining, _)) = self.groups.get_mut(&group) {
                *remaining = remaining.saturating_sub(1);
            }
        }

        self.active.len() != before
    }

    /// Progress of a live transition, or `None` once completed/cancelled.
    #[must_use]
    pub fn progress(&self, key: TransitionKey) -> Option<f32> {
        self.active
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, t)| t.progress())
    }

    /// Whether any transition is live or any action is pending; drives the
    /// tick subscription.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.active.is_empty() || !self.deferred.is_empty()
    }

    /// Advances every live transition by `dt` and returns the actions fired
    /// by this tick: first previously deferred actions, then completion
    /// actions in transition begin order.
    pub fn tick(&mut self, dt: Duration) -> Vec<A> {
        let mut fired: Vec<A> = std::mem::take(&mut self.deferred);

        let mut completed: Vec<TransitionKey> = Vec::new();
        for (key, transition) in &mut self.active {
            transition.advance(dt);
            if transition.is_finished() {
                completed.push(*key);
            }
        }
        self.active.retain(|(_, t)| !t.is_finished());

        for key in completed {
            match self.waiters.remove(&key) {
                Some((Waiter::Single, Some(action))) => fired.push(action),
                Some((Waiter::Group(group), _)) => {
                    let done = match self.groups.get_mut(&group) {
                        Some((remaining, _)) => {
                            *remaining = remaining.saturating_sub(1);
                            *remaining == 0
                        }
                        None => false,
                    };
                    if done {
                        if let Some((_, action)) = self.groups.remove(&group) {
                            fired.push(action);
                        }
                    }
                }
                _ => {} // No waiter: the transition was fire-and-forget.
            }
        }

        fired
    }
}
