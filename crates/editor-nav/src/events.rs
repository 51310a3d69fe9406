//! Listener registries and navigation events.
//!
//! Document edits, "analysis finished" notifications and navigation results are delivered
//! through [`ListenerSet`]s. Subscribing returns a [`Subscription`] guard; dropping the guard
//! unsubscribes, so a listener can never outlive the object that registered it.

use crate::diagnostics::DiagnosticRange;
use crate::search::MatchRange;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Listener callback type.
pub type Listener<E> = Box<dyn FnMut(&E) + Send>;

struct Registry<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
    emitting: bool,
    removed_while_emitting: HashSet<u64>,
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64);
}

impl<E> Unsubscribe for Mutex<Registry<E>> {
    fn unsubscribe(&self, id: u64) {
        let mut registry = lock(self);
        let before = registry.listeners.len();
        registry.listeners.retain(|(lid, _)| *lid != id);
        if registry.emitting && registry.listeners.len() == before {
            registry.removed_while_emitting.insert(id);
        }
    }
}

fn lock<E>(mutex: &Mutex<Registry<E>>) -> MutexGuard<'_, Registry<E>> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A set of listeners for events of type `E`.
///
/// Cloning a `ListenerSet` yields another handle to the same registry.
pub struct ListenerSet<E> {
    inner: Arc<Mutex<Registry<E>>>,
}

impl<E> Clone for ListenerSet<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for ListenerSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> ListenerSet<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
                emitting: false,
                removed_while_emitting: HashSet::new(),
            })),
        }
    }

    /// Register `listener`; it stays registered until the returned guard is dropped.
    #[must_use = "dropping the subscription unsubscribes the listener immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&E) + Send + 'static,
    {
        let id = {
            let mut registry = lock(&self.inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, Box::new(listener)));
            id
        };
        let weak: Weak<dyn Unsubscribe> = Arc::downgrade(&self.inner) as Weak<dyn Unsubscribe>;
        Subscription {
            id,
            registry: Some(weak),
        }
    }

    /// Invoke every listener with `event`.
    ///
    /// Listeners run without the registry lock held, so they may subscribe or drop
    /// subscriptions (including their own) while being notified.
    pub fn emit(&self, event: &E) {
        let mut running = {
            let mut registry = lock(&self.inner);
            registry.emitting = true;
            std::mem::take(&mut registry.listeners)
        };

        for (_, listener) in running.iter_mut() {
            listener(event);
        }

        let mut registry = lock(&self.inner);
        let removed = std::mem::take(&mut registry.removed_while_emitting);
        running.retain(|(id, _)| !removed.contains(id));
        running.append(&mut registry.listeners);
        registry.listeners = running;
        registry.emitting = false;
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    /// Returns `true` when no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guard returned by [`ListenerSet::subscribe`]. Dropping it unsubscribes the listener.
pub struct Subscription {
    id: u64,
    registry: Option<Weak<dyn Unsubscribe>>,
}

impl Subscription {
    /// Unsubscribe now. Equivalent to dropping the guard.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.unsubscribe(self.id);
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
            .field("active", &self.registry.is_some())
            .finish()
    }
}

/// A document edit notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    /// Document version after the edit.
    pub version: u64,
    /// Affected character range in the pre-edit document.
    pub start: usize,
    /// Chars removed.
    pub removed: usize,
    /// Chars inserted.
    pub inserted: usize,
}

/// Fired by a diagnostics provider when a full analysis pass completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisFinished;

/// Events emitted by a [`NavigationSession`](crate::NavigationSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    /// The caret moved to a search match.
    MatchSelected {
        /// The selected match.
        range: MatchRange,
        /// Index of the match within the cached match list.
        index: usize,
        /// Number of cached matches.
        total: usize,
    },
    /// The active search term (or its options) changed.
    SearchTermChanged {
        /// The new term.
        term: String,
    },
    /// The caret moved to a diagnostic.
    DiagnosticSelected(DiagnosticRange),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let set = ListenerSet::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        let sub = set.subscribe(move |v| seen_clone.lock().unwrap().push(*v));
        set.emit(&1);
        drop(sub);
        set.emit(&2);

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_listener_can_drop_its_own_subscription_while_emitting() {
        let set = ListenerSet::<()>::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let count = Arc::new(Mutex::new(0));

        let slot_clone = Arc::clone(&slot);
        let count_clone = Arc::clone(&count);
        let sub = set.subscribe(move |_| {
            *count_clone.lock().unwrap() += 1;
            slot_clone.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(sub);

        set.emit(&());
        set.emit(&());

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_subscription_outliving_registry_is_harmless() {
        let set = ListenerSet::<()>::new();
        let sub = set.subscribe(|_| {});
        drop(set);
        sub.unsubscribe();
    }
}
