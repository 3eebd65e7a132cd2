//! Publish half of the entity event model
//!
//! Every entity owns a [`Notifier`] holding the observers subscribed to it. Broadcasting
//! awaits each observer in subscription order before returning, so an attribute write
//! only completes once every observer has handled the resulting event.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::entities::Subject;
use crate::events::Event;

/// Receives events from the notifiers it is subscribed to
#[async_trait]
pub trait Observer: Send + Sync {
    /// Called by a notifier when something happens to `subject`.
    ///
    /// `event` is `None` for a payload-less notify (e.g. a property value change).
    async fn on_event(&self, subject: Subject<'_>, event: Option<&Event>);
}

/// Ordered set of distinct observers
#[derive(Default)]
pub struct Notifier {
    observers: Vec<Arc<dyn Observer>>,
}

fn same_observer(a: &Arc<dyn Observer>, b: &Arc<dyn Observer>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `observer` unless it is already subscribed. Returns whether it was added.
    pub fn subscribe(&mut self, observer: Arc<dyn Observer>) -> bool {
        if self.is_subscribed(&observer) {
            return false;
        }

        self.observers.push(observer);
        true
    }

    /// Remove `observer` if present. Returns whether it was removed.
    pub fn unsubscribe(&mut self, observer: &Arc<dyn Observer>) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| !same_observer(o, observer));
        before != self.observers.len()
    }

    pub fn is_subscribed(&self, observer: &Arc<dyn Observer>) -> bool {
        self.observers.iter().any(|o| same_observer(o, observer))
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Notify every subscriber, in subscription order.
    ///
    /// The subscriber list is borrowed for the whole broadcast, so observers cannot
    /// change it while it is being walked.
    pub async fn broadcast(&self, subject: Subject<'_>, event: Option<&Event>) {
        for observer in &self.observers {
            observer.on_event(subject, event).await;
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}
