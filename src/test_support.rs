//! Shared fixtures for unit tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::entities::Subject;
use crate::events::{Event, EventKind};
use crate::notify::Observer;

/// A single notification as seen by a [`Recorder`]
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subject: String,
    pub kind: Option<EventKind>,
    pub value: Option<String>,
}

/// Observer that records everything it is notified about
#[derive(Default)]
pub struct Recorder {
    name: String,
    order: Option<Arc<Mutex<Vec<String>>>>,
    seen: Mutex<Vec<Notification>>,
}

impl Recorder {
    /// A recorder that also appends its name to a log shared with other recorders
    pub fn shared(name: &str, order: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            order: Some(order),
            seen: Mutex::default(),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<EventKind> {
        self.notifications()
            .into_iter()
            .filter_map(|n| n.kind)
            .collect()
    }
}

#[async_trait]
impl Observer for Recorder {
    async fn on_event(&self, subject: Subject<'_>, event: Option<&Event>) {
        if let Some(order) = &self.order {
            order.lock().unwrap().push(self.name.clone());
        }

        self.seen.lock().unwrap().push(Notification {
            subject: subject.to_string(),
            kind: event.map(Event::kind),
            value: subject.current_value(),
        });
    }
}
