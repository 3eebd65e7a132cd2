use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::{Owner, Subject};
use crate::notify::{Notifier, Observer};

/// A named value reported for a host or a process
#[derive(Debug)]
pub struct Property {
    name: String,
    value: Option<String>,
    owner: Owner,
    notifier: Notifier,
}

impl Property {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            owner: Owner::None,
            notifier: Notifier::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Owner) {
        self.owner = owner;
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn subscribe(&mut self, observer: Arc<dyn Observer>) -> bool {
        self.notifier.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, observer: &Arc<dyn Observer>) -> bool {
        self.notifier.unsubscribe(observer)
    }

    /// Overwrite the value. No threshold rule applies to properties; a change is
    /// committed first and then announced with a payload-less notify.
    ///
    /// Returns whether the value changed.
    pub async fn set_value(&mut self, value: Option<String>) -> bool {
        if self.value == value {
            return false;
        }

        trace!("{self}: {:?} -> {value:?}", self.value);
        self.value = value;
        self.notifier.broadcast(Subject::Property(self), None).await;
        true
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner.path() {
            Some(path) => write!(f, "Property {path}.{}", self.name),
            None => write!(f, "Property {}", self.name),
        }
    }
}
