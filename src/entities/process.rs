use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{EntityKind, Item, Owner, ProcessSummary, Property, Subject, key};
use crate::detector::{self, Thresholds};
use crate::error::{EntityError, EntityResult};
use crate::events::Event;
use crate::notify::{Notifier, Observer};

/// A process reported by a host, with its status, age and own properties
#[derive(Debug)]
pub struct Process {
    name: String,
    value: Option<String>,
    age: u64,
    owner: Owner,
    pub(crate) properties: BTreeMap<String, Property>,
    notifier: Notifier,
}

impl Process {
    pub fn new(name: impl Into<String>, value: Option<String>, age: u64) -> Self {
        Self {
            name: name.into(),
            value,
            age,
            owner: Owner::None,
            properties: BTreeMap::new(),
            notifier: Notifier::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reported status, e.g. `running`
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Seconds since the process last reported
    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Attach to a new owner and re-root the owner path of every property
    pub(crate) fn set_owner(&mut self, owner: Owner) {
        self.owner = owner;

        let property_owner = self.property_owner();
        for property in self.properties.values_mut() {
            property.set_owner(property_owner.clone());
        }
    }

    fn property_owner(&self) -> Owner {
        Owner::Process {
            host: self.owner.host().map(str::to_string),
            process: self.name.clone(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(&key(name))
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(&key(name))
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Add a property, replacing an existing one of the same name only if `overwrite`
    /// is set. A replaced property is dropped along with its observers.
    pub fn add_property(&mut self, mut property: Property, overwrite: bool) -> EntityResult<()> {
        let key = key(property.name());

        if !overwrite && self.properties.contains_key(&key) {
            return Err(EntityError::DuplicateProperty {
                owner: self.to_string(),
                property: property.name().to_string(),
            });
        }

        property.set_owner(self.property_owner());
        self.properties.insert(key, property);
        Ok(())
    }

    /// Add a generic child. Processes cannot be nested, so only properties are accepted.
    pub fn add_item(&mut self, item: Item, overwrite: bool) -> EntityResult<()> {
        match item {
            Item::Property(property) => self.add_property(property, overwrite),
            Item::Process(process) => Err(EntityError::InvalidProperty {
                subject: process.to_string(),
                found: EntityKind::Process,
            }),
        }
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

    /// Subscribe `observer` to this process and all of its properties
    pub fn subscribe_recursive(&mut self, observer: Arc<dyn Observer>) {
        self.notifier.subscribe(observer.clone());

        for property in self.properties.values_mut() {
            property.subscribe(observer.clone());
        }
    }

    /// Write the age, emitting [`EventKind::ProcessTimeout`](crate::events::EventKind)
    /// when it changed and exceeds the timeout.
    pub async fn set_age(&mut self, age: u64, thresholds: &Thresholds) {
        let evaluation = detector::evaluate_age(self.age, age, thresholds);
        trace!("{self}: age {} -> {age} ({evaluation:?})", self.age);

        if evaluation.fires() {
            debug!("{self} timed out ({age}s > {}s)", thresholds.timeout);
            let event = Event::process_timeout(self, age);
            self.notifier
                .broadcast(Subject::Process(self), Some(&event))
                .await;
        }

        self.age = age;
    }

    /// Write the status, emitting [`EventKind::ProcessStopped`](crate::events::EventKind)
    /// according to [`detector::evaluate_status`].
    pub async fn set_value(&mut self, value: Option<String>) {
        let evaluation = detector::evaluate_status(self.value(), value.as_deref());
        trace!("{self}: status {:?} -> {value:?} ({evaluation:?})", self.value);

        if evaluation.fires() {
            let status = value.as_deref().unwrap_or_default();
            debug!("{self} changed status to '{status}'");
            let event = Event::process_stopped(self, status);
            self.notifier
                .broadcast(Subject::Process(self), Some(&event))
                .await;
        }

        self.value = value;
    }

    pub fn summary(&self) -> ProcessSummary {
        ProcessSummary {
            name: self.name.clone(),
            age: self.age,
            value: self.value.clone(),
            observers: self.notifier.len(),
            properties: self
                .properties
                .values()
                .map(|p| (p.name().to_string(), p.value().map(str::to_string)))
                .collect(),
        }
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner.path() {
            Some(path) => write!(f, "Process {path}.{}", self.name),
            None => write!(f, "Process {}", self.name),
        }
    }
}
