use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{HostSummary, Item, Owner, Process, Property, Subject, key};
use crate::detector::{self, Thresholds};
use crate::error::{EntityError, EntityResult};
use crate::events::Event;
use crate::notify::{Notifier, Observer};

/// A monitored machine, identified by its name
#[derive(Debug)]
pub struct Host {
    name: String,
    age: u64,
    value: f64,
    pub(crate) properties: BTreeMap<String, Property>,
    pub(crate) processes: BTreeMap<String, Process>,
    notifier: Notifier,
}

impl Host {
    pub fn new(name: impl Into<String>, age: u64, value: f64) -> Self {
        Self {
            name: name.into(),
            age,
            value,
            properties: BTreeMap::new(),
            processes: BTreeMap::new(),
            notifier: Notifier::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seconds since the host last reported
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Load average
    pub fn value(&self) -> f64 {
        self.value
    }

    fn as_owner(&self) -> Owner {
        Owner::Host {
            host: self.name.clone(),
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

    pub fn process(&self, name: &str) -> Option<&Process> {
        self.processes.get(&key(name))
    }

    pub fn process_mut(&mut self, name: &str) -> Option<&mut Process> {
        self.processes.get_mut(&key(name))
    }

    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
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

        property.set_owner(self.as_owner());
        self.properties.insert(key, property);
        Ok(())
    }

    /// Add a process, replacing an existing one of the same name only if `overwrite`
    /// is set.
    pub fn add_process(&mut self, mut process: Process, overwrite: bool) -> EntityResult<()> {
        let key = key(process.name());

        if !overwrite && self.processes.contains_key(&key) {
            return Err(EntityError::DuplicateProcess {
                owner: self.to_string(),
                process: process.name().to_string(),
            });
        }

        process.set_owner(self.as_owner());
        self.processes.insert(key, process);
        Ok(())
    }

    /// Add a generic child to the mapping matching its kind
    pub fn add_item(&mut self, item: Item, overwrite: bool) -> EntityResult<()> {
        match item {
            Item::Property(property) => self.add_property(property, overwrite),
            Item::Process(process) => self.add_process(process, overwrite),
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

    /// Subscribe `observer` to this host and every process and property below it
    pub fn subscribe_recursive(&mut self, observer: Arc<dyn Observer>) {
        self.notifier.subscribe(observer.clone());

        for process in self.processes.values_mut() {
            process.subscribe_recursive(observer.clone());
        }

        for property in self.properties.values_mut() {
            property.subscribe(observer.clone());
        }
    }

    /// Write the age, emitting [`EventKind::HostTimeout`](crate::events::EventKind) when
    /// it changed and exceeds the timeout.
    pub async fn set_age(&mut self, age: u64, thresholds: &Thresholds) {
        let evaluation = detector::evaluate_age(self.age, age, thresholds);
        trace!("{self}: age {} -> {age} ({evaluation:?})", self.age);

        if evaluation.fires() {
            debug!("{self} timed out ({age}s > {}s)", thresholds.timeout);
            let event = Event::host_timeout(self, age);
            self.notifier.broadcast(Subject::Host(self), Some(&event)).await;
        }

        self.age = age;
    }

    /// Write the load average, emitting
    /// [`EventKind::HighLoadAverage`](crate::events::EventKind) when it changed and
    /// exceeds the configured ceiling.
    pub async fn set_value(&mut self, value: f64, thresholds: &Thresholds) {
        let evaluation = detector::evaluate_load(self.value, value, thresholds);
        trace!("{self}: load {} -> {value} ({evaluation:?})", self.value);

        if evaluation.fires() {
            debug!(
                "{self} load average is high ({value} > {})",
                thresholds.load_average_high
            );
            let event = Event::high_load_average(self, value);
            self.notifier.broadcast(Subject::Host(self), Some(&event)).await;
        }

        self.value = value;
    }

    pub fn summary(&self) -> HostSummary {
        HostSummary {
            name: self.name.clone(),
            age: self.age,
            value: self.value,
            observers: self.notifier.len(),
            properties: self
                .properties
                .values()
                .map(|p| (p.name().to_string(), p.value().map(str::to_string)))
                .collect(),
            processes: self.processes.values().map(Process::summary).collect(),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host {}", self.name)
    }
}
