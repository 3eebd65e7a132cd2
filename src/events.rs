//! Domain events raised by the threshold detector
//!
//! An [`Event`] is an immutable record of "something happened to entity X". It carries
//! the kind tag used by the alert template table, the label of the subject it was
//! raised for and the value that triggered it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{EntityKind, Host, Process, Subject};
use crate::error::{EntityError, EntityResult};

/// The event taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventKind {
    /// A host has not reported in for longer than the timeout
    HostTimeout,
    /// A host's load average went above the configured ceiling
    HighLoadAverage,
    /// A process has not reported in for longer than the timeout
    ProcessTimeout,
    /// A process reported a status change (see [`crate::detector::evaluate_status`])
    ProcessStopped,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::HostTimeout,
        EventKind::HighLoadAverage,
        EventKind::ProcessTimeout,
        EventKind::ProcessStopped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::HostTimeout => "HostTimeout",
            EventKind::HighLoadAverage => "HighLoadAverage",
            EventKind::ProcessTimeout => "ProcessTimeout",
            EventKind::ProcessStopped => "ProcessStopped",
        }
    }

    /// The entity kind an event of this kind must be raised for
    pub fn subject_kind(&self) -> EntityKind {
        match self {
            EventKind::HostTimeout | EventKind::HighLoadAverage => EntityKind::Host,
            EventKind::ProcessTimeout | EventKind::ProcessStopped => EntityKind::Process,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EntityError::InvalidEvent(s.to_string()))
    }
}

impl TryFrom<String> for EventKind {
    type Error = EntityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Something that happened to a host or a process
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: EventKind,
    entity: EntityKind,
    subject: String,
    observed: String,
    timestamp: DateTime<Utc>,
}

impl Event {
    /// Create an event for `subject`, observing the subject's current attribute.
    ///
    /// Fails if the subject is not of the entity kind the event kind requires.
    pub fn new(kind: EventKind, subject: Subject<'_>) -> EntityResult<Event> {
        let expected = kind.subject_kind();
        let found = subject.kind();

        if found != expected {
            let subject = subject.to_string();
            return Err(match expected {
                EntityKind::Host => EntityError::InvalidHost { subject, found },
                EntityKind::Process => EntityError::InvalidProcess { subject, found },
                EntityKind::Property => EntityError::InvalidProperty { subject, found },
            });
        }

        let observed = match (kind, subject) {
            (EventKind::HostTimeout, Subject::Host(host)) => host.age().to_string(),
            (EventKind::HighLoadAverage, Subject::Host(host)) => host.value().to_string(),
            (EventKind::ProcessTimeout, Subject::Process(process)) => process.age().to_string(),
            (EventKind::ProcessStopped, Subject::Process(process)) => {
                process.value().unwrap_or_default().to_string()
            }
            _ => String::new(),
        };

        Ok(Self::raise(kind, subject, observed))
    }

    pub(crate) fn host_timeout(host: &Host, age: u64) -> Event {
        Self::raise(EventKind::HostTimeout, Subject::Host(host), age.to_string())
    }

    pub(crate) fn high_load_average(host: &Host, value: f64) -> Event {
        Self::raise(EventKind::HighLoadAverage, Subject::Host(host), value.to_string())
    }

    pub(crate) fn process_timeout(process: &Process, age: u64) -> Event {
        Self::raise(EventKind::ProcessTimeout, Subject::Process(process), age.to_string())
    }

    pub(crate) fn process_stopped(process: &Process, value: &str) -> Event {
        Self::raise(EventKind::ProcessStopped, Subject::Process(process), value.to_string())
    }

    fn raise(kind: EventKind, subject: Subject<'_>, observed: String) -> Event {
        Event {
            kind,
            entity: subject.kind(),
            subject: subject.to_string(),
            observed,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Entity kind of the subject
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Display label of the subject (e.g. `Host web1`)
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The attribute value that triggered the event
    pub fn observed(&self) -> &str {
        &self.observed
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} ({})", self.kind, self.subject, self.observed)
    }
}
