//! The live object model: hosts, their processes and named properties
//!
//! ```text
//! Host ──┬── Property*
//!        └── Process* ── Property*
//! ```
//!
//! Children are held by value in case-insensitive maps. A child knows its owner only by
//! name ([`Owner`]), so there is never a pointer back up the tree.

mod host;
mod process;
mod property;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

pub use host::Host;
pub use process::Process;
pub use property::Property;

/// Top-level mapping of host name to host
pub type HostMap = BTreeMap<String, Host>;

/// Lookup key for child maps
pub(crate) fn key(name: &str) -> String {
    name.to_lowercase()
}

/// The three kinds of entity in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Host,
    Process,
    Property,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Host => f.write_str("host"),
            EntityKind::Process => f.write_str("process"),
            EntityKind::Property => f.write_str("property"),
        }
    }
}

/// Where a property or process is attached
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Owner {
    /// Not attached yet
    #[default]
    None,
    /// Attached directly to a host
    Host { host: String },
    /// Attached to a process, which may itself not be attached to a host yet
    Process {
        host: Option<String>,
        process: String,
    },
}

impl Owner {
    /// Dotted path of the owner, e.g. `web1.httpd`
    pub fn path(&self) -> Option<String> {
        match self {
            Owner::None => None,
            Owner::Host { host } => Some(host.clone()),
            Owner::Process {
                host: Some(host),
                process,
            } => Some(format!("{host}.{process}")),
            Owner::Process {
                host: None,
                process,
            } => Some(process.clone()),
        }
    }

    /// Name of the host at the root of the owner chain, if any
    pub fn host(&self) -> Option<&str> {
        match self {
            Owner::None => None,
            Owner::Host { host } => Some(host),
            Owner::Process { host, .. } => host.as_deref(),
        }
    }
}

/// Borrowed view of the entity an observer is notified about
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Host(&'a Host),
    Process(&'a Process),
    Property(&'a Property),
}

impl Subject<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Subject::Host(_) => EntityKind::Host,
            Subject::Process(_) => EntityKind::Process,
            Subject::Property(_) => EntityKind::Property,
        }
    }

    /// The subject's committed `value`, rendered as text
    pub fn current_value(&self) -> Option<String> {
        match self {
            Subject::Host(host) => Some(host.value().to_string()),
            Subject::Process(process) => process.value().map(str::to_string),
            Subject::Property(property) => property.value().map(str::to_string),
        }
    }
}

impl fmt::Display for Subject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Host(host) => host.fmt(f),
            Subject::Process(process) => process.fmt(f),
            Subject::Property(property) => property.fmt(f),
        }
    }
}

/// A child entity to be added to a host or process
#[derive(Debug)]
pub enum Item {
    Property(Property),
    Process(Process),
}

impl Item {
    pub fn kind(&self) -> EntityKind {
        match self {
            Item::Property(_) => EntityKind::Property,
            Item::Process(_) => EntityKind::Process,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Property(property) => property.name(),
            Item::Process(process) => process.name(),
        }
    }
}

impl From<Property> for Item {
    fn from(property: Property) -> Self {
        Item::Property(property)
    }
}

impl From<Process> for Item {
    fn from(process: Process) -> Self {
        Item::Process(process)
    }
}

/// Serializable read-only view of a host, used for inspection and debug dumps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostSummary {
    pub name: String,
    pub age: u64,
    pub value: f64,
    pub observers: usize,
    pub properties: BTreeMap<String, Option<String>>,
    pub processes: Vec<ProcessSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSummary {
    pub name: String,
    pub age: u64,
    pub value: Option<String>,
    pub observers: usize,
    pub properties: BTreeMap<String, Option<String>>,
}
