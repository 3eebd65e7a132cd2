//! Status feed monitoring agent
//!
//! Polls an upstream status document describing hosts, their processes and properties,
//! reconciles it into a long-lived tree of observable entities and raises alerts when a
//! threshold is crossed.

pub mod agent;
pub mod alerts;
pub mod config;
pub mod detector;
pub mod entities;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod notify;
pub mod reconcile;
pub mod snapshot;
pub mod xmlrpc;

#[cfg(test)]
mod test_support;

pub use agent::{Agent, AgentHandle, CycleReport};
pub use entities::{Host, HostMap, Process, Property};
pub use error::{DecodeError, EntityError, FetchError};
pub use events::{Event, EventKind};
pub use notify::{Notifier, Observer};
