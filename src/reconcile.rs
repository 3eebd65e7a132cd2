//! Folds a freshly decoded snapshot into the live tree
//!
//! ## Merge order (per host)
//!
//! ```text
//! host properties   → add missing, overwrite value of existing
//! processes         → add missing; for existing:
//!                       properties → add missing, overwrite value of existing
//!                       value, then age
//! host attributes   → value, then age
//! ```
//!
//! Surviving entities are mutated in place, so their observers stay attached and the
//! threshold detector fires during the merge, while the write is being committed.
//! Entities only present in the fresh snapshot are moved into the live tree without
//! observers and listed in the [`MergeReport`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::detector::Thresholds;
use crate::entities::{Host, HostMap, Process, Property};
use crate::error::EntityResult;
use crate::notify::Observer;

/// An entity that was moved from the fresh snapshot into the live tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adopted {
    Host {
        host: String,
    },
    Process {
        host: String,
        process: String,
    },
    HostProperty {
        host: String,
        property: String,
    },
    ProcessProperty {
        host: String,
        process: String,
        property: String,
    },
}

impl Adopted {
    /// Subscribe `observer` to the adopted entity (recursively for hosts and processes).
    ///
    /// Returns `false` if the entity is no longer in `hosts`.
    pub fn subscribe(&self, hosts: &mut HostMap, observer: Arc<dyn Observer>) -> bool {
        match self {
            Adopted::Host { host } => hosts
                .get_mut(host)
                .map(|h| h.subscribe_recursive(observer))
                .is_some(),
            Adopted::Process { host, process } => hosts
                .get_mut(host)
                .and_then(|h| h.process_mut(process))
                .map(|p| p.subscribe_recursive(observer))
                .is_some(),
            Adopted::HostProperty { host, property } => hosts
                .get_mut(host)
                .and_then(|h| h.property_mut(property))
                .map(|p| p.subscribe(observer))
                .is_some(),
            Adopted::ProcessProperty {
                host,
                process,
                property,
            } => hosts
                .get_mut(host)
                .and_then(|h| h.process_mut(process))
                .and_then(|p| p.property_mut(property))
                .map(|p| p.subscribe(observer))
                .is_some(),
        }
    }
}

impl fmt::Display for Adopted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adopted::Host { host } => write!(f, "host {host}"),
            Adopted::Process { host, process } => write!(f, "process {host}.{process}"),
            Adopted::HostProperty { host, property } => write!(f, "property {host}.{property}"),
            Adopted::ProcessProperty {
                host,
                process,
                property,
            } => write!(f, "property {host}.{process}.{property}"),
        }
    }
}

/// What a merge did to the live tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Entities moved into the live tree, in merge order
    pub adopted: Vec<Adopted>,

    /// Number of live hosts that were updated in place
    pub updated_hosts: usize,
}

/// Merges snapshots into the live tree using a fixed set of thresholds
#[derive(Debug, Clone)]
pub struct Reconciler {
    thresholds: Thresholds,
}

impl Reconciler {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Merge `fresh` into `live`. Hosts missing from `fresh` are left untouched.
    #[instrument(skip_all, fields(live = live.len(), fresh = fresh.len()))]
    pub async fn merge(&self, live: &mut HostMap, fresh: HostMap) -> EntityResult<MergeReport> {
        let mut report = MergeReport::default();

        for (name, fresh_host) in fresh {
            match live.get_mut(&name) {
                Some(host) => {
                    self.merge_host(host, fresh_host, &mut report).await?;
                    report.updated_hosts += 1;
                }
                None => {
                    debug!("adopting new host {name}");
                    live.insert(name.clone(), fresh_host);
                    report.adopted.push(Adopted::Host { host: name });
                }
            }
        }

        trace!(
            "merge done: {} updated, {} adopted",
            report.updated_hosts,
            report.adopted.len()
        );

        Ok(report)
    }

    async fn merge_host(
        &self,
        host: &mut Host,
        fresh: Host,
        report: &mut MergeReport,
    ) -> EntityResult<()> {
        let host_name = host.name().to_string();
        let (age, value) = (fresh.age(), fresh.value());
        let Host {
            properties,
            processes,
            ..
        } = fresh;

        for property in merge_properties(&mut host.properties, properties).await {
            trace!("adopting property {host_name}.{}", property.name());
            report.adopted.push(Adopted::HostProperty {
                host: host_name.clone(),
                property: property.name().to_string(),
            });
            host.add_property(property, false)?;
        }

        for (key, fresh_process) in processes {
            match host.processes.get_mut(&key) {
                Some(process) => {
                    self.merge_process(process, fresh_process, &host_name, report)
                        .await?;
                }
                None => {
                    debug!("adopting new process {host_name}.{}", fresh_process.name());
                    report.adopted.push(Adopted::Process {
                        host: host_name.clone(),
                        process: fresh_process.name().to_string(),
                    });
                    host.add_process(fresh_process, false)?;
                }
            }
        }

        host.set_value(value, &self.thresholds).await;
        host.set_age(age, &self.thresholds).await;

        Ok(())
    }

    async fn merge_process(
        &self,
        process: &mut Process,
        fresh: Process,
        host_name: &str,
        report: &mut MergeReport,
    ) -> EntityResult<()> {
        let age = fresh.age();
        let value = fresh.value().map(str::to_string);

        for property in merge_properties(&mut process.properties, fresh.properties).await {
            trace!(
                "adopting property {host_name}.{}.{}",
                process.name(),
                property.name()
            );
            report.adopted.push(Adopted::ProcessProperty {
                host: host_name.to_string(),
                process: process.name().to_string(),
                property: property.name().to_string(),
            });
            process.add_property(property, false)?;
        }

        process.set_value(value).await;
        process.set_age(age, &self.thresholds).await;

        Ok(())
    }
}

/// Overwrite the values of properties present in both maps and hand back the ones only
/// present in `fresh`, for the caller to add to their owner.
async fn merge_properties(
    live: &mut BTreeMap<String, Property>,
    fresh: BTreeMap<String, Property>,
) -> Vec<Property> {
    let mut missing = Vec::new();

    for (key, fresh_property) in fresh {
        match live.get_mut(&key) {
            Some(property) => {
                property
                    .set_value(fresh_property.value().map(str::to_string))
                    .await;
            }
            None => missing.push(fresh_property),
        }
    }

    missing
}
