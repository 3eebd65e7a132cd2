use serde::Deserialize;
use tracing::{trace, warn};

use super::SnapshotDecoder;
use crate::entities::{Host, HostMap, Process, Property};
use crate::error::DecodeError;

/// Root of the status document. Its element name is not checked.
#[derive(Debug, Deserialize)]
struct StatusDocument {
    #[serde(rename = "host", default)]
    hosts: Vec<HostRecord>,
}

#[derive(Debug, Deserialize)]
struct HostRecord {
    #[serde(rename = "@name")]
    name: String,

    #[serde(rename = "@age", default)]
    age: String,

    #[serde(rename = "@value", default)]
    value: String,

    #[serde(rename = "property", default)]
    properties: Vec<PropertyRecord>,

    #[serde(rename = "process", default)]
    processes: Vec<ProcessRecord>,
}

#[derive(Debug, Deserialize)]
struct ProcessRecord {
    #[serde(rename = "@name")]
    name: String,

    #[serde(rename = "@value", default)]
    value: String,

    #[serde(rename = "@age", default)]
    age: String,

    #[serde(rename = "property", default)]
    properties: Vec<PropertyRecord>,
}

#[derive(Debug, Deserialize)]
struct PropertyRecord {
    #[serde(rename = "@name")]
    name: String,

    #[serde(rename = "@value", default)]
    value: String,
}

/// Decodes the XML status document into a fresh host tree
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDecoder;

impl XmlDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl SnapshotDecoder for XmlDecoder {
    fn decode(&self, raw: &[u8]) -> Result<HostMap, DecodeError> {
        let text = std::str::from_utf8(raw)?;
        let document: StatusDocument = quick_xml::de::from_str(text)?;

        let mut hosts = HostMap::new();
        for record in document.hosts {
            let host = build_host(record)?;
            if let Some(previous) = hosts.insert(host.name().to_string(), host) {
                warn!("{previous} listed more than once, keeping the last entry");
            }
        }

        trace!("decoded {} hosts", hosts.len());
        Ok(hosts)
    }
}

fn build_host(record: HostRecord) -> Result<Host, DecodeError> {
    let label = format!("host {}", record.name);
    let age = parse_age(&label, &record.age)?;
    let value = parse_load(&label, &record.value)?;

    let mut host = Host::new(record.name, age, value);

    for property in record.properties {
        host.add_property(build_property(property), false)?;
    }

    for process in record.processes {
        host.add_process(build_process(process)?, false)?;
    }

    Ok(host)
}

fn build_process(record: ProcessRecord) -> Result<Process, DecodeError> {
    let age = parse_age(&format!("process {}", record.name), &record.age)?;
    let mut process = Process::new(record.name, optional(record.value), age);

    for property in record.properties {
        process.add_property(build_property(property), false)?;
    }

    Ok(process)
}

fn build_property(record: PropertyRecord) -> Property {
    Property::new(record.name, optional(record.value))
}

fn optional(raw: String) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw)
    }
}

/// Whole seconds; an empty attribute means 0 and fractions are truncated
fn parse_age(entity: &str, raw: &str) -> Result<u64, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    if let Ok(age) = trimmed.parse::<u64>() {
        return Ok(age);
    }

    match trimmed.parse::<f64>() {
        Ok(age) if age.is_finite() && age >= 0.0 => Ok(age.trunc() as u64),
        _ => Err(DecodeError::InvalidNumber {
            entity: entity.to_string(),
            field: "age",
            raw: raw.to_string(),
        }),
    }
}

fn parse_load(entity: &str, raw: &str) -> Result<f64, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DecodeError::InvalidNumber {
            entity: entity.to_string(),
            field: "value",
            raw: raw.to_string(),
        }),
    }
}
