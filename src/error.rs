//! Error types for the entity model and the snapshot pipeline
//!
//! [`EntityError`] covers violations of the entity API contract. These are programming
//! errors and are propagated to the caller. [`FetchError`] and [`DecodeError`] are the
//! recoverable upstream failures: the agent logs them and skips the cycle.

use thiserror::Error;

use crate::entities::EntityKind;

/// Result type alias for entity operations
pub type EntityResult<T> = Result<T, EntityError>;

/// Contract violations of the entity API
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    /// A textual event kind that is not part of the taxonomy
    #[error("'{0}' is not a valid event kind")]
    InvalidEvent(String),

    /// A property with the same name already exists on the owner
    #[error("property '{property}' already exists on {owner}")]
    DuplicateProperty { owner: String, property: String },

    /// A process with the same name already exists on the host
    #[error("process '{process}' already exists on {owner}")]
    DuplicateProcess { owner: String, process: String },

    /// A plain property was required but something else was given
    #[error("{subject} is not a valid property")]
    InvalidProperty { subject: String, found: EntityKind },

    /// A process was required but something else was given
    #[error("{subject} is not a valid process")]
    InvalidProcess { subject: String, found: EntityKind },

    /// A host was required but something else was given
    #[error("{subject} is not a valid host")]
    InvalidHost { subject: String, found: EntityKind },
}

/// Failures while acquiring the raw status document
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Failures while turning a raw status document into a snapshot tree
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("status document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed status document: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("invalid {field} '{raw}' on {entity}")]
    InvalidNumber {
        entity: String,
        field: &'static str,
        raw: String,
    },

    #[error(transparent)]
    Entity(#[from] EntityError),
}
