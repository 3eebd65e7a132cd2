//! Acquisition and decoding of the upstream status document
//!
//! ```text
//! SnapshotSource::fetch → raw bytes → SnapshotDecoder::decode → HostMap
//! ```
//!
//! A decoded [`HostMap`] is a complete, unobserved tree. It either becomes the live tree
//! (first cycle) or is merged into it by the [`Reconciler`](crate::reconcile::Reconciler).

mod http;
mod xml;

use async_trait::async_trait;

use crate::entities::HostMap;
use crate::error::{DecodeError, FetchError};

pub use http::HttpSnapshotSource;
pub use xml::XmlDecoder;

/// Fetches the raw status document
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;

    /// Human readable origin, used in logs
    fn describe(&self) -> String;
}

/// Turns a raw status document into a fresh entity tree
pub trait SnapshotDecoder: Send + Sync {
    fn decode(&self, raw: &[u8]) -> Result<HostMap, DecodeError>;
}
