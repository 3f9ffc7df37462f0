//! trace_graph: latency tracing over a directed graph of services
//!
//! Core library for recording service-to-service latency samples and answering
//! trace queries (path latency, hop-bounded counts, minimum-latency traces and
//! latency-bounded counts) through an exhaustive depth-first traversal.

pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod link;
pub mod query;
pub mod report;
pub mod telemetry;
pub mod traversal;

pub use error::TraceError;
pub use graph::ServiceGraph;
pub use query::{PathLatency, StopCondition, Trace};

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::sync::Arc;

/// Latency of a single hop or a whole trace, in the input's unit.
pub type Latency = i64;

/// Service identifier.
///
/// Observed inputs use single letters, but any non-empty string is a valid
/// name. The string is shared, so cloning an id is a reference-count bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceId(Arc<str>);

impl ServiceId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
