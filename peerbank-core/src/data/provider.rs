//! Financial source trait and structured error types.
//!
//! The FinancialSource trait abstracts over the remote regulator API so the
//! repository can be driven by a mock in tests. Implementations own the
//! transport; they never surface transport errors to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Structured error types for data operations.
///
/// These never cross the repository boundary: they are logged and converted
/// into an empty collection, a skipped entity, a cache miss, or a fallback.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("no institution matched {lookup}")]
    EntityNotFound { lookup: String },

    #[error("malformed envelope for {entity}: {reason}")]
    MalformedEnvelope { entity: String, reason: String },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("data error: {0}")]
    Other(String),
}

/// The two read-only collections exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Institutions,
    Financials,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::Institutions => "institutions",
            Resource::Financials => "financials",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Parameters of one collection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub filter: String,
    pub fields: String,
    pub limit: u32,
}

/// Where a dataset's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Fetched from the remote source.
    Live,
    /// Produced by the fallback generator.
    Synthetic,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live => f.write_str("live"),
            Provenance::Synthetic => f.write_str("synthetic"),
        }
    }
}

/// A queryable source of regulator collections.
///
/// `fetch_collection` returns the raw envelopes of the response's top-level
/// `data` list (each expected to be `{"data": {...}}`). Transport failures
/// are logged by the implementation and yield an empty list.
pub trait FinancialSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn fetch_collection(&self, resource: Resource, query: &Query) -> Vec<Value>;
}
