//! Remote source, dataset cache and data errors

pub mod cache;
pub mod fdic;
pub mod provider;

pub use cache::{CacheMeta, CachedDataset, DatasetCache};
pub use fdic::{financials_filter, institution_filter, FdicClient, INSTITUTION_FIELDS};
pub use provider::{DataError, FinancialSource, Provenance, Query, Resource};
