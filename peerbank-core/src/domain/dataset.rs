//! The raw dataset: the unit that is fetched, synthesized and cached as a whole.

use super::record::{InstitutionRecord, RawPeriodRecord};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Institution records and quarterly filings, both keyed by canonical entity name.
///
/// Invariant: `institutions` and `financials` share the same key set. Both maps
/// keep insertion order, which is roster order for fetched and synthesized data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    #[serde(rename = "institutions_data")]
    pub institutions: IndexMap<String, InstitutionRecord>,
    #[serde(rename = "financials_data")]
    pub financials: IndexMap<String, Vec<RawPeriodRecord>>,
}

impl RawDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity with its institution record and filings, keeping the
    /// key sets aligned.
    pub fn insert_entity(
        &mut self,
        name: impl Into<String>,
        institution: InstitutionRecord,
        records: Vec<RawPeriodRecord>,
    ) {
        let name = name.into();
        self.institutions.insert(name.clone(), institution);
        self.financials.insert(name, records);
    }

    /// True when no institution has been collected.
    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty()
    }

    pub fn entity_count(&self) -> usize {
        self.institutions.len()
    }

    /// Total number of period records across all entities.
    pub fn record_count(&self) -> usize {
        self.financials.values().map(Vec::len).sum()
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.institutions.keys().map(String::as_str)
    }

    /// Check the shared-key-set invariant. Returns the first offending key.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(k) = self
            .financials
            .keys()
            .find(|k| !self.institutions.contains_key(*k))
        {
            return Err(format!("financials for '{k}' have no institution record"));
        }
        if let Some(k) = self
            .institutions
            .keys()
            .find(|k| !self.financials.contains_key(*k))
        {
            return Err(format!("institution '{k}' has no financials entry"));
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash over the serialized dataset.
    pub fn content_hash(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }
}
