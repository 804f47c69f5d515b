//! Data repository: cache-or-fetch for a roster over a reporting window.
//!
//! Resolution order:
//! 1. Cache entry for the exact window → returned as is (no freshness check)
//! 2. Live fetch, up to `retry.max_attempts` whole-roster attempts; stops
//!    early once any institution is collected
//! 3. Synthetic fallback when more than half of the roster failed on the
//!    last attempt, or nothing was collected
//!
//! Whatever is returned from steps 2 and 3 is written to the cache. No error
//! leaves this module: cache failures degrade to a miss or a skipped write,
//! entity failures are counted, batch failure becomes synthetic data.

use crate::synthetic::SyntheticGenerator;
use peerbank_core::config::{PipelineConfig, RetryConfig};
use peerbank_core::data::{
    financials_filter, institution_filter, DataError, DatasetCache, FinancialSource, Provenance,
    Query, Resource, INSTITUTION_FIELDS,
};
use peerbank_core::domain::{
    financial_field_list, DateWindow, InstitutionRecord, RawDataset, RawPeriodRecord, RawRecord,
    Roster, RosterEntry,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Result of a repository fetch.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub dataset: RawDataset,
    pub provenance: Provenance,
    /// True when the dataset was read from the cache.
    pub from_cache: bool,
}

/// One entity successfully resolved and fetched.
struct EntityData {
    name: String,
    institution: InstitutionRecord,
    filings: Vec<RawPeriodRecord>,
}

/// What one whole-roster attempt produced.
#[derive(Debug, Default)]
struct Attempt {
    dataset: RawDataset,
    failures: usize,
}

pub struct DataRepository {
    source: Box<dyn FinancialSource>,
    cache: DatasetCache,
    retry: RetryConfig,
    page_limit: u32,
    synthetic: SyntheticGenerator,
}

impl DataRepository {
    pub fn new(
        source: Box<dyn FinancialSource>,
        cache: DatasetCache,
        retry: RetryConfig,
        page_limit: u32,
        synthetic: SyntheticGenerator,
    ) -> Self {
        Self {
            source,
            cache,
            retry,
            page_limit,
            synthetic,
        }
    }

    pub fn from_config(source: Box<dyn FinancialSource>, config: &PipelineConfig) -> Self {
        Self::new(
            source,
            DatasetCache::new(&config.cache.dir),
            config.retry.clone(),
            config.api.page_limit,
            SyntheticGenerator::new(config.synthetic.seed),
        )
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Cache-first fetch for a roster over a window.
    pub fn fetch_for_roster(&self, roster: &Roster, window: &DateWindow) -> FetchOutcome {
        if let Some(hit) = self.load_cached(window) {
            info!(window = %window, provenance = %hit.provenance, "using cached data");
            return hit;
        }
        self.refresh(roster, window)
    }

    /// Fetch ignoring any cache entry, then overwrite it.
    pub fn refresh(&self, roster: &Roster, window: &DateWindow) -> FetchOutcome {
        info!(window = %window, source = self.source.name(), "fetching fresh data");

        let attempt = self.fetch_with_retry(roster, window);
        let too_many_failures = attempt.failures * 2 > roster.len();

        let (dataset, provenance) = if too_many_failures || attempt.dataset.is_empty() {
            warn!(
                failures = attempt.failures,
                roster = roster.len(),
                collected = attempt.dataset.entity_count(),
                "live fetch unusable, using fallback data"
            );
            (self.synthetic.generate(roster, window), Provenance::Synthetic)
        } else {
            (attempt.dataset, Provenance::Live)
        };

        self.persist(window, &dataset, provenance);

        FetchOutcome {
            dataset,
            provenance,
            from_cache: false,
        }
    }

    fn load_cached(&self, window: &DateWindow) -> Option<FetchOutcome> {
        match self.cache.load(window) {
            Ok(Some(cached)) => Some(FetchOutcome {
                provenance: cached
                    .meta
                    .map(|m| m.provenance)
                    .unwrap_or(Provenance::Live),
                dataset: cached.dataset,
                from_cache: true,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(window = %window, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    fn persist(&self, window: &DateWindow, dataset: &RawDataset, provenance: Provenance) {
        match self.cache.store(window, dataset, provenance) {
            Ok(meta) => debug!(
                path = %self.cache.entry_path(window).display(),
                entities = meta.entity_count,
                records = meta.record_count,
                "cached dataset"
            ),
            Err(e) => error!(window = %window, error = %e, "failed to write cache"),
        }
    }

    fn fetch_with_retry(&self, roster: &Roster, window: &DateWindow) -> Attempt {
        let mut last = Attempt::default();
        for attempt in 1..=self.retry.max_attempts.max(1) {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            if attempt > 1 {
                info!(attempt, "retrying live fetch");
            }

            last = self.fetch_attempt(roster, window);
            if !last.dataset.is_empty() {
                break;
            }
            warn!(attempt, failures = last.failures, "no institutions collected");
        }
        last
    }

    /// One pass over the whole roster. Per-entity failures are logged and counted.
    fn fetch_attempt(&self, roster: &Roster, window: &DateWindow) -> Attempt {
        let mut attempt = Attempt::default();
        for entry in roster.iter() {
            match self.fetch_entity(entry, window) {
                Ok(data) => {
                    info!(
                        entity = %data.name,
                        records = data.filings.len(),
                        "fetched filings"
                    );
                    attempt
                        .dataset
                        .insert_entity(data.name, data.institution, data.filings);
                }
                Err(e) => {
                    warn!(entity = %entry.name, error = %e, "entity fetch failed");
                    attempt.failures += 1;
                }
            }
        }
        attempt
    }

    fn fetch_entity(
        &self,
        entry: &RosterEntry,
        window: &DateWindow,
    ) -> Result<EntityData, DataError> {
        let filter = institution_filter(&entry.lookup());
        let institutions = self.source.fetch_collection(
            Resource::Institutions,
            &Query {
                filter: filter.clone(),
                fields: INSTITUTION_FIELDS.into(),
                limit: self.page_limit,
            },
        );

        let first = institutions
            .into_iter()
            .next()
            .ok_or(DataError::EntityNotFound { lookup: filter })?;
        let institution = unwrap_envelope(first).ok_or_else(|| DataError::MalformedEnvelope {
            entity: entry.name.clone(),
            reason: "institution envelope has no data object".into(),
        })?;

        let (name, cert) = match (institution.text("NAME"), institution.text("CERT")) {
            (Some(name), Some(cert)) => (name, cert),
            _ => {
                return Err(DataError::MalformedEnvelope {
                    entity: entry.name.clone(),
                    reason: "institution record lacks NAME or CERT".into(),
                })
            }
        };

        let filings = self
            .source
            .fetch_collection(
                Resource::Financials,
                &Query {
                    filter: financials_filter(&cert, Some(window)),
                    fields: financial_field_list(),
                    limit: self.page_limit,
                },
            )
            .into_iter()
            .filter_map(unwrap_envelope)
            .collect();

        Ok(EntityData {
            name,
            institution,
            filings,
        })
    }
}

/// `{"data": {...}}` → the inner record.
fn unwrap_envelope(envelope: Value) -> Option<RawRecord> {
    match envelope {
        Value::Object(mut map) => map.remove("data").and_then(RawRecord::from_value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelopes_unwrap_only_data_objects() {
        let ok = unwrap_envelope(json!({"data": {"NAME": "X", "CERT": 1}})).unwrap();
        assert_eq!(ok.text("CERT").as_deref(), Some("1"));
        assert!(unwrap_envelope(json!({"NAME": "X"})).is_none());
        assert!(unwrap_envelope(json!({"data": [1, 2]})).is_none());
        assert!(unwrap_envelope(json!("data")).is_none());
    }
}
