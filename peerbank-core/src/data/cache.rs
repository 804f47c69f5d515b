//! Flat JSON cache of raw datasets, keyed by reporting window.
//!
//! Layout: `{cache_dir}/bank_data_{start}_{end}.json` plus a metadata sidecar
//! `{cache_dir}/bank_data_{start}_{end}.meta.json`.
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Integrity validation on load (parse + shared-key-set invariant)
//! - Quarantine for corrupt files ({filename}.quarantined)
//! - No expiry: an entry lives until it is removed explicitly

use super::provider::{DataError, Provenance};
use crate::domain::{DateWindow, RawDataset};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const ENTRY_PREFIX: &str = "bank_data_";
const META_SUFFIX: &str = ".meta.json";

/// Metadata sidecar for a cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub entity_count: usize,
    pub record_count: usize,
    pub data_hash: String,
    pub provenance: Provenance,
    pub cached_at: chrono::NaiveDateTime,
}

/// A dataset read back from the cache.
#[derive(Debug, Clone)]
pub struct CachedDataset {
    pub dataset: RawDataset,
    /// Sidecar metadata, if the sidecar exists and parses.
    pub meta: Option<CacheMeta>,
}

/// The dataset cache.
#[derive(Debug, Clone)]
pub struct DatasetCache {
    cache_dir: PathBuf,
}

impl DatasetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the dataset file for a window.
    pub fn entry_path(&self, window: &DateWindow) -> PathBuf {
        self.cache_dir
            .join(format!("{ENTRY_PREFIX}{}.json", window.cache_key()))
    }

    fn meta_path(&self, window: &DateWindow) -> PathBuf {
        self.cache_dir
            .join(format!("{ENTRY_PREFIX}{}{META_SUFFIX}", window.cache_key()))
    }

    pub fn contains(&self, window: &DateWindow) -> bool {
        self.entry_path(window).is_file()
    }

    /// Load the entry for a window.
    ///
    /// Returns `Ok(None)` when no entry exists. A file that fails to parse or
    /// violates the dataset invariant is quarantined, together with its
    /// sidecar, and reported as an error.
    pub fn load(&self, window: &DateWindow) -> Result<Option<CachedDataset>, DataError> {
        let path = self.entry_path(window);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| DataError::CacheError(format!("read {}: {e}", path.display())))?;

        let dataset = match parse_and_validate(&content) {
            Ok(ds) => ds,
            Err(reason) => {
                let quarantine = path.with_extension("json.quarantined");
                warn!(
                    path = %path.display(),
                    %reason,
                    "quarantining corrupt cache file"
                );
                let _ = fs::rename(&path, &quarantine);
                let meta = self.meta_path(window);
                if meta.exists() {
                    let _ = fs::rename(&meta, meta.with_extension("json.quarantined"));
                }
                return Err(DataError::CacheError(format!(
                    "corrupt cache file {}: {reason}",
                    path.display()
                )));
            }
        };

        Ok(Some(CachedDataset {
            dataset,
            meta: self.get_meta(window),
        }))
    }

    /// Write a dataset and its sidecar for a window.
    pub fn store(
        &self,
        window: &DateWindow,
        dataset: &RawDataset,
        provenance: Provenance,
    ) -> Result<CacheMeta, DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let json = serde_json::to_vec(dataset)
            .map_err(|e| DataError::CacheError(format!("dataset serialization: {e}")))?;
        write_atomic(&self.entry_path(window), &json)?;

        let meta = CacheMeta {
            start_date: window.start(),
            end_date: window.end(),
            entity_count: dataset.entity_count(),
            record_count: dataset.record_count(),
            data_hash: blake3::hash(&json).to_hex().to_string(),
            provenance,
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_vec_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        write_atomic(&self.meta_path(window), &meta_json)?;

        Ok(meta)
    }

    /// Sidecar metadata for a window, if present and readable.
    pub fn get_meta(&self, window: &DateWindow) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(window)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Metadata of every entry with a readable sidecar and a dataset file,
    /// ordered by window. Orphaned sidecars are skipped.
    pub fn status(&self) -> Vec<CacheMeta> {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };

        let mut metas: Vec<CacheMeta> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(ENTRY_PREFIX) && n.ends_with(META_SUFFIX))
            })
            .filter_map(|p| fs::read_to_string(p).ok())
            .filter_map(|c| serde_json::from_str::<CacheMeta>(&c).ok())
            .filter(|m| {
                DateWindow::new(m.start_date, m.end_date)
                    .is_ok_and(|w| self.entry_path(&w).is_file())
            })
            .collect();

        metas.sort_by_key(|m| (m.start_date, m.end_date));
        metas
    }

    /// Remove the entry for a window. Returns true if a dataset file existed.
    pub fn remove(&self, window: &DateWindow) -> Result<bool, DataError> {
        let path = self.entry_path(window);
        let existed = path.exists();
        for p in [path, self.meta_path(window)] {
            if p.exists() {
                fs::remove_file(&p)
                    .map_err(|e| DataError::CacheError(format!("remove {}: {e}", p.display())))?;
            }
        }
        Ok(existed)
    }

    /// Remove every cache file (entries, sidecars, quarantined files).
    /// Returns the number of files deleted.
    pub fn clear(&self) -> Result<usize, DataError> {
        if !self.cache_dir.exists() {
            return Ok(0);
        }
        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let path = entry.path();
            let is_ours = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(ENTRY_PREFIX));
            if path.is_file() && is_ours {
                fs::remove_file(&path)
                    .map_err(|e| DataError::CacheError(format!("remove: {e}")))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn parse_and_validate(content: &str) -> Result<RawDataset, String> {
    let dataset: RawDataset = serde_json::from_str(content).map_err(|e| e.to_string())?;
    dataset.validate()?;
    Ok(dataset)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DataError> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, bytes)
        .map_err(|e| DataError::CacheError(format!("write {}: {e}", tmp_path.display())))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::CacheError(format!("atomic rename failed: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawRecord;

    fn window() -> DateWindow {
        DateWindow::parse("20230331", "20231231").unwrap()
    }

    fn sample_dataset() -> RawDataset {
        let mut ds = RawDataset::new();
        ds.insert_entity(
            "Truist Bank",
            RawRecord::new().with("NAME", "Truist Bank").with("CERT", "9846"),
            vec![
                RawRecord::new().with("REPDTE", "20230331").with("ASSET", "100"),
                RawRecord::new().with("REPDTE", "20230630").with("ASSET", "110"),
            ],
        );
        ds.insert_entity(
            "PNC Bank, National Association",
            RawRecord::new().with("NAME", "PNC Bank, National Association"),
            vec![RawRecord::new().with("REPDTE", "20230331")],
        );
        ds
    }

    #[test]
    fn store_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        let ds = sample_dataset();

        let meta = cache.store(&window(), &ds, Provenance::Live).unwrap();
        assert_eq!(meta.entity_count, 2);
        assert_eq!(meta.record_count, 3);

        let loaded = cache.load(&window()).unwrap().unwrap();
        assert_eq!(loaded.dataset, ds);
        assert_eq!(loaded.meta.unwrap().provenance, Provenance::Live);
    }

    #[test]
    fn missing_entry_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        assert!(cache.load(&window()).unwrap().is_none());
        assert!(!cache.contains(&window()));
    }

    #[test]
    fn key_is_exact_match_only() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        cache
            .store(&window(), &sample_dataset(), Provenance::Live)
            .unwrap();

        let narrower = DateWindow::parse("20230630", "20231231").unwrap();
        assert!(cache.load(&narrower).unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        fs::write(cache.entry_path(&window()), "{not json").unwrap();

        assert!(cache.load(&window()).is_err());
        assert!(!cache.entry_path(&window()).exists());
        assert!(cache
            .entry_path(&window())
            .with_extension("json.quarantined")
            .exists());
        // Second read is a clean miss.
        assert!(cache.load(&window()).unwrap().is_none());
    }

    #[test]
    fn quarantine_takes_the_sidecar_along() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        cache
            .store(&window(), &sample_dataset(), Provenance::Live)
            .unwrap();
        fs::write(cache.entry_path(&window()), "{truncated").unwrap();

        assert!(cache.load(&window()).is_err());
        assert!(cache.get_meta(&window()).is_none());
        assert!(cache.status().is_empty());
        // Entry and sidecar both land in quarantine.
        assert_eq!(cache.clear().unwrap(), 2);
    }

    #[test]
    fn status_skips_sidecars_without_data() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        let other = DateWindow::parse("20200331", "20201231").unwrap();
        cache
            .store(&window(), &sample_dataset(), Provenance::Live)
            .unwrap();
        cache
            .store(&other, &sample_dataset(), Provenance::Live)
            .unwrap();
        fs::remove_file(cache.entry_path(&other)).unwrap();

        let status = cache.status();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].start_date, window().start());
    }

    #[test]
    fn invariant_violation_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        let body = r#"{"institutions_data":{},"financials_data":{"X":[]}}"#;
        fs::write(cache.entry_path(&window()), body).unwrap();
        assert!(cache.load(&window()).is_err());
    }

    #[test]
    fn entry_without_sidecar_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        let body = serde_json::to_string(&sample_dataset()).unwrap();
        fs::write(cache.entry_path(&window()), body).unwrap();

        let loaded = cache.load(&window()).unwrap().unwrap();
        assert!(loaded.meta.is_none());
        assert_eq!(loaded.dataset.entity_count(), 2);
    }

    #[test]
    fn status_remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        let other = DateWindow::parse("20200331", "20201231").unwrap();
        cache
            .store(&window(), &sample_dataset(), Provenance::Live)
            .unwrap();
        cache
            .store(&other, &sample_dataset(), Provenance::Synthetic)
            .unwrap();

        let status = cache.status();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].start_date, other.start());
        assert_eq!(status[0].provenance, Provenance::Synthetic);

        assert!(cache.remove(&other).unwrap());
        assert!(!cache.remove(&other).unwrap());
        assert_eq!(cache.status().len(), 1);

        assert_eq!(cache.clear().unwrap(), 2);
        assert!(cache.status().is_empty());
    }

    #[test]
    fn unwritable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let cache = DatasetCache::new(blocker.join("sub"));
        assert!(cache
            .store(&window(), &sample_dataset(), Provenance::Live)
            .is_err());
    }
}
