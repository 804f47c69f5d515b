//! Deterministic seed derivation for synthesized data.
//!
//! A master seed is expanded into per-(entity, window) sub-seeds via BLAKE3,
//! so the fallback dataset for a given roster and window is reproducible and
//! independent of roster iteration order.

use crate::domain::DateWindow;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for one entity over one window.
    pub fn sub_seed(&self, entity: &str, window: &DateWindow) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(entity.as_bytes());
        hasher.update(window.cache_key().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, entity: &str, window: &DateWindow) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(entity, window))
    }
}
