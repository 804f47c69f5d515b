//! Fallback dataset synthesis.
//!
//! Produces one filing per calendar quarter-end in the window for every
//! roster entity. Assets start from the entity's tier base, compound at 5%
//! a year from the window start, and carry ±5% noise per quarter. Balance
//! sheet items are noisy fixed fractions of assets; the differentiated mix
//! holds fewer deposits and loans and more capital.
//!
//! Every value is drawn from a per-(entity, window) seeded RNG, so the same
//! seed reproduces the same dataset.

use chrono::NaiveDate;
use peerbank_core::domain::{
    BusinessMix, DateWindow, RawDataset, RawPeriodRecord, RawRecord, Roster, RosterEntry,
    REPORT_DATE_FORMAT,
};
use peerbank_core::rng::SeedHierarchy;
use rand::rngs::StdRng;
use rand::Rng;

/// Annual asset growth applied from the window start.
pub const ANNUAL_GROWTH: f64 = 0.05;

/// Balance-sheet fractions of total assets.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MixFractions {
    deposits: f64,
    loans: f64,
    tier1: f64,
}

fn fractions(mix: BusinessMix) -> MixFractions {
    match mix {
        BusinessMix::Standard => MixFractions {
            deposits: 0.8,
            loans: 0.6,
            tier1: 0.1,
        },
        BusinessMix::Differentiated => MixFractions {
            deposits: 0.6,
            loans: 0.4,
            tier1: 0.12,
        },
    }
}

/// Deterministic generator of fallback datasets.
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    seeds: SeedHierarchy,
}

impl SyntheticGenerator {
    pub fn new(master_seed: u64) -> Self {
        Self {
            seeds: SeedHierarchy::new(master_seed),
        }
    }

    /// A full dataset covering every roster entity, keyed by canonical name.
    pub fn generate(&self, roster: &Roster, window: &DateWindow) -> RawDataset {
        let mut dataset = RawDataset::new();
        for entry in roster.iter() {
            let institution = RawRecord::new()
                .with("NAME", entry.name.as_str())
                .with("CERT", entry.cert.clone().unwrap_or_default());
            dataset.insert_entity(
                entry.name.clone(),
                institution,
                self.entity_filings(entry, window),
            );
        }
        dataset
    }

    /// Quarterly filings for one entity.
    pub fn entity_filings(&self, entry: &RosterEntry, window: &DateWindow) -> Vec<RawPeriodRecord> {
        let mut rng = self.seeds.rng_for(&entry.name, window);
        let base_assets = entry.tier.base_assets();
        let mix = fractions(entry.mix);

        window
            .quarter_ends()
            .into_iter()
            .map(|date| {
                let growth = growth_factor(window.start(), date);
                let assets = base_assets * growth * rng.gen_range(0.95..1.05);
                filing(date, assets, mix, &mut rng)
            })
            .collect()
    }
}

/// Compounded growth from `start` to `date`.
pub fn growth_factor(start: NaiveDate, date: NaiveDate) -> f64 {
    let years = (date - start).num_days() as f64 / 365.25;
    (1.0 + ANNUAL_GROWTH).powf(years)
}

fn noisy(rng: &mut StdRng, base: f64) -> f64 {
    base * rng.gen_range(0.9..1.1)
}

fn filing(date: NaiveDate, assets: f64, mix: MixFractions, rng: &mut StdRng) -> RawPeriodRecord {
    let deposits = noisy(rng, assets * mix.deposits);
    let loans = noisy(rng, assets * mix.loans);
    let tier1 = noisy(rng, assets * mix.tier1);

    let real_estate = loans * 0.5;
    let construction = real_estate * 0.08;
    let nonresidential = real_estate * 0.3;
    let allowance = loans * 0.02;

    let preferred = tier1 * 0.02;
    let equity = tier1 * rng.gen_range(1.0..1.1);
    // Leaves a transition amount of 1% of Tier 1.
    let cet1_before_adj = equity - preferred + tier1 * 0.01;

    RawRecord::new()
        .with("REPDTE", date.format(REPORT_DATE_FORMAT).to_string())
        .with("ASSET", assets)
        .with("DEP", deposits)
        .with("LNLSGR", loans)
        .with("LNLSNET", loans * 0.98)
        .with("RBCT1J", tier1)
        .with("SC", assets * 0.2)
        .with("LNRE", real_estate)
        .with("LNCI", loans * 0.3)
        .with("LNAG", loans * 0.05)
        .with("LNCRCD", loans * 0.1)
        .with("LNCONOTH", loans * 0.05)
        .with("LNATRES", allowance)
        .with("LNRERES", real_estate * 0.45)
        .with("LNREMULT", real_estate * 0.1)
        .with("LNREAG", real_estate * 0.02)
        .with("LNRENRES", nonresidential)
        .with("LNRENROW", nonresidential * 0.4)
        .with("LNRENROT", nonresidential * 0.6)
        .with("LNRECONS", construction)
        .with("LNRECNFM", construction * 0.3)
        .with("LNRECNOT", construction * 0.7)
        .with("LNCOMRE", loans * 0.02)
        .with("NTLNLSQ", allowance * rng.gen_range(0.02..0.08))
        .with("CT1BADJ", cet1_before_adj)
        .with("EQ", equity)
        .with("EQPP", preferred)
        .with("ROA", rng.gen_range(0.5..1.5))
        .with("ROE", rng.gen_range(5.0..15.0))
        .with("NIMY", rng.gen_range(2.0..4.0))
        .with("EEFFR", rng.gen_range(50.0..70.0))
}
