//! Entity roster: the fixed set of reporting institutions tracked by the pipeline.
//!
//! The roster is configuration, not state. It carries each institution's
//! canonical legal name, its optional certificate number, the short display
//! name used by the presentation layer, and the hints the fallback generator
//! needs (asset tier and business mix).

use serde::{Deserialize, Serialize};

/// Asset-scale tier used by the fallback generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    Large,
    Medium,
    #[default]
    Other,
}

impl SizeTier {
    /// Base total assets at the start of a synthetic window, in thousands of
    /// dollars like call-report amounts ($500B / $100B / $50B).
    pub fn base_assets(self) -> f64 {
        match self {
            SizeTier::Large => 500_000_000.0,
            SizeTier::Medium => 100_000_000.0,
            SizeTier::Other => 50_000_000.0,
        }
    }
}

/// Balance-sheet mix used by the fallback generator.
///
/// `Differentiated` models a trading-heavy bank: fewer deposits and loans
/// relative to assets, more capital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessMix {
    #[default]
    Standard,
    Differentiated,
}

/// How an entry is resolved against the institutions endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityLookup<'a> {
    Cert(&'a str),
    Name(&'a str),
}

/// One roster item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Canonical legal name as filed with the regulator.
    pub name: String,
    /// Certificate number. When present, lookup is by certificate.
    #[serde(default)]
    pub cert: Option<String>,
    /// Short name shown to users. Defaults to the canonical name.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub tier: SizeTier,
    #[serde(default)]
    pub mix: BusinessMix,
}

impl RosterEntry {
    pub fn new(
        name: impl Into<String>,
        cert: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cert: Some(cert.into()),
            display_name: Some(display.into()),
            tier: SizeTier::Other,
            mix: BusinessMix::Standard,
        }
    }

    /// Entry resolved by name only.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cert: None,
            display_name: None,
            tier: SizeTier::Other,
            mix: BusinessMix::Standard,
        }
    }

    pub fn with_tier(mut self, tier: SizeTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_mix(mut self, mix: BusinessMix) -> Self {
        self.mix = mix;
        self
    }

    pub fn lookup(&self) -> EntityLookup<'_> {
        match self.cert.as_deref() {
            Some(cert) if !cert.trim().is_empty() => EntityLookup::Cert(cert.trim()),
            _ => EntityLookup::Name(&self.name),
        }
    }

    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// The complete, immutable roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter()
    }

    pub fn find(&self, canonical: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.name == canonical)
    }

    /// Canonical → display mapping. Unknown names map to themselves.
    pub fn display_name<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.find(canonical).map(RosterEntry::display).unwrap_or(canonical)
    }

    /// Check the roster is usable: non-empty, unique canonical names.
    pub fn validate(&self) -> Result<(), String> {
        if self.entries.is_empty() {
            return Err("roster is empty".into());
        }
        for (i, e) in self.entries.iter().enumerate() {
            if e.name.trim().is_empty() {
                return Err(format!("roster entry {i} has an empty name"));
            }
            if self.entries[..i].iter().any(|o| o.name == e.name) {
                return Err(format!("duplicate roster entry '{}'", e.name));
            }
        }
        Ok(())
    }

    /// The nine large US banks tracked by default.
    pub fn default_us() -> Self {
        use BusinessMix::*;
        use SizeTier::*;

        let entries = [
            ("Goldman Sachs Bank USA", "33124", "Goldman Sachs", Medium, Differentiated),
            ("JPMorgan Chase Bank, National Association", "628", "JPMorgan Chase", Large, Standard),
            ("Bank of America, National Association", "3510", "Bank of America", Large, Standard),
            ("Wells Fargo Bank, National Association", "3511", "Wells Fargo", Large, Standard),
            ("Citibank, National Association", "7213", "Citibank", Large, Standard),
            ("U.S. Bank National Association", "6548", "U.S. Bank", Medium, Standard),
            ("PNC Bank, National Association", "6384", "PNC Bank", Medium, Standard),
            ("Truist Bank", "9846", "Truist Bank", Medium, Standard),
            ("Capital One, National Association", "4297", "Capital One", Other, Standard),
        ]
        .into_iter()
        .map(|(name, cert, display, tier, mix)| {
            RosterEntry::new(name, cert, display).with_tier(tier).with_mix(mix)
        })
        .collect();

        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roster_is_valid() {
        let r = Roster::default_us();
        assert_eq!(r.len(), 9);
        assert!(r.validate().is_ok());
        assert_eq!(
            r.display_name("JPMorgan Chase Bank, National Association"),
            "JPMorgan Chase"
        );
    }

    #[test]
    fn unknown_names_display_as_themselves() {
        let r = Roster::default_us();
        assert_eq!(r.display_name("Some Other Bank"), "Some Other Bank");
    }

    #[test]
    fn lookup_prefers_certificate() {
        let e = RosterEntry::new("Truist Bank", "9846", "Truist");
        assert_eq!(e.lookup(), EntityLookup::Cert("9846"));
        let n = RosterEntry::by_name("Truist Bank");
        assert_eq!(n.lookup(), EntityLookup::Name("Truist Bank"));
        assert_eq!(n.display(), "Truist Bank");
    }

    #[test]
    fn validate_rejects_duplicates_and_empty() {
        assert!(Roster::new(vec![]).validate().is_err());
        let dup = Roster::new(vec![
            RosterEntry::by_name("A"),
            RosterEntry::by_name("A"),
        ]);
        assert!(dup.validate().unwrap_err().contains("duplicate"));
    }

    #[test]
    fn one_differentiated_entity_by_default() {
        let r = Roster::default_us();
        let diff: Vec<_> = r
            .iter()
            .filter(|e| e.mix == BusinessMix::Differentiated)
            .collect();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].display(), "Goldman Sachs");
    }
}
