//! Typed view over a raw period record.
//!
//! The field table below is the single mapping from regulator field codes to
//! named fields. [`PeriodFields::from_raw`] walks it once per record, coercing
//! each raw value with [`safe_numeric`]; the accessors then expose either the
//! optional value or the zero-defaulted amount.

use super::record::{safe_numeric, RawRecord};
use serde::{Deserialize, Serialize};

macro_rules! field_table {
    ($( $variant:ident => $field:ident = $code:literal ),+ $(,)?) => {
        /// Regulator field codes requested for every quarterly filing.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum FieldCode {
            $( $variant ),+
        }

        impl FieldCode {
            pub const ALL: &'static [FieldCode] = &[ $( FieldCode::$variant ),+ ];

            /// Wire code, e.g. `"ASSET"`.
            pub fn code(self) -> &'static str {
                match self {
                    $( FieldCode::$variant => $code ),+
                }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $( $code => Some(FieldCode::$variant), )+
                    _ => None,
                }
            }
        }

        /// Numeric fields of one filing. `None` means absent or unparsable.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct PeriodFields {
            $( pub $field: Option<f64>, )+
        }

        impl PeriodFields {
            /// Optional value of a field.
            pub fn get(&self, code: FieldCode) -> Option<f64> {
                match code {
                    $( FieldCode::$variant => self.$field, )+
                }
            }

            fn slot_mut(&mut self, code: FieldCode) -> &mut Option<f64> {
                match code {
                    $( FieldCode::$variant => &mut self.$field, )+
                }
            }
        }
    };
}

field_table! {
    Asset => asset = "ASSET",
    Dep => deposits = "DEP",
    Lnlsgr => loans_and_leases = "LNLSGR",
    Lnlsnet => net_loans_and_leases = "LNLSNET",
    Sc => securities = "SC",
    Lnre => real_estate_loans = "LNRE",
    Lnci => commercial_industrial_loans = "LNCI",
    Lnag => agriculture_loans = "LNAG",
    Lncrcd => credit_card_loans = "LNCRCD",
    Lnconoth => consumer_loans = "LNCONOTH",
    Lnatres => allowance_for_credit_loss = "LNATRES",
    P3asset => past_due_30_89 = "P3ASSET",
    P9asset => past_due_90_plus = "P9ASSET",
    Rbct1j => tier1_capital = "RBCT1J",
    Drlnls => charge_offs = "DRLNLS",
    Crlnls => recoveries = "CRLNLS",
    Netinc => net_income = "NETINC",
    Ernastr => earning_assets_ratio = "ERNASTR",
    Nperfv => nonperforming_assets_ratio = "NPERFV",
    P3assetr => past_due_30_89_ratio = "P3ASSETR",
    P9assetr => past_due_90_plus_ratio = "P9ASSETR",
    Nimy => net_interest_margin = "NIMY",
    Ntlnlsr => net_charge_off_ratio = "NTLNLSR",
    Lnatresr => allowance_to_loans_ratio = "LNATRESR",
    Nclnlsr => noncurrent_loans_ratio = "NCLNLSR",
    Roa => return_on_assets = "ROA",
    Roe => return_on_equity = "ROE",
    Rbc1aaj => leverage_ratio = "RBC1AAJ",
    Rbct2 => tier2_capital = "RBCT2",
    Rbcrwaj => total_risk_based_capital_ratio = "RBCRWAJ",
    Lnlsdepr => net_loans_to_deposits_ratio = "LNLSDEPR",
    Lnlsntv => net_loans_to_assets_ratio = "LNLSNTV",
    Eeffr => efficiency_ratio = "EEFFR",
    Lnresncr => allowance_to_noncurrent_ratio = "LNRESNCR",
    Elnantr => provision_to_charge_offs_ratio = "ELNANTR",
    Iderncvr => earnings_coverage_ratio = "IDERNCVR",
    Ntlnlsq => net_charge_offs_quarterly = "NTLNLSQ",
    Lnrecons => construction_land_development = "LNRECONS",
    Lnrenres => nonresidential_property_loans = "LNRENRES",
    Lnrenrow => owner_occupied_nonresidential = "LNRENROW",
    Lnrenrot => non_owner_occupied_nonresidential = "LNRENROT",
    Lnreres => residential_property_loans = "LNRERES",
    Lnremult => multifamily_loans = "LNREMULT",
    Lnreag => farmland_loans = "LNREAG",
    Lnrecnfm => family_construction_loans = "LNRECNFM",
    Lnrecnot => other_construction_loans = "LNRECNOT",
    Lncomre => cre_not_secured_by_real_estate = "LNCOMRE",
    Ct1badj => cet1_before_adjustments = "CT1BADJ",
    Eq => bank_equity_capital = "EQ",
    Eqpp => perpetual_preferred_stock = "EQPP",
}

impl PeriodFields {
    /// Populate every field from a raw record through the field table.
    pub fn from_raw(raw: &RawRecord) -> Self {
        let mut fields = Self::default();
        for &code in FieldCode::ALL {
            *fields.slot_mut(code) = raw.get(code.code()).and_then(safe_numeric);
        }
        fields
    }

    /// Zero-defaulted amount of a field.
    pub fn amount(&self, code: FieldCode) -> f64 {
        self.get(code).unwrap_or(0.0)
    }

    /// Non-owner-occupied commercial real estate: construction + multifamily
    /// + non-owner-occupied nonresidential + CRE not secured by real estate.
    pub fn non_owner_occupied_cre(&self) -> f64 {
        self.amount(FieldCode::Lnrecons)
            + self.amount(FieldCode::Lnremult)
            + self.amount(FieldCode::Lnrenrot)
            + self.amount(FieldCode::Lncomre)
    }

    /// Commercial real estate used for the concentration ratio: construction
    /// + multifamily + all nonresidential + CRE not secured by real estate.
    pub fn commercial_real_estate(&self) -> f64 {
        self.amount(FieldCode::Lnrecons)
            + self.amount(FieldCode::Lnremult)
            + self.amount(FieldCode::Lnrenres)
            + self.amount(FieldCode::Lncomre)
    }
}

/// Comma-separated field list for the financials endpoint.
pub fn financial_field_list() -> String {
    let mut codes = vec!["CERT", "REPDTE"];
    codes.extend(FieldCode::ALL.iter().map(|c| c.code()));
    codes.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn code_table_roundtrips() {
        for &code in FieldCode::ALL {
            assert_eq!(FieldCode::from_code(code.code()), Some(code));
        }
        assert_eq!(FieldCode::from_code("NOPE"), None);
    }

    #[test]
    fn from_raw_populates_named_fields() {
        let raw = RawRecord::new()
            .with("ASSET", "1500000")
            .with("RBCT1J", 120.5)
            .with("LNATRES", json!(null))
            .with("EQ", "garbage");
        let f = PeriodFields::from_raw(&raw);
        assert_eq!(f.asset, Some(1_500_000.0));
        assert_eq!(f.tier1_capital, Some(120.5));
        assert_eq!(f.allowance_for_credit_loss, None);
        assert_eq!(f.bank_equity_capital, None);
        assert_eq!(f.amount(FieldCode::Eq), 0.0);
        assert_eq!(f.deposits, None);
    }

    #[test]
    fn cre_aggregates() {
        let raw = RawRecord::new()
            .with("LNRECONS", 1.0)
            .with("LNREMULT", 2.0)
            .with("LNRENROT", 4.0)
            .with("LNRENRES", 10.0)
            .with("LNCOMRE", 8.0);
        let f = PeriodFields::from_raw(&raw);
        assert_eq!(f.non_owner_occupied_cre(), 15.0);
        assert_eq!(f.commercial_real_estate(), 21.0);
    }

    #[test]
    fn field_list_leads_with_identity_columns() {
        let list = financial_field_list();
        assert!(list.starts_with("CERT,REPDTE,ASSET,"));
        assert!(list.ends_with("EQPP"));
        assert_eq!(list.split(',').count(), FieldCode::ALL.len() + 2);
    }
}
