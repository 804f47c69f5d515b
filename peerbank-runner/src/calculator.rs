//! Metrics calculator: raw quarterly filings → derived metrics table.
//!
//! Each entity's filings are ordered by report date and walked once. Base
//! metrics are copied with zero-default coercion; derived metrics use
//! materiality floors and are `None` when the denominator is too small.
//! The 3-year growth rate is positional: it compares with the filing 12
//! positions earlier, not with the filing dated three years earlier.

use crate::catalog::{base_metrics, Metric, METRIC_COUNT};
use crate::table::{MetricRow, MetricsTable};
use chrono::NaiveDate;
use peerbank_core::domain::{parse_report_date, FieldCode, PeriodFields, RawPeriodRecord};
use tracing::warn;

/// First report date on which the CECL transition adjustment applies.
pub fn cecl_effective_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Capital base must exceed this for the capital ratios to be computed.
pub const CAPITAL_BASE_FLOOR: f64 = 1_000_000.0;

/// Number of filings back for the 3-year growth rate.
pub const GROWTH_LOOKBACK: usize = 12;

/// The lookback value must exceed this for the growth rate to be computed.
pub const GROWTH_BASE_FLOOR: f64 = 1_000.0;

/// Allowance must exceed this for NCO / ACL; below it the ratio is zero.
pub const ALLOWANCE_FLOOR: f64 = 1_000.0;

/// CECL transition amount and the capital base it adjusts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalBase {
    pub transition_amount: f64,
    pub base: f64,
}

/// Capital base for one filing: Tier 1 + ACL, less the CECL transition
/// amount on or after the effective date.
pub fn capital_base(fields: &PeriodFields, date: NaiveDate) -> CapitalBase {
    let tier1 = fields.amount(FieldCode::Rbct1j);
    let acl = fields.amount(FieldCode::Lnatres);

    let transition_amount = if date >= cecl_effective_date() {
        fields.amount(FieldCode::Ct1badj) - fields.amount(FieldCode::Eq)
            + fields.amount(FieldCode::Eqpp)
    } else {
        0.0
    };

    CapitalBase {
        transition_amount,
        base: tier1 + acl - transition_amount,
    }
}

fn pct(numerator: f64, denominator: f64) -> f64 {
    numerator / denominator * 100.0
}

/// Loan-category concentrations against the capital base.
fn capital_ratios(fields: &PeriodFields, capital: &CapitalBase) -> [(Metric, Option<f64>); 6] {
    let ratio = |numerator: f64| {
        (capital.base > CAPITAL_BASE_FLOOR).then(|| pct(numerator, capital.base))
    };
    [
        (Metric::RealEstateToCapital, ratio(fields.amount(FieldCode::Lnre))),
        (Metric::ConstructionToCapital, ratio(fields.amount(FieldCode::Lnrecons))),
        (Metric::CiToCapital, ratio(fields.amount(FieldCode::Lnci))),
        (Metric::AgricultureToCapital, ratio(fields.amount(FieldCode::Lnag))),
        (Metric::CreditCardsToCapital, ratio(fields.amount(FieldCode::Lncrcd))),
        (Metric::CommercialReToCapital, ratio(fields.commercial_real_estate())),
    ]
}

/// 3-year growth of non-owner-occupied CRE at position `i` of an ordered history.
pub fn noo_cre_growth(history: &[PeriodFields], i: usize) -> Option<f64> {
    if i < GROWTH_LOOKBACK {
        return None;
    }
    let old = history.get(i - GROWTH_LOOKBACK)?.non_owner_occupied_cre();
    if old <= GROWTH_BASE_FLOOR {
        return None;
    }
    let current = history.get(i)?.non_owner_occupied_cre();
    Some((current / old - 1.0) * 100.0)
}

/// Quarterly net charge-offs over allowance. Zero-filled below the floor.
pub fn charge_offs_to_allowance(fields: &PeriodFields) -> f64 {
    let acl = fields.amount(FieldCode::Lnatres);
    if acl > ALLOWANCE_FLOOR {
        pct(fields.amount(FieldCode::Ntlnlsq), acl)
    } else {
        0.0
    }
}

/// Parse and order one entity's filings. Filings without a parsable report
/// date are dropped.
fn ordered_filings(entity: &str, records: &[RawPeriodRecord]) -> Vec<(NaiveDate, PeriodFields)> {
    let mut filings: Vec<(NaiveDate, PeriodFields)> = records
        .iter()
        .filter_map(|r| {
            let raw_date = r.report_date().unwrap_or_default();
            match parse_report_date(&raw_date) {
                Ok(date) => Some((date, PeriodFields::from_raw(r))),
                Err(e) => {
                    warn!(entity, error = %e, "skipping filing without a valid report date");
                    None
                }
            }
        })
        .collect();
    filings.sort_by_key(|(date, _)| *date);
    filings
}

/// Rows for one entity, in report-date order.
pub fn entity_rows(entity: &str, records: &[RawPeriodRecord]) -> Vec<MetricRow> {
    let filings = ordered_filings(entity, records);
    let history: Vec<PeriodFields> = filings.iter().map(|(_, f)| f.clone()).collect();

    filings
        .iter()
        .enumerate()
        .map(|(i, (date, fields))| {
            let mut values = vec![None; METRIC_COUNT];
            for (metric, code) in base_metrics() {
                values[metric.index()] = Some(fields.amount(code));
            }

            let capital = capital_base(fields, *date);
            values[Metric::CeclTransitionAmount.index()] = Some(capital.transition_amount);
            for (metric, value) in capital_ratios(fields, &capital) {
                values[metric.index()] = value;
            }
            values[Metric::NonOwnerOccupiedCreGrowth3y.index()] = noo_cre_growth(&history, i);
            values[Metric::NetChargeOffsToAllowance.index()] =
                Some(charge_offs_to_allowance(fields));

            MetricRow::new(entity, *date, values)
        })
        .collect()
}

/// Compute the metrics table for every entity.
///
/// Entities are visited in iteration order; the combined rows are then stably
/// sorted by date, so rows sharing a date keep that order. A `RawDataset`
/// iterates in roster order.
pub fn calculate_metrics<'a, I, K>(financials: I) -> MetricsTable
where
    I: IntoIterator<Item = (K, &'a Vec<RawPeriodRecord>)>,
    K: AsRef<str>,
{
    let mut rows: Vec<MetricRow> = financials
        .into_iter()
        .flat_map(|(entity, records)| entity_rows(entity.as_ref(), records))
        .collect();
    rows.sort_by_key(|r| r.date);
    MetricsTable::new(Metric::all().collect(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerbank_core::domain::RawRecord;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn filing(date: &str) -> RawRecord {
        RawRecord::new().with("REPDTE", date)
    }

    #[test]
    fn cecl_transition_applies_from_2019() {
        let f = PeriodFields::from_raw(
            &filing("20190331")
                .with("CT1BADJ", "100")
                .with("EQ", "90")
                .with("EQPP", "5")
                .with("RBCT1J", "1000")
                .with("LNATRES", "50"),
        );
        let after = capital_base(&f, d(2019, 3, 31));
        assert_eq!(after.transition_amount, 15.0);
        assert_eq!(after.base, 1035.0);

        let before = capital_base(&f, d(2018, 12, 31));
        assert_eq!(before.transition_amount, 0.0);
        assert_eq!(before.base, 1050.0);
    }

    #[test]
    fn cecl_boundary_is_inclusive() {
        let f = PeriodFields::from_raw(&filing("20190101").with("CT1BADJ", 10.0));
        assert_eq!(capital_base(&f, d(2019, 1, 1)).transition_amount, 10.0);
    }

    #[test]
    fn small_capital_base_nulls_every_capital_ratio() {
        let rows = entity_rows(
            "Bank",
            &[filing("20230331")
                .with("RBCT1J", "900000")
                .with("LNATRES", "100000")
                .with("LNRE", "5000000")],
        );
        let row = &rows[0];
        for m in [
            Metric::RealEstateToCapital,
            Metric::ConstructionToCapital,
            Metric::CiToCapital,
            Metric::AgricultureToCapital,
            Metric::CreditCardsToCapital,
            Metric::CommercialReToCapital,
        ] {
            assert_eq!(row.get(m), None, "{m}");
        }
        assert_eq!(row.get(Metric::RealEstateLoans), Some(5_000_000.0));
    }

    #[test]
    fn capital_ratios_above_floor() {
        let rows = entity_rows(
            "Bank",
            &[filing("20180331")
                .with("RBCT1J", "1500000")
                .with("LNATRES", "500000")
                .with("LNRE", "1000000")
                .with("LNRECONS", "100000")
                .with("LNREMULT", "100000")
                .with("LNRENRES", "200000")
                .with("LNCOMRE", "100000")],
        );
        let row = &rows[0];
        assert_eq!(row.get(Metric::RealEstateToCapital), Some(50.0));
        assert_eq!(row.get(Metric::ConstructionToCapital), Some(5.0));
        assert_eq!(row.get(Metric::CommercialReToCapital), Some(25.0));
        assert_eq!(row.get(Metric::CiToCapital), Some(0.0));
    }

    #[test]
    fn growth_uses_twelve_positions_back() {
        let dates = peerbank_core::domain::DateWindow::parse("20200331", "20230331")
            .unwrap()
            .quarter_ends();
        assert_eq!(dates.len(), 13);
        let records: Vec<RawRecord> = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let cre = if i == 12 { 1500.0 } else { 1000.0 + i as f64 };
                let cre = if i == 0 { 1000.0 } else { cre };
                filing(&date.format("%Y%m%d").to_string()).with("LNRECONS", cre)
            })
            .collect();
        let rows = entity_rows("Bank", &records);
        for row in &rows[..12] {
            assert_eq!(row.get(Metric::NonOwnerOccupiedCreGrowth3y), None);
        }
        assert_eq!(rows[12].get(Metric::NonOwnerOccupiedCreGrowth3y), Some(50.0));
    }

    #[test]
    fn growth_null_when_base_is_immaterial() {
        let history: Vec<PeriodFields> = (0..13)
            .map(|i| {
                let v = if i == 0 { 1000.0 } else { 5000.0 };
                PeriodFields::from_raw(&RawRecord::new().with("LNREMULT", v))
            })
            .collect();
        assert_eq!(noo_cre_growth(&history, 12), None);
    }

    #[test]
    fn charge_offs_zero_fill_below_floor() {
        let small = PeriodFields::from_raw(
            &RawRecord::new().with("LNATRES", 1000.0).with("NTLNLSQ", 50.0),
        );
        assert_eq!(charge_offs_to_allowance(&small), 0.0);
        let big = PeriodFields::from_raw(
            &RawRecord::new().with("LNATRES", 2000.0).with("NTLNLSQ", 50.0),
        );
        assert_eq!(charge_offs_to_allowance(&big), 2.5);
    }

    #[test]
    fn unsorted_input_is_ordered_and_bad_dates_skipped() {
        let rows = entity_rows(
            "Bank",
            &[
                filing("20230630"),
                filing("not-a-date"),
                filing("20230331"),
                RawRecord::new().with("ASSET", 1.0),
            ],
        );
        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2023, 3, 31), d(2023, 6, 30)]);
    }

    #[test]
    fn table_rows_sorted_by_date_across_entities() {
        let mut fin = std::collections::BTreeMap::new();
        fin.insert("B".to_string(), vec![filing("20230331"), filing("20230630")]);
        fin.insert("A".to_string(), vec![filing("20230630"), filing("20221231")]);
        let table = calculate_metrics(&fin);
        let order: Vec<_> = table.rows().iter().map(|r| (r.entity.as_str(), r.date)).collect();
        assert_eq!(
            order,
            vec![
                ("A", d(2022, 12, 31)),
                ("B", d(2023, 3, 31)),
                ("A", d(2023, 6, 30)),
                ("B", d(2023, 6, 30)),
            ]
        );
    }

    #[test]
    fn unparsable_values_become_zero_base_metrics() {
        let rows = entity_rows(
            "Bank",
            &[filing("20230331").with("ASSET", "n/a").with("DEP", serde_json::Value::Null)],
        );
        assert_eq!(rows[0].get(Metric::TotalAssets), Some(0.0));
        assert_eq!(rows[0].get(Metric::TotalDeposits), Some(0.0));
    }
}
