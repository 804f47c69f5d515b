//! Property tests for calculator invariants.
//!
//! Uses proptest to verify:
//! 1. Row count equals the number of filings across all entities
//! 2. Base metrics are always finite, whatever the raw values
//! 3. Rows come out in non-decreasing date order
//! 4. Capital ratios are null exactly when the capital base is immaterial
//! 5. The growth rate is null for the first 12 filings of every entity

use chrono::NaiveDate;
use peerbank_core::domain::{DateWindow, PeriodFields, RawPeriodRecord, RawRecord};
use peerbank_runner::calculator::{capital_base, CAPITAL_BASE_FLOOR, GROWTH_LOOKBACK};
use peerbank_runner::catalog::base_metrics;
use peerbank_runner::{calculate_metrics, Metric};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Raw values as the API sends them: numeric strings, numbers, nulls, junk.
fn arb_raw_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0.0..5e11_f64).prop_map(|v| Value::String(format!("{v:.0}"))),
        (-1e9..1e12_f64).prop_map(Value::from),
        Just(Value::Null),
        Just(Value::String("N/A".into())),
        Just(Value::String(String::new())),
    ]
}

fn arb_filing(date: NaiveDate) -> impl Strategy<Value = RawPeriodRecord> {
    let codes = [
        "ASSET", "RBCT1J", "LNATRES", "LNRE", "LNRECONS", "LNREMULT", "CT1BADJ", "EQ", "NTLNLSQ",
    ];
    proptest::collection::vec(arb_raw_value(), codes.len()).prop_map(move |values| {
        let mut r = RawRecord::new().with("REPDTE", date.format("%Y%m%d").to_string());
        for (code, v) in codes.iter().zip(values) {
            r.insert(*code, v);
        }
        r
    })
}

fn quarter_ends() -> Vec<NaiveDate> {
    DateWindow::parse("20150331", "20241231")
        .map(|w| w.quarter_ends())
        .unwrap_or_default()
}

/// Entity → shuffled subset of quarterly filings.
fn arb_financials() -> impl Strategy<Value = BTreeMap<String, Vec<RawPeriodRecord>>> {
    let dates = quarter_ends();
    let entity = proptest::sample::subsequence(dates, 0..=20)
        .prop_flat_map(|ds| ds.into_iter().map(arb_filing).collect::<Vec<_>>())
        .prop_shuffle();
    proptest::collection::btree_map("[A-E] Bank", entity, 0..5)
}

proptest! {
    #[test]
    fn row_count_matches_filings(fin in arb_financials()) {
        let table = calculate_metrics(&fin);
        let expected: usize = fin.values().map(Vec::len).sum();
        prop_assert_eq!(table.len(), expected);
    }

    #[test]
    fn base_metrics_are_finite(fin in arb_financials()) {
        let table = calculate_metrics(&fin);
        for row in table.rows() {
            for (metric, _) in base_metrics() {
                let v = row.get(metric);
                prop_assert!(v.is_some_and(f64::is_finite), "{} = {:?}", metric, v);
            }
            prop_assert!(row.get(Metric::CeclTransitionAmount).is_some());
            prop_assert!(row.get(Metric::NetChargeOffsToAllowance).is_some());
        }
    }

    #[test]
    fn rows_are_date_ordered(fin in arb_financials()) {
        let table = calculate_metrics(&fin);
        let dates: Vec<_> = table.rows().iter().map(|r| r.date).collect();
        prop_assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn capital_ratios_null_iff_base_immaterial(fin in arb_financials()) {
        let table = calculate_metrics(&fin);
        for (entity, filings) in &fin {
            for filing in filings {
                let date = filing.report_date().unwrap();
                let date = NaiveDate::parse_from_str(&date, "%Y%m%d").unwrap();
                let base = capital_base(&PeriodFields::from_raw(filing), date).base;
                let row = table
                    .rows()
                    .iter()
                    .find(|r| &r.entity == entity && r.date == date)
                    .unwrap();
                let ratio = row.get(Metric::RealEstateToCapital);
                prop_assert_eq!(ratio.is_none(), base <= CAPITAL_BASE_FLOOR);
                prop_assert_eq!(
                    row.get(Metric::CommercialReToCapital).is_none(),
                    base <= CAPITAL_BASE_FLOOR
                );
            }
        }
    }

    #[test]
    fn growth_null_before_lookback(fin in arb_financials()) {
        let table = calculate_metrics(&fin);
        for entity in fin.keys() {
            let rows: Vec<_> = table.entity_rows(entity).collect();
            for row in rows.iter().take(GROWTH_LOOKBACK) {
                prop_assert!(row.get(Metric::NonOwnerOccupiedCreGrowth3y).is_none());
            }
        }
    }
}
