//! Metrics service: repository + calculator + presentation ordering.
//!
//! This is the seam handed to a presentation layer. Entities are renamed to
//! their roster display names and columns follow the curated order, with any
//! metric missing from that order appended at the end.

use crate::calculator::calculate_metrics;
use crate::catalog::{self, Metric, CURATED_ORDER};
use crate::repository::DataRepository;
use crate::table::MetricsTable;
use peerbank_core::config::PipelineConfig;
use peerbank_core::data::{FinancialSource, Provenance};
use peerbank_core::domain::{DateWindow, Roster};
use tracing::info;

/// Output of one service call.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub window: DateWindow,
    pub table: MetricsTable,
    pub provenance: Provenance,
    pub from_cache: bool,
}

pub struct MetricsService {
    repository: DataRepository,
    roster: Roster,
}

impl MetricsService {
    pub fn new(repository: DataRepository, roster: Roster) -> Self {
        Self { repository, roster }
    }

    pub fn from_config(source: Box<dyn FinancialSource>, config: &PipelineConfig) -> Self {
        Self::new(
            DataRepository::from_config(source, config),
            config.roster.clone(),
        )
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn repository(&self) -> &DataRepository {
        &self.repository
    }

    /// Metrics for the window, using the cache when possible.
    pub fn get_metrics(&self, window: &DateWindow) -> MetricsReport {
        self.build(window, false)
    }

    /// Metrics for the window from a fresh fetch.
    pub fn get_metrics_refreshed(&self, window: &DateWindow) -> MetricsReport {
        self.build(window, true)
    }

    fn build(&self, window: &DateWindow, refresh: bool) -> MetricsReport {
        let outcome = if refresh {
            self.repository.refresh(&self.roster, window)
        } else {
            self.repository.fetch_for_roster(&self.roster, window)
        };

        let table = calculate_metrics(&outcome.dataset.financials);
        let columns = order_columns(table.columns(), &CURATED_ORDER);
        let table = table
            .with_columns(columns)
            .map_entities(|name| self.roster.display_name(name).to_string());

        info!(
            rows = table.len(),
            entities = table.entities().len(),
            provenance = %outcome.provenance,
            "metrics table ready"
        );

        MetricsReport {
            window: *window,
            table,
            provenance: outcome.provenance,
            from_cache: outcome.from_cache,
        }
    }

    /// Display names of metrics formatted as dollar amounts.
    pub fn dollar_format_metrics(&self) -> Vec<&'static str> {
        catalog::dollar_format_metrics()
    }

    /// Display name → definition for every metric.
    pub fn metric_definitions(&self) -> Vec<(&'static str, &'static str)> {
        catalog::metric_definitions()
    }
}

/// Curated metrics that are present, in curated order, then the remaining
/// present metrics in their original order.
pub fn order_columns(present: &[Metric], curated: &[Metric]) -> Vec<Metric> {
    let mut ordered: Vec<Metric> = curated
        .iter()
        .copied()
        .filter(|m| present.contains(m))
        .collect();
    ordered.extend(present.iter().copied().filter(|m| !curated.contains(m)));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curated_first_extras_appended() {
        let present = [
            Metric::TotalAssets,
            Metric::NetIncome,
            Metric::ReturnOnAssets,
            Metric::EfficiencyRatio,
        ];
        let curated = [Metric::EfficiencyRatio, Metric::ReturnOnAssets, Metric::Tier1Capital];
        assert_eq!(
            order_columns(&present, &curated),
            vec![
                Metric::EfficiencyRatio,
                Metric::ReturnOnAssets,
                Metric::TotalAssets,
                Metric::NetIncome,
            ]
        );
    }

    #[test]
    fn full_catalog_follows_curated_order() {
        let all: Vec<Metric> = Metric::all().collect();
        assert_eq!(order_columns(&all, &CURATED_ORDER), CURATED_ORDER.to_vec());
    }
}
