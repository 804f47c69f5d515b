//! PeerBank Runner: repository, fallback synthesis, metrics calculator and service.
//!
//! This crate builds on `peerbank-core` to provide:
//! - Cache-first data repository with whole-roster retry and synthetic fallback
//! - Deterministic fallback dataset generation
//! - The metric catalog (names, definitions, dollar flags, curated order)
//! - The metrics calculator (CECL-adjusted capital base, concentration
//!   ratios, 3-year CRE growth, charge-off intensity)
//! - The metrics table with polars, CSV and Parquet export
//! - The metrics service consumed by presentation layers

pub mod calculator;
pub mod catalog;
pub mod repository;
pub mod service;
pub mod synthetic;
pub mod table;

pub use calculator::{calculate_metrics, capital_base, CapitalBase};
pub use catalog::{dollar_format_metrics, metric_definitions, Metric, MetricSpec, CURATED_ORDER};
pub use repository::{DataRepository, FetchOutcome};
pub use service::{order_columns, MetricsReport, MetricsService};
pub use synthetic::SyntheticGenerator;
pub use table::{ExportError, MetricRow, MetricsTable};
