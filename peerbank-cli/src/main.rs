//! PeerBank CLI: fetch, metrics, catalog, roster and cache commands.
//!
//! Commands:
//! - `fetch`: load the raw dataset for a window (cache, live, or fallback)
//! - `metrics`: compute the metrics table, print the latest quarter, export
//! - `catalog`: list every metric with its definition
//! - `roster`: show the configured roster
//! - `cache status|remove|clear`: inspect and evict cache entries

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use peerbank_core::config::PipelineConfig;
use peerbank_core::data::{DatasetCache, FdicClient};
use peerbank_core::domain::DateWindow;
use peerbank_runner::catalog::{Metric, CATALOG};
use peerbank_runner::{DataRepository, MetricsReport, MetricsService};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "peerbank",
    about = "PeerBank CLI: call-report ingestion and supervisory peer metrics"
)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the raw dataset for a window and report where it came from.
    Fetch {
        /// Start date (YYYYMMDD or YYYY-MM-DD). Defaults to the configured window.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYYMMDD or YYYY-MM-DD). Defaults to the configured window.
        #[arg(long)]
        end: Option<String>,

        /// Ignore any cache entry and fetch again.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Compute the metrics table and print the latest quarter.
    Metrics {
        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        #[arg(long, default_value_t = false)]
        force: bool,

        /// Write the full table as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the full table as Parquet.
        #[arg(long)]
        parquet: Option<PathBuf>,
    },
    /// List metric names, units and definitions.
    Catalog,
    /// Show the configured roster.
    Roster,
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cache entries.
    Status,
    /// Remove the entry for one window.
    Remove {
        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,
    },
    /// Remove every cache entry.
    Clear {
        /// Actually delete (without this flag, only reports what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch { start, end, force } => run_fetch(&config, start, end, force),
        Commands::Metrics {
            start,
            end,
            force,
            csv,
            parquet,
        } => run_metrics(&config, start, end, force, csv, parquet),
        Commands::Catalog => run_catalog(),
        Commands::Roster => run_roster(&config),
        Commands::Cache { action } => {
            let cache = DatasetCache::new(&config.cache.dir);
            match action {
                CacheAction::Status => run_cache_status(&cache),
                CacheAction::Remove { start, end } => run_cache_remove(&cache, &start, &end),
                CacheAction::Clear { confirm } => run_cache_clear(&cache, confirm),
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => {
            let config = PipelineConfig::from_file(p)
                .with_context(|| format!("failed to load config {}", p.display()))?;
            debug!(path = %p.display(), roster = config.roster.len(), "loaded config");
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Window from CLI overrides, falling back to the configured one per end.
fn resolve_window(
    config: &PipelineConfig,
    start: Option<String>,
    end: Option<String>,
) -> Result<DateWindow> {
    let start = start.unwrap_or_else(|| config.window.start.clone());
    let end = end.unwrap_or_else(|| config.window.end.clone());
    DateWindow::parse(&start, &end).context("invalid date window")
}

fn build_repository(config: &PipelineConfig) -> Result<DataRepository> {
    let client = FdicClient::new(&config.api).context("failed to build FDIC client")?;
    Ok(DataRepository::from_config(Box::new(client), config))
}

fn run_fetch(
    config: &PipelineConfig,
    start: Option<String>,
    end: Option<String>,
    force: bool,
) -> Result<()> {
    let window = resolve_window(config, start, end)?;
    let repo = build_repository(config)?;

    let outcome = if force {
        repo.refresh(&config.roster, &window)
    } else {
        repo.fetch_for_roster(&config.roster, &window)
    };

    println!("Window: {window}");
    println!(
        "Source: {}{}",
        outcome.provenance,
        if outcome.from_cache { " (cached)" } else { "" }
    );
    println!("Entities: {}", outcome.dataset.entity_count());
    println!("Filings: {}", outcome.dataset.record_count());
    println!();
    println!("{:<45} {:>8}", "Entity", "Filings");
    println!("{}", "-".repeat(54));
    for (name, filings) in &outcome.dataset.financials {
        println!(
            "{:<45} {:>8}",
            config.roster.display_name(name),
            filings.len()
        );
    }
    Ok(())
}

fn run_metrics(
    config: &PipelineConfig,
    start: Option<String>,
    end: Option<String>,
    force: bool,
    csv: Option<PathBuf>,
    parquet: Option<PathBuf>,
) -> Result<()> {
    let window = resolve_window(config, start, end)?;
    let service = MetricsService::new(build_repository(config)?, config.roster.clone());

    let report = if force {
        service.get_metrics_refreshed(&window)
    } else {
        service.get_metrics(&window)
    };

    print_summary(&report);

    if let Some(path) = csv {
        report
            .table
            .write_csv(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("CSV written to: {}", path.display());
    }
    if let Some(path) = parquet {
        report
            .table
            .write_parquet(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Parquet written to: {}", path.display());
    }
    Ok(())
}

const SUMMARY_METRICS: [Metric; 6] = [
    Metric::TotalAssets,
    Metric::Tier1Capital,
    Metric::RealEstateToCapital,
    Metric::CommercialReToCapital,
    Metric::NonOwnerOccupiedCreGrowth3y,
    Metric::ReturnOnAssets,
];

fn print_summary(report: &MetricsReport) {
    let table = &report.table;
    println!("Window: {}", report.window);
    println!(
        "Source: {}{}",
        report.provenance,
        if report.from_cache { " (cached)" } else { "" }
    );
    println!("Rows: {}", table.len());

    let Some(latest) = table.latest_date() else {
        println!("No filings in window.");
        return;
    };
    println!("Latest quarter: {latest}");
    println!();

    print!("{:<20}", "Entity");
    for m in SUMMARY_METRICS {
        print!(" {:>14}", short_label(m));
    }
    println!();
    println!("{}", "-".repeat(20 + 15 * SUMMARY_METRICS.len()));

    for row in table.rows_on(latest) {
        print!("{:<20}", truncate(&row.entity, 20));
        for m in SUMMARY_METRICS {
            print!(" {:>14}", format_value(m, row.get(m)));
        }
        println!();
    }
}

fn short_label(metric: Metric) -> &'static str {
    match metric {
        Metric::TotalAssets => "Assets",
        Metric::Tier1Capital => "Tier 1",
        Metric::RealEstateToCapital => "RE/Cap %",
        Metric::CommercialReToCapital => "CRE/Cap %",
        Metric::NonOwnerOccupiedCreGrowth3y => "NOO CRE 3y %",
        Metric::ReturnOnAssets => "ROA %",
        other => other.name(),
    }
}

fn format_value(metric: Metric, value: Option<f64>) -> String {
    match value {
        None => "n/a".into(),
        // Call-report amounts are in thousands of dollars.
        Some(v) if metric.is_dollar() => format!("${:.1}B", v / 1e6),
        Some(v) => format!("{v:.2}"),
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(width - 1).collect();
        t.push('~');
        t
    }
}

fn run_catalog() -> Result<()> {
    for spec in CATALOG.iter() {
        let kind = if spec.dollar { "$" } else { "%" };
        println!("{kind} {}", spec.name);
        println!("    {}", spec.definition);
    }
    Ok(())
}

fn run_roster(config: &PipelineConfig) -> Result<()> {
    println!(
        "{:<45} {:>7}  {:<18} {:<7} {:<14}",
        "Name", "Cert", "Display", "Tier", "Mix"
    );
    println!("{}", "-".repeat(96));
    for e in config.roster.iter() {
        println!(
            "{:<45} {:>7}  {:<18} {:<7} {:<14}",
            e.name,
            e.cert.as_deref().unwrap_or("-"),
            e.display(),
            format!("{:?}", e.tier).to_lowercase(),
            format!("{:?}", e.mix).to_lowercase(),
        );
    }
    Ok(())
}

fn run_cache_status(cache: &DatasetCache) -> Result<()> {
    let entries = cache.status();
    if entries.is_empty() {
        println!("Cache is empty: {}", cache.cache_dir().display());
        return Ok(());
    }

    println!("Cache: {}", cache.cache_dir().display());
    println!();
    println!(
        "{:<24} {:<10} {:>8} {:>8}  {:<20}",
        "Window", "Source", "Entities", "Filings", "Cached at"
    );
    println!("{}", "-".repeat(76));
    for m in &entries {
        println!(
            "{:<24} {:<10} {:>8} {:>8}  {:<20}",
            format!("{} to {}", m.start_date.format("%Y%m%d"), m.end_date.format("%Y%m%d")),
            m.provenance.to_string(),
            m.entity_count,
            m.record_count,
            m.cached_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
    }
    Ok(())
}

fn run_cache_remove(cache: &DatasetCache, start: &str, end: &str) -> Result<()> {
    let window = DateWindow::parse(start, end).context("invalid date window")?;
    if cache.remove(&window)? {
        println!("Removed cache entry for {window}");
    } else {
        println!("No cache entry for {window}");
    }
    Ok(())
}

fn run_cache_clear(cache: &DatasetCache, confirm: bool) -> Result<()> {
    if !confirm {
        let n = cache.status().len();
        if n == 0 {
            println!("Cache is empty: {}", cache.cache_dir().display());
        } else {
            println!("{n} cache entries would be removed. Re-run with --confirm to delete.");
        }
        return Ok(());
    }
    let removed = cache.clear()?;
    if removed == 0 && !cache.cache_dir().exists() {
        bail!("cache directory does not exist: {}", cache.cache_dir().display());
    }
    println!("Removed {removed} files from {}", cache.cache_dir().display());
    Ok(())
}
