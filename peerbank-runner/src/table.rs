//! The derived metrics table and its exports.
//!
//! Rows hold one value slot per catalog metric; the table's column list
//! only controls presentation order. Conversion to a polars `DataFrame`
//! produces `entity` (str), `date` (Date), then one nullable f64 column per
//! metric named by its display name.

use crate::catalog::{Metric, METRIC_COUNT};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("polars error: {0}")]
    Polars(String),
}

/// One (entity, report date) row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub entity: String,
    pub date: NaiveDate,
    values: Vec<Option<f64>>,
}

impl MetricRow {
    /// `values` is indexed by `Metric::index`; missing slots read as `None`.
    pub fn new(entity: impl Into<String>, date: NaiveDate, mut values: Vec<Option<f64>>) -> Self {
        values.resize(METRIC_COUNT, None);
        Self {
            entity: entity.into(),
            date,
            values,
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(metric.index()).copied().flatten()
    }
}

/// Ordered collection of metric rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsTable {
    columns: Vec<Metric>,
    rows: Vec<MetricRow>,
}

impl MetricsTable {
    pub fn new(columns: Vec<Metric>, rows: Vec<MetricRow>) -> Self {
        Self { columns, rows }
    }

    /// Metric columns, in presentation order.
    pub fn columns(&self) -> &[Metric] {
        &self.columns
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn with_columns(mut self, columns: Vec<Metric>) -> Self {
        self.columns = columns;
        self
    }

    /// Rename entities in place.
    pub fn map_entities<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        for row in &mut self.rows {
            row.entity = f(&row.entity);
        }
        self
    }

    /// Distinct entity names, in first-seen order.
    pub fn entities(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.entity.as_str()) {
                seen.push(&row.entity);
            }
        }
        seen
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }

    pub fn rows_on(&self, date: NaiveDate) -> impl Iterator<Item = &MetricRow> {
        self.rows.iter().filter(move |r| r.date == date)
    }

    pub fn entity_rows<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a MetricRow> {
        self.rows.iter().filter(move |r| r.entity == entity)
    }

    // ── Export ───────────────────────────────────────────────────────

    pub fn to_dataframe(&self) -> Result<DataFrame, ExportError> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
        let entities: Vec<&str> = self.rows.iter().map(|r| r.entity.as_str()).collect();
        let dates: Vec<i32> = self
            .rows
            .iter()
            .map(|r| (r.date - epoch).num_days() as i32)
            .collect();

        let mut columns = Vec::with_capacity(self.columns.len() + 2);
        columns.push(Column::new("entity".into(), entities));
        columns.push(
            Column::new("date".into(), dates)
                .cast(&DataType::Date)
                .map_err(|e| ExportError::Polars(format!("date cast: {e}")))?,
        );
        for &metric in &self.columns {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.get(metric)).collect();
            columns.push(Column::new(metric.name().into(), values));
        }

        DataFrame::new(columns).map_err(|e| ExportError::Polars(format!("dataframe creation: {e}")))
    }

    /// CSV with a header row; null metrics are empty cells.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        let mut header = vec!["entity", "date"];
        header.extend(self.columns.iter().map(|m| m.name()));
        wtr.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.entity.clone(), row.date.to_string()];
            record.extend(
                self.columns
                    .iter()
                    .map(|&m| row.get(m).map(|v| v.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&record)?;
        }

        let data = wtr
            .into_inner()
            .map_err(|e| ExportError::Csv(e.into_error().into()))?;
        String::from_utf8(data).map_err(|e| ExportError::Polars(format!("CSV is not UTF-8: {e}")))
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ExportError> {
        let csv = self.to_csv()?;
        fs::write(path, csv).map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn write_parquet(&self, path: &Path) -> Result<(), ExportError> {
        let mut df = self.to_dataframe()?;
        let file = fs::File::create(path).map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        ParquetWriter::new(file)
            .finish(&mut df)
            .map_err(|e| ExportError::Polars(format!("write parquet: {e}")))?;
        Ok(())
    }
}
