//! Table Export Module
//! Writes the execution table, as currently filtered and sorted, to CSV.

use crate::data::{EarmarkType, ExecutionRow};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write CSV: {0}")]
    Polars(#[from] PolarsError),
    #[error("Nothing to export")]
    Empty,
}

/// CSV exporter for the execution table.
pub struct TableExporter;

impl TableExporter {
    /// Suggested file name, e.g. `execucao_2025_individual_transferencia_especial_pix.csv`.
    pub fn default_file_name(year: i32, earmark_type: EarmarkType) -> String {
        let mut slug = String::new();
        for c in earmark_type.label().to_lowercase().chars() {
            let c = match c {
                'á' | 'à' | 'â' | 'ã' => 'a',
                'é' | 'ê' => 'e',
                'í' => 'i',
                'ó' | 'ô' | 'õ' => 'o',
                'ú' => 'u',
                'ç' => 'c',
                c if c.is_ascii_alphanumeric() => c,
                _ => '_',
            };
            if c == '_' && (slug.is_empty() || slug.ends_with('_')) {
                continue;
            }
            slug.push(c);
        }
        let slug = slug.trim_end_matches('_');
        format!("execucao_{year}_{slug}.csv")
    }

    /// Build the export frame: action label plus raw amounts in millions and percentages.
    pub fn to_frame(rows: &[ExecutionRow]) -> Result<DataFrame, ExportError> {
        let pct = |v: f64| v.is_finite().then_some(v);

        let df = DataFrame::new(vec![
            Column::new(
                "Ação Governamental".into(),
                rows.iter().map(|r| r.action.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "Dotação (mi)".into(),
                rows.iter().map(|r| r.appropriated_mi()).collect::<Vec<_>>(),
            ),
            Column::new(
                "Empenhado (mi)".into(),
                rows.iter().map(|r| r.committed_mi()).collect::<Vec<_>>(),
            ),
            Column::new(
                "Pago (mi)".into(),
                rows.iter().map(|r| r.paid_mi()).collect::<Vec<_>>(),
            ),
            Column::new(
                "% Empenhado".into(),
                rows.iter().map(|r| pct(r.pct_committed)).collect::<Vec<_>>(),
            ),
            Column::new(
                "% Pago".into(),
                rows.iter().map(|r| pct(r.pct_paid)).collect::<Vec<_>>(),
            ),
        ])?;
        Ok(df)
    }

    /// Write rows as `;`-separated CSV.
    pub fn export_csv(rows: &[ExecutionRow], output_path: &Path) -> Result<(), ExportError> {
        if rows.is_empty() {
            return Err(ExportError::Empty);
        }

        let mut df = Self::to_frame(rows)?;
        let mut file = File::create(output_path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b';')
            .finish(&mut df)?;

        info!(path = %output_path.display(), rows = rows.len(), "execution table exported");
        Ok(())
    }
}
