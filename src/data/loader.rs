//! Dataset Loader Module
//! Fetches the earmark JSON from the endpoint and builds a Polars DataFrame
//! with the derived columns already applied.

use crate::config::DashboardConfig;
use crate::data::classify::{remap_modality, EarmarkType};
use crate::data::record::EmendaRecord;
use polars::prelude::*;
use reqwest::blocking::Client;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// Column names of the loaded frame.
pub mod columns {
    pub const YEAR: &str = "Ano";
    pub const BUDGET_CODE: &str = "UO_cod";
    pub const ACTION_CODE: &str = "Acao_cod";
    pub const ACTION_DESC: &str = "Acao_desc";
    pub const PRIMARY_RESULT: &str = "ResultadoPrimario_cod";
    pub const FUNCTION: &str = "Funcao_desc";
    pub const MODALITY: &str = "ModalidadeAplicacao_desc";
    pub const EARMARK_TYPE: &str = "tipo_emenda";
    pub const APPROPRIATED: &str = "loa_mais_credito";
    pub const COMMITTED: &str = "empenhado";
    pub const PAID: &str = "pago";
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to fetch data: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to build DataFrame: {0}")]
    Polars(#[from] PolarsError),
    #[error("Endpoint returned no records")]
    NoData,
}

/// Fetches the dataset over HTTP.
pub struct DataLoader {
    client: Client,
    endpoint: String,
}

impl DataLoader {
    pub fn new(config: &DashboardConfig) -> Result<Self, LoaderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Download and decode the raw records.
    pub fn fetch_records(&self) -> Result<Vec<EmendaRecord>, LoaderError> {
        let start = Instant::now();
        info!(endpoint = %self.endpoint, "fetching dataset");

        let body = self
            .client
            .get(&self.endpoint)
            .send()?
            .error_for_status()?
            .bytes()?;

        let records = parse_records(&body)?;
        info!(
            records = records.len(),
            bytes = body.len(),
            elapsed = ?start.elapsed(),
            "dataset fetched"
        );
        Ok(records)
    }

    /// Fetch the dataset and return it as a DataFrame with derived columns.
    pub fn load(&self) -> Result<DataFrame, LoaderError> {
        let records = self.fetch_records()?;
        build_frame(&records)
    }
}

/// Decode a JSON array of records.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<EmendaRecord>, LoaderError> {
    let records: Vec<EmendaRecord> = serde_json::from_slice(bytes)?;
    if records.is_empty() {
        return Err(LoaderError::NoData);
    }
    Ok(records)
}

/// Build the working frame: raw columns plus `tipo_emenda` and the remapped modality.
///
/// Rows without a year are dropped. Missing amounts are stored as 0 so they
/// contribute nothing to sums. Missing text fields are kept as nulls.
pub fn build_frame(records: &[EmendaRecord]) -> Result<DataFrame, LoaderError> {
    let n = records.len();
    let mut years: Vec<i32> = Vec::with_capacity(n);
    let mut budget_codes: Vec<Option<String>> = Vec::with_capacity(n);
    let mut action_codes: Vec<Option<String>> = Vec::with_capacity(n);
    let mut action_descs: Vec<Option<String>> = Vec::with_capacity(n);
    let mut primary_results: Vec<Option<i64>> = Vec::with_capacity(n);
    let mut functions: Vec<Option<String>> = Vec::with_capacity(n);
    let mut modalities: Vec<Option<String>> = Vec::with_capacity(n);
    let mut types: Vec<Option<&'static str>> = Vec::with_capacity(n);
    let mut appropriated: Vec<f64> = Vec::with_capacity(n);
    let mut committed: Vec<f64> = Vec::with_capacity(n);
    let mut paid: Vec<f64> = Vec::with_capacity(n);

    let mut skipped = 0usize;
    for record in records {
        let Some(year) = record.year.and_then(|y| i32::try_from(y).ok()) else {
            skipped += 1;
            continue;
        };

        years.push(year);
        budget_codes.push(record.budget_code.clone());
        action_codes.push(record.action_code.clone());
        action_descs.push(record.action_desc.clone());
        primary_results.push(record.primary_result_code);
        functions.push(record.function_desc.clone());
        modalities.push(record.modality_desc.as_deref().map(remap_modality));
        let action_code = record.action_code.as_deref().unwrap_or("");
        types.push(
            EarmarkType::classify(record.primary_result_code, action_code).map(EarmarkType::label),
        );
        appropriated.push(record.appropriated.unwrap_or(0.0));
        committed.push(record.empenhado.unwrap_or(0.0));
        paid.push(record.pago.unwrap_or(0.0));
    }

    if skipped > 0 {
        warn!(skipped, "dropped records without a year");
    }
    if years.is_empty() {
        return Err(LoaderError::NoData);
    }

    let df = DataFrame::new(vec![
        Column::new(columns::YEAR.into(), years),
        Column::new(columns::BUDGET_CODE.into(), budget_codes),
        Column::new(columns::ACTION_CODE.into(), action_codes),
        Column::new(columns::ACTION_DESC.into(), action_descs),
        Column::new(columns::PRIMARY_RESULT.into(), primary_results),
        Column::new(columns::FUNCTION.into(), functions),
        Column::new(columns::MODALITY.into(), modalities),
        Column::new(columns::EARMARK_TYPE.into(), types),
        Column::new(columns::APPROPRIATED.into(), appropriated),
        Column::new(columns::COMMITTED.into(), committed),
        Column::new(columns::PAID.into(), paid),
    ])?;

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"Ano": 2024, "Acao_cod": "0EC2", "Acao_desc": "Transferência Especial",
         "ResultadoPrimario_cod": 6, "Funcao_desc": "Encargos especiais",
         "ModalidadeAplicacao_desc": "Transferências a Municípios",
         "loa_mais_credito": 100.0, "empenhado": 50.0, "pago": 25.0},
        {"Ano": 2024, "Acao_cod": "2000", "Acao_desc": "Administração",
         "ResultadoPrimario_cod": 2, "Funcao_desc": "Saúde",
         "ModalidadeAplicacao_desc": "Transferências ao Exterior",
         "loa_mais_credito": 10.0, "empenhado": null, "pago": 1.0},
        {"Acao_cod": "9999", "ResultadoPrimario_cod": 7, "loa_mais_credito": 1.0}
    ]"#;

    #[test]
    fn parse_rejects_empty_payload() {
        assert!(matches!(parse_records(b"[]"), Err(LoaderError::NoData)));
        assert!(matches!(
            parse_records(b"{\"not\": \"a list\"}"),
            Err(LoaderError::Json(_))
        ));
    }

    #[test]
    fn builds_frame_with_derived_columns() {
        let records = parse_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);

        let df = build_frame(&records).unwrap();
        assert_eq!(df.height(), 2);

        let types: Vec<Option<&str>> = df
            .column(columns::EARMARK_TYPE)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            types,
            vec![Some("Individual - transferência especial (Pix)"), None]
        );

        let modalities: Vec<Option<&str>> = df
            .column(columns::MODALITY)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            modalities,
            vec![Some("Transf. a Municípios"), Some("Outras")]
        );

        let committed: Vec<Option<f64>> = df
            .column(columns::COMMITTED)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(committed, vec![Some(50.0), Some(0.0)]);
    }

    #[test]
    fn missing_descriptions_become_nulls() {
        let records = parse_records(
            br#"[{"Ano": 2025, "Acao_cod": "2000", "ResultadoPrimario_cod": 7,
                  "loa_mais_credito": 3e6}]"#,
        )
        .unwrap();
        let df = build_frame(&records).unwrap();

        for name in [columns::ACTION_DESC, columns::FUNCTION, columns::MODALITY] {
            assert_eq!(df.column(name).unwrap().null_count(), 1, "{name}");
        }
        let types: Vec<Option<&str>> = df
            .column(columns::EARMARK_TYPE)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(types, vec![Some("Bancada")]);
    }

    #[test]
    fn loader_uses_configured_endpoint() {
        let config = DashboardConfig {
            endpoint: "http://localhost:9/emendas".to_string(),
            ..DashboardConfig::default()
        };
        let loader = DataLoader::new(&config).unwrap();
        assert_eq!(loader.endpoint(), "http://localhost:9/emendas");
    }
}
