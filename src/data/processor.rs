//! Data Processor Module
//! Group-by reshaping behind each dashboard view.

use crate::data::classify::{modality_rank, EarmarkType};
use crate::data::format::{billions_label, millions_label};
use crate::data::loader::columns::*;
use chrono::{DateTime, Local};
use polars::prelude::*;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Unexpected null in column {0}")]
    NullValue(&'static str),
}

/// Appropriation of one earmark type in one year (view 1).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeYearBar {
    pub year: i32,
    pub earmark_type: EarmarkType,
    pub amount: f64,
    pub label: String,
}

/// Appropriation of one government function in one year (view 2).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBar {
    pub year: i32,
    pub function: String,
    pub amount: f64,
    pub label: String,
}

/// Appropriation per (year, type, modality) cell (view 3).
#[derive(Debug, Clone, PartialEq)]
pub struct ModalityBar {
    pub year: i32,
    pub earmark_type: EarmarkType,
    pub modality: String,
    pub amount: f64,
    pub label: String,
}

/// Execution figures of one government action (view 4).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRow {
    pub action: String,
    pub appropriated: f64,
    pub committed: f64,
    pub paid: f64,
    /// Not finite when nothing was appropriated
    pub pct_committed: f64,
    pub pct_paid: f64,
}

impl ExecutionRow {
    pub fn appropriated_mi(&self) -> f64 {
        self.appropriated / 1e6
    }

    pub fn committed_mi(&self) -> f64 {
        self.committed / 1e6
    }

    pub fn paid_mi(&self) -> f64 {
        self.paid / 1e6
    }

    /// Case-insensitive substring match on the action label.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.action.to_lowercase().contains(&query.to_lowercase())
    }

    fn sort_value(&self, criterion: SortCriterion) -> f64 {
        match criterion {
            SortCriterion::Appropriation => self.appropriated_mi(),
            SortCriterion::PctCommitted => self.pct_committed,
            SortCriterion::PctPaid => self.pct_paid,
        }
    }
}

/// Ordering of the execution table (always descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortCriterion {
    #[default]
    Appropriation,
    PctCommitted,
    PctPaid,
}

impl SortCriterion {
    pub const ALL: [SortCriterion; 3] = [
        SortCriterion::Appropriation,
        SortCriterion::PctCommitted,
        SortCriterion::PctPaid,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortCriterion::Appropriation => "Dotação",
            SortCriterion::PctCommitted => "% Empenhado",
            SortCriterion::PctPaid => "% Pago",
        }
    }
}

/// Everything the chart views need, computed once per load.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub frame: DataFrame,
    pub years: Vec<i32>,
    pub types: Vec<EarmarkType>,
    pub by_type_year: Vec<TypeYearBar>,
    pub by_function: BTreeMap<EarmarkType, Vec<FunctionBar>>,
    pub by_modality: Vec<ModalityBar>,
    pub loaded_at: DateTime<Local>,
}

/// Handles the reshaping operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Run every chart aggregation, in parallel.
    pub fn prepare(frame: DataFrame) -> Result<DashboardData, ProcessorError> {
        let years = Self::years(&frame)?;
        let types = Self::types_present(&frame, None)?;

        let ((by_type_year, by_modality), by_function) = rayon::join(
            || {
                rayon::join(
                    || Self::appropriation_by_type_year(&frame),
                    || Self::appropriation_by_modality(&frame),
                )
            },
            || {
                types
                    .par_iter()
                    .map(|&t| Self::appropriation_by_function(&frame, t).map(|bars| (t, bars)))
                    .collect::<Result<BTreeMap<_, _>, _>>()
            },
        );

        let data = DashboardData {
            years,
            types,
            by_type_year: by_type_year?,
            by_function: by_function?,
            by_modality: by_modality?,
            frame,
            loaded_at: Local::now(),
        };

        info!(
            rows = data.frame.height(),
            years = data.years.len(),
            types = data.types.len(),
            modality_cells = data.by_modality.len(),
            "dashboard data prepared"
        );
        Ok(data)
    }

    /// Distinct years, ascending.
    pub fn years(df: &DataFrame) -> Result<Vec<i32>, ProcessorError> {
        let years: BTreeSet<i32> = df.column(YEAR)?.i32()?.into_iter().flatten().collect();
        Ok(years.into_iter().collect())
    }

    /// Earmark types present (optionally within one year), in display order.
    pub fn types_present(
        df: &DataFrame,
        year: Option<i32>,
    ) -> Result<Vec<EarmarkType>, ProcessorError> {
        let mut lazy = df.clone().lazy().select([col(YEAR), col(EARMARK_TYPE)]);
        if let Some(year) = year {
            lazy = lazy.filter(col(YEAR).eq(lit(year)));
        }
        let filtered = lazy.collect()?;

        let types: BTreeSet<EarmarkType> = filtered
            .column(EARMARK_TYPE)?
            .str()?
            .into_iter()
            .flatten()
            .filter_map(EarmarkType::from_label)
            .collect();
        Ok(types.into_iter().collect())
    }

    /// Sum of appropriation per (year, type). Rows without a type are dropped.
    pub fn appropriation_by_type_year(df: &DataFrame) -> Result<Vec<TypeYearBar>, ProcessorError> {
        let grouped = df
            .clone()
            .lazy()
            .filter(col(EARMARK_TYPE).is_not_null())
            .group_by([col(YEAR), col(EARMARK_TYPE)])
            .agg([col(APPROPRIATED).sum()])
            .collect()?;

        let years = i32_values(&grouped, YEAR)?;
        let types = str_values(&grouped, EARMARK_TYPE)?;
        let amounts = f64_values(&grouped, APPROPRIATED)?;

        let mut bars: Vec<TypeYearBar> = years
            .into_iter()
            .zip(types)
            .zip(amounts)
            .filter_map(|((year, t), amount)| {
                let earmark_type = EarmarkType::from_label(&t)?;
                Some(TypeYearBar {
                    year,
                    earmark_type,
                    amount,
                    label: billions_label(amount),
                })
            })
            .collect();

        bars.sort_by_key(|b| (b.year, b.earmark_type));
        debug!(bars = bars.len(), "appropriation by type and year");
        Ok(bars)
    }

    /// Sum of appropriation per (year, function) for one earmark type.
    ///
    /// Equivalent to grouping by (year, function, type), filling the missing
    /// type cells with zero, selecting the type and dropping non-positive sums.
    /// Rows without a function are left out.
    pub fn appropriation_by_function(
        df: &DataFrame,
        earmark_type: EarmarkType,
    ) -> Result<Vec<FunctionBar>, ProcessorError> {
        let grouped = df
            .clone()
            .lazy()
            .filter(
                col(EARMARK_TYPE)
                    .eq(lit(earmark_type.label()))
                    .and(col(FUNCTION).is_not_null()),
            )
            .group_by([col(YEAR), col(FUNCTION)])
            .agg([col(APPROPRIATED).sum()])
            .filter(col(APPROPRIATED).gt(lit(0.0)))
            .collect()?;

        let years = i32_values(&grouped, YEAR)?;
        let functions = str_values(&grouped, FUNCTION)?;
        let amounts = f64_values(&grouped, APPROPRIATED)?;

        let mut bars: Vec<FunctionBar> = years
            .into_iter()
            .zip(functions)
            .zip(amounts)
            .map(|((year, function), amount)| FunctionBar {
                year,
                function,
                amount,
                label: millions_label(amount),
            })
            .collect();

        bars.sort_by(|a, b| a.function.cmp(&b.function).then(a.year.cmp(&b.year)));
        Ok(bars)
    }

    /// Sum of appropriation per (year, type, modality), positive cells only.
    /// Rows without a modality are left out.
    pub fn appropriation_by_modality(df: &DataFrame) -> Result<Vec<ModalityBar>, ProcessorError> {
        let grouped = df
            .clone()
            .lazy()
            .filter(col(EARMARK_TYPE).is_not_null().and(col(MODALITY).is_not_null()))
            .group_by([col(YEAR), col(EARMARK_TYPE), col(MODALITY)])
            .agg([col(APPROPRIATED).sum()])
            .filter(col(APPROPRIATED).gt(lit(0.0)))
            .collect()?;

        let years = i32_values(&grouped, YEAR)?;
        let types = str_values(&grouped, EARMARK_TYPE)?;
        let modalities = str_values(&grouped, MODALITY)?;
        let amounts = f64_values(&grouped, APPROPRIATED)?;

        let mut bars: Vec<ModalityBar> = years
            .into_iter()
            .zip(types)
            .zip(modalities)
            .zip(amounts)
            .filter_map(|(((year, t), modality), amount)| {
                Some(ModalityBar {
                    year,
                    earmark_type: EarmarkType::from_label(&t)?,
                    modality,
                    amount,
                    label: millions_label(amount),
                })
            })
            .collect();

        bars.sort_by(|a, b| {
            (a.year, a.earmark_type, modality_rank(&a.modality))
                .cmp(&(b.year, b.earmark_type, modality_rank(&b.modality)))
                .then_with(|| a.modality.cmp(&b.modality))
        });
        Ok(bars)
    }

    /// Execution table for one year and earmark type, sorted descending by `criterion`.
    /// Actions missing their code or description have no label and are left out.
    pub fn execution_table(
        df: &DataFrame,
        year: i32,
        earmark_type: EarmarkType,
        criterion: SortCriterion,
    ) -> Result<Vec<ExecutionRow>, ProcessorError> {
        let grouped = df
            .clone()
            .lazy()
            .filter(
                col(YEAR)
                    .eq(lit(year))
                    .and(col(EARMARK_TYPE).eq(lit(earmark_type.label())))
                    .and(col(ACTION_CODE).is_not_null())
                    .and(col(ACTION_DESC).is_not_null()),
            )
            .group_by([col(ACTION_CODE), col(ACTION_DESC)])
            .agg([
                col(APPROPRIATED).sum(),
                col(COMMITTED).sum(),
                col(PAID).sum(),
            ])
            .collect()?;

        let codes = str_values(&grouped, ACTION_CODE)?;
        let descs = str_values(&grouped, ACTION_DESC)?;
        let appropriated = f64_values(&grouped, APPROPRIATED)?;
        let committed = f64_values(&grouped, COMMITTED)?;
        let paid = f64_values(&grouped, PAID)?;

        // Distinct (code, desc) pairs can still render the same label.
        let mut totals: HashMap<String, (f64, f64, f64)> = HashMap::new();
        for (i, (code, desc)) in codes.iter().zip(descs.iter()).enumerate() {
            let entry = totals
                .entry(format!("{code} - {desc}"))
                .or_insert((0.0, 0.0, 0.0));
            entry.0 += appropriated[i];
            entry.1 += committed[i];
            entry.2 += paid[i];
        }

        let mut rows: Vec<ExecutionRow> = totals
            .into_iter()
            .map(|(action, (appropriated, committed, paid))| ExecutionRow {
                action,
                appropriated,
                committed,
                paid,
                pct_committed: committed / appropriated * 100.0,
                pct_paid: paid / appropriated * 100.0,
            })
            .collect();

        rows.sort_by(|a, b| a.action.cmp(&b.action));
        sort_descending(&mut rows, criterion);

        debug!(
            year,
            earmark_type = earmark_type.label(),
            rows = rows.len(),
            "execution table"
        );
        Ok(rows)
    }
}

/// Stable descending sort; non-finite values go last.
pub fn sort_descending(rows: &mut [ExecutionRow], criterion: SortCriterion) {
    rows.sort_by(|a, b| {
        let (x, y) = (a.sort_value(criterion), b.sort_value(criterion));
        match (x.is_finite(), y.is_finite()) {
            (true, true) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => Ordering::Equal,
        }
    });
}

fn i32_values(df: &DataFrame, name: &'static str) -> Result<Vec<i32>, ProcessorError> {
    df.column(name)?
        .i32()?
        .into_iter()
        .map(|v| v.ok_or(ProcessorError::NullValue(name)))
        .collect()
}

fn str_values(df: &DataFrame, name: &'static str) -> Result<Vec<String>, ProcessorError> {
    df.column(name)?
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string).ok_or(ProcessorError::NullValue(name)))
        .collect()
}

fn f64_values(df: &DataFrame, name: &'static str) -> Result<Vec<f64>, ProcessorError> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::build_frame;
    use crate::data::record::EmendaRecord;

    #[allow(clippy::too_many_arguments)]
    fn record(
        year: i64,
        rp: i64,
        action: &str,
        function: &str,
        modality: &str,
        appropriated: f64,
        committed: f64,
        paid: f64,
    ) -> EmendaRecord {
        EmendaRecord {
            year: Some(year),
            action_code: Some(action.to_string()),
            action_desc: Some(format!("Ação {action}")),
            primary_result_code: Some(rp),
            function_desc: Some(function.to_string()),
            modality_desc: Some(modality.to_string()),
            appropriated: Some(appropriated),
            empenhado: Some(committed),
            pago: Some(paid),
            ..EmendaRecord::default()
        }
    }

    fn sample_frame() -> DataFrame {
        let municipios = "Transferências a Municípios";
        let estados = "Transferências a Estados e ao Distrito Federal";
        let records = vec![
            record(2024, 7, "1000", "Saúde", municipios, 2e9, 1e9, 5e8),
            record(2024, 7, "1000", "Saúde", estados, 1e9, 0.0, 0.0),
            record(2024, 6, "0EC2", "Encargos", municipios, 3e9, 3e9, 3e9),
            record(2025, 6, "2000", "Educação", municipios, 4e6, 1e6, 0.0),
            record(2025, 6, "2000", "Educação", municipios, 6e6, 4e6, 2e6),
            record(2025, 6, "3000", "Saúde", estados, 5e6, 5e6, 5e6),
            record(2025, 6, "4000", "Saúde", estados, 0.0, 1e6, 0.0),
            record(2025, 8, "5000", "Cultura", "Transferências ao Exterior", 0.0, 0.0, 0.0),
            record(2025, 2, "9999", "Saúde", municipios, 7e9, 7e9, 7e9),
        ];
        build_frame(&records).unwrap()
    }

    #[test]
    fn years_and_types_are_ordered() {
        let df = sample_frame();
        assert_eq!(DataProcessor::years(&df).unwrap(), vec![2024, 2025]);
        assert_eq!(
            DataProcessor::types_present(&df, None).unwrap(),
            vec![
                EarmarkType::Bancada,
                EarmarkType::Comissao,
                EarmarkType::IndividualDefinida,
                EarmarkType::IndividualPix,
            ]
        );
        assert_eq!(
            DataProcessor::types_present(&df, Some(2024)).unwrap(),
            vec![EarmarkType::Bancada, EarmarkType::IndividualPix]
        );
    }

    #[test]
    fn type_year_sums_skip_unclassified_rows() {
        let df = sample_frame();
        let bars = DataProcessor::appropriation_by_type_year(&df).unwrap();

        let keys: Vec<(i32, EarmarkType)> = bars.iter().map(|b| (b.year, b.earmark_type)).collect();
        assert_eq!(
            keys,
            vec![
                (2024, EarmarkType::Bancada),
                (2024, EarmarkType::IndividualPix),
                (2025, EarmarkType::Comissao),
                (2025, EarmarkType::IndividualDefinida),
            ]
        );
        assert_eq!(bars[0].amount, 3e9);
        assert_eq!(bars[0].label, "3,0 bi");
        assert_eq!(bars[2].amount, 0.0);
        assert_eq!(bars[3].amount, 15e6);
    }

    #[test]
    fn function_view_keeps_positive_cells_of_one_type() {
        let df = sample_frame();
        let bars =
            DataProcessor::appropriation_by_function(&df, EarmarkType::IndividualDefinida).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].function, "Educação");
        assert_eq!(bars[0].amount, 10e6);
        assert_eq!(bars[0].label, "10,0 mi");
        assert_eq!(bars[1].function, "Saúde");
        assert_eq!(bars[1].amount, 5e6);

        let comissao = DataProcessor::appropriation_by_function(&df, EarmarkType::Comissao).unwrap();
        assert!(comissao.is_empty());
    }

    #[test]
    fn modality_view_orders_by_palette() {
        let df = sample_frame();
        let bars = DataProcessor::appropriation_by_modality(&df).unwrap();

        let cells: Vec<(i32, EarmarkType, &str)> = bars
            .iter()
            .map(|b| (b.year, b.earmark_type, b.modality.as_str()))
            .collect();
        assert_eq!(
            cells,
            vec![
                (2024, EarmarkType::Bancada, "Transf. Estados e DF"),
                (2024, EarmarkType::Bancada, "Transf. a Municípios"),
                (2024, EarmarkType::IndividualPix, "Transf. a Municípios"),
                (2025, EarmarkType::IndividualDefinida, "Transf. Estados e DF"),
                (2025, EarmarkType::IndividualDefinida, "Transf. a Municípios"),
            ]
        );
    }

    #[test]
    fn execution_table_aggregates_and_sorts() {
        let df = sample_frame();
        let rows = DataProcessor::execution_table(
            &df,
            2025,
            EarmarkType::IndividualDefinida,
            SortCriterion::Appropriation,
        )
        .unwrap();

        let actions: Vec<&str> = rows.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(
            actions,
            vec!["2000 - Ação 2000", "3000 - Ação 3000", "4000 - Ação 4000"]
        );
        assert_eq!(rows[0].appropriated_mi(), 10.0);
        assert_eq!(rows[0].committed_mi(), 5.0);
        assert_eq!(rows[0].pct_committed, 50.0);
        assert_eq!(rows[0].pct_paid, 20.0);
        assert!(rows[2].pct_committed.is_infinite());

        let by_paid = DataProcessor::execution_table(
            &df,
            2025,
            EarmarkType::IndividualDefinida,
            SortCriterion::PctPaid,
        )
        .unwrap();
        let actions: Vec<&str> = by_paid.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(
            actions,
            vec!["3000 - Ação 3000", "2000 - Ação 2000", "4000 - Ação 4000"]
        );
    }

    #[test]
    fn execution_rows_filter_case_insensitively() {
        let row = ExecutionRow {
            action: "0EC2 - Transferência Especial".to_string(),
            appropriated: 1.0,
            committed: 0.0,
            paid: 0.0,
            pct_committed: 0.0,
            pct_paid: 0.0,
        };
        assert!(row.matches(""));
        assert!(row.matches("  transferência "));
        assert!(row.matches("0ec2"));
        assert!(!row.matches("saúde"));
    }

    #[test]
    fn rows_without_descriptions_drop_out_of_keyed_views() {
        let municipios = "Transferências a Municípios";
        let undescribed = EmendaRecord {
            year: Some(2025),
            action_code: Some("2000".to_string()),
            primary_result_code: Some(6),
            appropriated: Some(3e6),
            ..EmendaRecord::default()
        };
        let records = vec![
            record(2025, 6, "2000", "Educação", municipios, 4e6, 2e6, 1e6),
            undescribed,
        ];
        let df = build_frame(&records).unwrap();

        // Still counted where no description is part of the key.
        let by_type = DataProcessor::appropriation_by_type_year(&df).unwrap();
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].amount, 7e6);

        let by_function =
            DataProcessor::appropriation_by_function(&df, EarmarkType::IndividualDefinida).unwrap();
        assert_eq!(by_function.len(), 1);
        assert_eq!(by_function[0].function, "Educação");
        assert_eq!(by_function[0].amount, 4e6);

        let by_modality = DataProcessor::appropriation_by_modality(&df).unwrap();
        assert_eq!(by_modality.len(), 1);
        assert_eq!(by_modality[0].modality, "Transf. a Municípios");
        assert_eq!(by_modality[0].amount, 4e6);

        let rows = DataProcessor::execution_table(
            &df,
            2025,
            EarmarkType::IndividualDefinida,
            SortCriterion::Appropriation,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action, "2000 - Ação 2000");
        assert_eq!(rows[0].appropriated, 4e6);
    }

    #[test]
    fn negative_sums_are_dropped_from_facets() {
        let municipios = "Transferências a Municípios";
        let estados = "Transferências a Estados e ao Distrito Federal";
        let records = vec![
            record(2025, 6, "2000", "Saúde", municipios, -2e6, 0.0, 0.0),
            record(2025, 6, "3000", "Educação", estados, 1e6, 0.0, 0.0),
            record(2025, 6, "3000", "Saúde", estados, -0.5e6, 0.0, 0.0),
        ];
        let df = build_frame(&records).unwrap();

        let by_function =
            DataProcessor::appropriation_by_function(&df, EarmarkType::IndividualDefinida).unwrap();
        let functions: Vec<&str> = by_function.iter().map(|b| b.function.as_str()).collect();
        assert_eq!(functions, vec!["Educação"]);

        let by_modality = DataProcessor::appropriation_by_modality(&df).unwrap();
        assert_eq!(by_modality.len(), 1);
        assert_eq!(by_modality[0].modality, "Transf. Estados e DF");
        assert_eq!(by_modality[0].amount, 0.5e6);
    }

    #[test]
    fn prepare_builds_every_view() {
        let data = DataProcessor::prepare(sample_frame()).unwrap();
        assert_eq!(data.years, vec![2024, 2025]);
        assert_eq!(data.by_type_year.len(), 4);
        assert_eq!(data.by_function.len(), 4);
        assert_eq!(data.by_function[&EarmarkType::Bancada].len(), 1);
        assert_eq!(data.by_modality.len(), 5);
    }
}
