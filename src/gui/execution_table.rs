//! Execution Table Widget
//! Section 4: budget execution of the current year per government action,
//! with type selector, sort criterion, text filter and CSV export.

use crate::data::{
    block_bar, format_br, DashboardData, DataProcessor, EarmarkType, ExecutionRow, SortCriterion,
};
use egui::{Color32, ComboBox, RichText, ScrollArea};
use tracing::error;

const TABLE_HEIGHT: f32 = 420.0;
const HEADERS: [&str; 6] = [
    "Ação Governamental",
    "Dotação (mi)",
    "Empenhado (mi)",
    "Pago (mi)",
    "% Empenhado",
    "% Pago",
];

/// Execution table state: selectors, filter and the cached rows.
#[derive(Default)]
pub struct ExecutionTable {
    pub selected_type: Option<EarmarkType>,
    pub criterion: SortCriterion,
    pub query: String,
    /// Types present in the execution year
    pub available_types: Vec<EarmarkType>,
    rows: Vec<ExecutionRow>,
    cache_key: Option<(EarmarkType, SortCriterion)>,
}

impl ExecutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset cached rows after a reload and refresh the type choices for `year`.
    pub fn reset(&mut self, data: &DashboardData, year: i32) {
        self.rows.clear();
        self.cache_key = None;
        self.available_types = match DataProcessor::types_present(&data.frame, Some(year)) {
            Ok(types) => types,
            Err(e) => {
                error!(error = %e, "failed to list earmark types for execution year");
                Vec::new()
            }
        };
        if !self
            .selected_type
            .is_some_and(|t| self.available_types.contains(&t))
        {
            self.selected_type = self.available_types.first().copied();
        }
    }

    /// Rows matching the current filter, in table order.
    pub fn visible_rows(&self) -> Vec<ExecutionRow> {
        self.rows
            .iter()
            .filter(|r| r.matches(&self.query))
            .cloned()
            .collect()
    }

    /// Recompute rows when the type or sort criterion changed.
    fn refresh_rows(&mut self, data: &DashboardData, year: i32) {
        let Some(earmark_type) = self.selected_type else {
            self.rows.clear();
            self.cache_key = None;
            return;
        };
        let key = (earmark_type, self.criterion);
        if self.cache_key == Some(key) {
            return;
        }

        self.rows = match DataProcessor::execution_table(&data.frame, year, earmark_type, self.criterion)
        {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "failed to build execution table");
                Vec::new()
            }
        };
        self.cache_key = Some(key);
    }

    pub fn show(&mut self, ui: &mut egui::Ui, data: &DashboardData, year: i32) -> ExecutionTableAction {
        let mut action = ExecutionTableAction::None;

        ui.heading(format!("4. Execução orçamentária ({year})"));
        ui.add_space(5.0);
        egui::Frame::none()
            .fill(Color32::from_rgb(0xE8, 0xF1, 0xFB))
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new("Buscando algum programa específico? Tente filtrar pela lupa da tabela!")
                        .color(Color32::from_rgb(0x1B, 0x5D, 0xA3)),
                );
            });
        ui.add_space(8.0);

        if self.available_types.is_empty() {
            ui.label(RichText::new(format!("Sem emendas registradas em {year}.")).italics());
            return action;
        }

        let label_width = 160.0;
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Selecione o tipo de emenda:"));
            let selected = self.selected_type.map(EarmarkType::label).unwrap_or("");
            ComboBox::from_id_salt("execution_type")
                .width(300.0)
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for t in &self.available_types {
                        ui.selectable_value(&mut self.selected_type, Some(*t), t.label());
                    }
                });
        });
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Ordenar por:"));
            ComboBox::from_id_salt("execution_sort")
                .width(300.0)
                .selected_text(self.criterion.label())
                .show_ui(ui, |ui| {
                    for c in SortCriterion::ALL {
                        ui.selectable_value(&mut self.criterion, c, c.label());
                    }
                });
        });
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("🔍 Filtrar:"));
            ui.add(
                egui::TextEdit::singleline(&mut self.query)
                    .hint_text("código ou descrição da ação")
                    .desired_width(300.0),
            );
            if !self.query.is_empty() && ui.small_button("✖").clicked() {
                self.query.clear();
            }
        });

        self.refresh_rows(data, year);
        let rows = self.visible_rows();

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format!("{} de {} ações", rows.len(), self.rows.len()))
                    .size(11.0)
                    .color(Color32::GRAY),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add_enabled_ui(!rows.is_empty(), |ui| {
                    if ui.button("💾 Exportar CSV").clicked() {
                        action = ExecutionTableAction::ExportCsv;
                    }
                });
            });
        });
        ui.add_space(4.0);

        ScrollArea::both()
            .id_salt("execution_table_scroll")
            .max_height(TABLE_HEIGHT)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                egui::Grid::new("execution_table")
                    .num_columns(HEADERS.len())
                    .striped(true)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        for header in HEADERS {
                            ui.label(RichText::new(header).strong().size(12.0));
                        }
                        ui.end_row();

                        for row in &rows {
                            ui.add(egui::Label::new(RichText::new(&row.action).size(11.0)).truncate());
                            money_cell(ui, row.appropriated_mi());
                            money_cell(ui, row.committed_mi());
                            money_cell(ui, row.paid_mi());
                            pct_cell(ui, row.pct_committed);
                            pct_cell(ui, row.pct_paid);
                            ui.end_row();
                        }
                    });
            });

        action
    }
}

fn money_cell(ui: &mut egui::Ui, value: f64) {
    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
        ui.label(RichText::new(format_br(value, 2)).size(11.0).monospace());
    });
}

fn pct_cell(ui: &mut egui::Ui, pct: f64) {
    let text = block_bar(pct);
    let response = ui.label(RichText::new(text).size(12.0));
    if pct.is_finite() {
        response.on_hover_text(format!("{}%", format_br(pct, 1)));
    }
}

/// Actions triggered by the execution table
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionTableAction {
    None,
    ExportCsv,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(action: &str) -> ExecutionRow {
        ExecutionRow {
            action: action.to_string(),
            appropriated: 1.0,
            committed: 1.0,
            paid: 1.0,
            pct_committed: 100.0,
            pct_paid: 100.0,
        }
    }

    #[test]
    fn visible_rows_apply_query() {
        let mut table = ExecutionTable::new();
        table.rows = vec![row("0EC2 - Transferência Especial"), row("2000 - Saúde Básica")];

        assert_eq!(table.visible_rows().len(), 2);

        table.query = "SAÚDE".to_string();
        let visible = table.visible_rows();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].action, "2000 - Saúde Básica");

        table.query = "inexistente".to_string();
        assert!(table.visible_rows().is_empty());
    }
}
