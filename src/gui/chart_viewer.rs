//! Chart Viewer Widget
//! Sections 1-3 of the dashboard: appropriation by type, by government
//! function and by application modality.

use crate::charts::{type_color, ChartPlotter};
use crate::config::LayoutConfig;
use crate::data::{DashboardData, EarmarkType};
use egui::{ComboBox, RichText};

const SECTION_SPACING: f32 = 20.0;

/// Chart sections with the state of their selectors.
#[derive(Default)]
pub struct ChartViewer {
    /// Earmark type shown in the function facets
    pub function_type: Option<EarmarkType>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the selection valid for a freshly loaded dataset.
    pub fn sync_selection(&mut self, available: &[EarmarkType]) {
        if !self.function_type.is_some_and(|t| available.contains(&t)) {
            self.function_type = available.first().copied();
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, data: &DashboardData, layout: &LayoutConfig) {
        // ===== 1. Earmark type =====
        ui.heading("1. Tipo de emenda parlamentar");
        ui.add_space(5.0);
        ui.label(
            RichText::new("Dotação atualizada (R$ bilhões) por tipo de emenda parlamentar")
                .size(14.0)
                .strong(),
        );
        ChartPlotter::draw_type_year_chart(ui, &data.by_type_year, &data.years, layout);

        ui.add_space(SECTION_SPACING);

        // ===== 2. Government function =====
        ui.heading("2. Função de governo");
        ui.add_space(5.0);
        self.sync_selection(&data.types);

        ui.horizontal(|ui| {
            ui.label("Selecione o tipo de emenda:");
            let selected = self.function_type.map(EarmarkType::label).unwrap_or("");
            ComboBox::from_id_salt("function_type")
                .width(300.0)
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for t in &data.types {
                        ui.selectable_value(&mut self.function_type, Some(*t), t.label());
                    }
                });
        });

        if let Some(earmark_type) = self.function_type {
            ui.add_space(5.0);
            ui.label(
                RichText::new(format!(
                    "Dotação atualizada (R$ milhões) por função de governo para as emendas {}",
                    earmark_type.label()
                ))
                .size(14.0)
                .strong()
                .color(type_color(earmark_type)),
            );
            let bars = data
                .by_function
                .get(&earmark_type)
                .map(Vec::as_slice)
                .unwrap_or_default();
            ChartPlotter::draw_function_facets(ui, bars, &data.years, earmark_type, layout);
        }

        ui.add_space(SECTION_SPACING);

        // ===== 3. Application modality =====
        ui.heading("3. Modalidade de Aplicação");
        ui.add_space(5.0);
        ui.label(
            RichText::new("Dotação atualizada (R$ milhões) por modalidade de aplicação")
                .size(14.0)
                .strong(),
        );
        ChartPlotter::draw_modality_facets(ui, &data.by_modality, layout);
    }
}
