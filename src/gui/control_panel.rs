//! Control Panel Widget
//! Left side panel with the data source, refresh control and load progress.

use egui::{Color32, RichText};

/// Summary of the loaded dataset shown under the data source.
#[derive(Debug, Clone, Default)]
pub struct DatasetSummary {
    pub rows: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub loaded_on: String,
}

/// Left side control panel.
pub struct ControlPanel {
    pub endpoint: String,
    pub execution_year: i32,
    pub summary: Option<DatasetSummary>,
    pub progress: f32,
    pub status: String,
    pub refresh_enabled: bool,
}

impl ControlPanel {
    pub fn new(endpoint: &str, execution_year: i32) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            execution_year,
            summary: None,
            progress: 0.0,
            status: "Pronto".to_string(),
            refresh_enabled: true,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Emendas Parlamentares")
                    .size(20.0)
                    .color(Color32::from_rgb(0x1B, 0x5D, 0xA3)),
            );
            ui.label(
                RichText::new("em grandes números")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("🌐 Fonte de dados").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.add(egui::Label::new(RichText::new(&self.endpoint).size(11.0).monospace()).wrap());
                ui.add_space(4.0);

                match &self.summary {
                    Some(summary) => {
                        ui.label(RichText::new(format!("{} registros", summary.rows)).size(12.0));
                        if let (Some(first), Some(last)) = (summary.first_year, summary.last_year) {
                            ui.label(RichText::new(format!("Anos: {first}–{last}")).size(12.0));
                        }
                        ui.label(
                            RichText::new(format!("Carregado em {}", summary.loaded_on))
                                .size(11.0)
                                .color(Color32::GRAY),
                        );
                    }
                    None => {
                        ui.label(
                            RichText::new("Nenhum dado carregado")
                                .size(12.0)
                                .color(Color32::GRAY),
                        );
                    }
                }
            });

        ui.add_space(10.0);
        ui.label(
            RichText::new(format!("Execução orçamentária: {}", self.execution_year))
                .size(12.0),
        );

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.refresh_enabled, |ui| {
                let button = egui::Button::new(RichText::new("🔄 Atualizar dados").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Refresh;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("⏳ Progresso").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.starts_with("Erro") {
            Color32::from_rgb(220, 53, 69)
        } else if self.progress >= 100.0 {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.add(
            egui::Label::new(RichText::new(&self.status).size(11.0).color(status_color)).wrap(),
        );

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Refresh,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_ready_without_data() {
        let panel = ControlPanel::new("http://localhost/emendas", 2025);
        assert_eq!(panel.status, "Pronto");
        assert_eq!(panel.progress, 0.0);
        assert!(panel.summary.is_none());
        assert!(panel.refresh_enabled);
    }

    #[test]
    fn progress_updates_status() {
        let mut panel = ControlPanel::new("http://localhost/emendas", 2025);
        panel.set_progress(40.0, "Processando dados...");
        assert_eq!(panel.progress, 40.0);
        assert_eq!(panel.status, "Processando dados...");
    }
}
