//! Emendas Dashboard Main Application
//! Side control panel plus a scrollable page with the four views.

use crate::config::DashboardConfig;
use crate::data::{DashboardData, DataLoader, DataProcessor};
use crate::export::TableExporter;
use crate::gui::control_panel::DatasetSummary;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, ExecutionTable, ExecutionTableAction};
use egui::{Color32, RichText, SidePanel};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use tracing::{error, info};

const PACKAGE_URL: &str = "https://cran.r-project.org/web/packages/orcamentoBR/index.html";

/// Loading result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete(Box<DashboardData>),
    Error(String),
}

impl LoadResult {
    fn is_final(&self) -> bool {
        !matches!(self, LoadResult::Progress(..))
    }
}

/// Drain pending messages. A loader thread that went away without a final
/// message (it panicked) is reported as an error.
fn drain_results(rx: &Receiver<LoadResult>) -> Vec<LoadResult> {
    let mut results = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(result) => results.push(result),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                if !results.iter().any(LoadResult::is_final) {
                    results.push(LoadResult::Error(
                        "o carregamento foi interrompido".to_string(),
                    ));
                }
                break;
            }
        }
    }
    results
}

/// Main application window.
pub struct EmendasApp {
    config: DashboardConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    execution_table: ExecutionTable,
    data: Option<DashboardData>,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
    last_error: Option<String>,
}

impl EmendasApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(&config.endpoint, config.execution_year),
            chart_viewer: ChartViewer::new(),
            execution_table: ExecutionTable::new(),
            data: None,
            load_rx: None,
            is_loading: false,
            last_error: None,
            config,
        };
        app.start_loading();
        app
    }

    /// Fetch and reshape the dataset in a background thread.
    fn start_loading(&mut self) {
        if self.is_loading {
            return;
        }

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;
        self.last_error = None;
        self.control_panel.refresh_enabled = false;
        self.control_panel.set_progress(5.0, "Carregando dados...");

        let config = self.config.clone();
        thread::spawn(move || {
            Self::run_loading(tx, config);
        });
    }

    /// Run loading (called from background thread)
    fn run_loading(tx: Sender<LoadResult>, config: DashboardConfig) {
        let loader = match DataLoader::new(&config) {
            Ok(loader) => loader,
            Err(e) => {
                let _ = tx.send(LoadResult::Error(e.to_string()));
                return;
            }
        };
        let _ = tx.send(LoadResult::Progress(
            10.0,
            format!("Buscando dados em {}...", loader.endpoint()),
        ));

        let frame = match loader.load() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "dataset load failed");
                let _ = tx.send(LoadResult::Error(e.to_string()));
                return;
            }
        };

        let _ = tx.send(LoadResult::Progress(
            60.0,
            format!("Processando {} registros...", frame.height()),
        ));

        match DataProcessor::prepare(frame) {
            Ok(data) => {
                let _ = tx.send(LoadResult::Complete(Box::new(data)));
            }
            Err(e) => {
                error!(error = %e, "dataset reshaping failed");
                let _ = tx.send(LoadResult::Error(e.to_string()));
            }
        }
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            for result in drain_results(&rx) {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(data) => {
                        self.install_data(*data);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Erro: {}", error));
                        self.last_error = Some(error);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            } else {
                self.control_panel.refresh_enabled = true;
            }
        }
    }

    fn install_data(&mut self, data: DashboardData) {
        let summary = DatasetSummary {
            rows: data.frame.height(),
            first_year: data.years.first().copied(),
            last_year: data.years.last().copied(),
            loaded_on: data.loaded_at.format("%d/%m/%Y %H:%M").to_string(),
        };
        info!(rows = summary.rows, "dashboard ready");

        self.chart_viewer.sync_selection(&data.types);
        self.execution_table.reset(&data, self.config.execution_year);
        self.control_panel.summary = Some(summary);
        self.control_panel
            .set_progress(100.0, "Dados carregados com sucesso!");
        self.data = Some(data);
    }

    /// Handle CSV export of the execution table
    fn handle_export_csv(&mut self) {
        let Some(earmark_type) = self.execution_table.selected_type else {
            return;
        };
        let rows = self.execution_table.visible_rows();

        let output_path = match rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name(TableExporter::default_file_name(
                self.config.execution_year,
                earmark_type,
            ))
            .save_file()
        {
            Some(path) => path,
            None => return, // User cancelled
        };

        match TableExporter::export_csv(&rows, &output_path) {
            Ok(()) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!("Tabela exportada: {} ações", rows.len()),
                );
            }
            Err(e) => {
                error!(error = %e, "csv export failed");
                self.control_panel
                    .set_progress(0.0, &format!("Erro na exportação: {}", e));
            }
        }
    }

    fn page_title(&self) -> String {
        match self.data.as_ref().map(|d| (d.years.first(), d.years.last())) {
            Some((Some(first), Some(last))) => {
                format!("Emendas Parlamentares em grandes números ({first}–{last})")
            }
            _ => "Emendas Parlamentares em grandes números".to_string(),
        }
    }

    fn show_footer(ui: &mut egui::Ui, data: &DashboardData) {
        egui::Frame::none()
            .fill(Color32::from_rgb(0xFF, 0xF4, 0xD6))
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(format!(
                        "Última atualização em {}",
                        data.loaded_at.format("%d/%m/%Y")
                    ))
                    .color(Color32::from_rgb(0x8A, 0x6D, 0x00)),
                );
            });
        ui.add_space(10.0);
        ui.separator();
        ui.horizontal_wrapped(|ui| {
            ui.label("🔗 Este aplicativo utiliza os dados obtidos via pacote");
            ui.hyperlink_to(RichText::new("orcamentoBR").strong(), PACKAGE_URL);
            ui.label(".");
        });
        ui.label("📆 Os dados se referem ao dia anterior à atualização.");
    }
}

impl eframe::App for EmendasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    if self.control_panel.show(ui) == ControlPanelAction::Refresh {
                        self.start_loading();
                    }
                });
            });

        // Central panel - Dashboard page
        let mut table_action = ExecutionTableAction::None;
        let title = self.page_title();
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.set_max_width(self.config.layout.max_content_width);
                    ui.heading(RichText::new(title).size(26.0).strong());
                    ui.add_space(10.0);

                    if self.is_loading {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Carregando dados...");
                        });
                        ui.add_space(10.0);
                    }

                    if let Some(error) = &self.last_error {
                        ui.label(
                            RichText::new(format!("Não foi possível carregar os dados: {error}"))
                                .color(Color32::from_rgb(220, 53, 69)),
                        );
                        ui.add_space(10.0);
                    }

                    let Some(data) = &self.data else {
                        return;
                    };

                    self.chart_viewer.show(ui, data, &self.config.layout);
                    ui.add_space(20.0);
                    table_action =
                        self.execution_table
                            .show(ui, data, self.config.execution_year);
                    ui.add_space(20.0);
                    Self::show_footer(ui, data);
                });
        });

        if table_action == ExecutionTableAction::ExportCsv {
            self.handle_export_csv();
        }
    }
}
