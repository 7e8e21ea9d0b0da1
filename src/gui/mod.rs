//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;
mod execution_table;

pub use app::EmendasApp;
pub use chart_viewer::ChartViewer;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use execution_table::{ExecutionTable, ExecutionTableAction};
