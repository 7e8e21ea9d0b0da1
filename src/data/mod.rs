//! Data module - dataset fetching, derived fields and reshaping

pub mod classify;
mod format;
mod loader;
mod processor;
mod record;

pub use classify::EarmarkType;
pub use format::{block_bar, format_br};
pub use loader::DataLoader;
pub use processor::{
    DashboardData, DataProcessor, ExecutionRow, FunctionBar, ModalityBar, SortCriterion,
    TypeYearBar,
};
