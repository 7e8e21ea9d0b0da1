//! Charts module - Appropriation chart rendering

mod plotter;

pub use plotter::{type_color, ChartPlotter};
