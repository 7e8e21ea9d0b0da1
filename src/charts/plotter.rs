//! Chart Plotter Module
//! Renders the three appropriation views with egui_plot: grouped bars by type
//! and year, small multiples by government function, and a year × type grid
//! by application modality.

use crate::config::LayoutConfig;
use crate::data::classify::{modality_rank, MODALITY_ORDER};
use crate::data::{EarmarkType, FunctionBar, ModalityBar, TypeYearBar};
use egui::{Align2, Color32, RichText};
use egui_plot::{Bar, BarChart, GridMark, Plot, PlotPoint, Text};
use std::collections::BTreeMap;

/// Earmark type palette, in `EarmarkType::ALL` order.
pub const TYPE_COLORS: [Color32; 4] = [
    Color32::from_rgb(0x1B, 0x5D, 0xA3), // Bancada
    Color32::from_rgb(0x77, 0xB5, 0xE5), // Comissão
    Color32::from_rgb(0xE6, 0x33, 0x2A), // Individual - finalidade definida
    Color32::from_rgb(0xFC, 0xA3, 0xA0), // Individual - Pix
];

/// Modality palette, in `MODALITY_ORDER` order.
pub const MODALITY_COLORS: [Color32; 8] = [
    Color32::from_rgb(0x45, 0x78, 0xB5),
    Color32::from_rgb(0x6B, 0xAA, 0xE1),
    Color32::from_rgb(0xBD, 0xBB, 0x45),
    Color32::from_rgb(0xE8, 0xE3, 0x79),
    Color32::from_rgb(0x93, 0x55, 0xD3),
    Color32::from_rgb(0x7E, 0xB3, 0x7E),
    Color32::from_rgb(0xA0, 0xB6, 0xC8),
    Color32::from_rgb(0x99, 0x99, 0x99),
];

/// Color for anything outside the fixed palettes.
pub const FALLBACK_COLOR: Color32 = Color32::from_rgb(0x33, 0x33, 0x33);

/// Share of a year slot covered by the grouped bars.
const GROUP_WIDTH: f64 = 0.84;
/// Headroom above the tallest bar for its value label.
const LABEL_HEADROOM: f64 = 1.18;

pub fn type_color(earmark_type: EarmarkType) -> Color32 {
    EarmarkType::ALL
        .iter()
        .position(|t| *t == earmark_type)
        .map(|i| TYPE_COLORS[i])
        .unwrap_or(FALLBACK_COLOR)
}

pub fn modality_color(modality: &str) -> Color32 {
    MODALITY_COLORS
        .get(modality_rank(modality))
        .copied()
        .unwrap_or(Color32::GRAY)
}

/// Center offsets of `n` bars sharing one slot of `slot_width`.
pub fn bar_offsets(n: usize, slot_width: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let width = slot_width / n as f64;
    let start = -slot_width / 2.0 + width / 2.0;
    (0..n).map(|i| start + i as f64 * width).collect()
}

/// Upper y bound shared by a set of facets.
pub fn shared_y_max<I: IntoIterator<Item = f64>>(amounts: I) -> f64 {
    let max = amounts.into_iter().fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * LABEL_HEADROOM
    } else {
        1.0
    }
}

/// Modalities present in the bars, in palette order (unknown ones last, alphabetical).
pub fn ordered_modalities(bars: &[ModalityBar]) -> Vec<String> {
    let mut modalities: Vec<String> = bars.iter().map(|b| b.modality.clone()).collect();
    modalities.sort_by(|a, b| modality_rank(a).cmp(&modality_rank(b)).then(a.cmp(b)));
    modalities.dedup();
    modalities
}

/// Legend entries for every earmark type, whether or not it has bars.
pub fn type_legend() -> Vec<(String, Color32)> {
    EarmarkType::ALL
        .iter()
        .map(|t| (t.label().to_string(), type_color(*t)))
        .collect()
}

/// Years with at least one modality cell, ascending.
pub fn modality_years(bars: &[ModalityBar]) -> Vec<i32> {
    let mut years: Vec<i32> = bars.iter().map(|b| b.year).collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Horizontal legend of colored squares, wrapping after `columns` entries.
    pub fn draw_legend(ui: &mut egui::Ui, title: &str, items: &[(String, Color32)], columns: usize) {
        ui.label(RichText::new(title).size(12.0).strong());
        for row in items.chunks(columns.max(1)) {
            ui.horizontal(|ui| {
                for (name, color) in row {
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, *color);
                    ui.label(RichText::new(name).size(9.5));
                    ui.add_space(10.0);
                }
            });
        }
    }

    /// Non-interactive bar plot over an index-based category axis, one
    /// labelled mark per category.
    fn show_category_plot<R>(
        ui: &mut egui::Ui,
        id: impl std::hash::Hash,
        size: egui::Vec2,
        y_max: f64,
        labels: Vec<String>,
        show_labels: bool,
        add_contents: impl FnOnce(&mut egui_plot::PlotUi) -> R,
    ) -> R {
        let n = labels.len();
        Plot::new(id)
            .width(size.x)
            .height(size.y)
            .show_axes([true, false])
            .show_grid(false)
            .show_x(false)
            .show_y(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .allow_double_click_reset(false)
            .include_y(0.0)
            .include_y(y_max)
            .include_x(-0.5)
            .include_x(n as f64 - 0.5)
            .x_grid_spacer(move |_input| {
                (0..n)
                    .map(|i| GridMark {
                        value: i as f64,
                        step_size: 1.0,
                    })
                    .collect()
            })
            .x_axis_formatter(move |mark, _range| {
                if !show_labels || (mark.value - mark.value.round()).abs() > 1e-6 {
                    return String::new();
                }
                let idx = mark.value.round();
                if idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .show(ui, add_contents)
            .inner
    }

    /// View 1: grouped bars, one slot per year, one bar per earmark type.
    pub fn draw_type_year_chart(
        ui: &mut egui::Ui,
        bars: &[TypeYearBar],
        years: &[i32],
        layout: &LayoutConfig,
    ) {
        let types: Vec<EarmarkType> = EarmarkType::ALL
            .into_iter()
            .filter(|t| bars.iter().any(|b| b.earmark_type == *t))
            .collect();

        Self::draw_legend(ui, "Tipo de Emenda", &type_legend(), 4);
        ui.add_space(6.0);

        let offsets = bar_offsets(types.len(), GROUP_WIDTH);
        let bar_width = GROUP_WIDTH / types.len().max(1) as f64;
        let y_max = shared_y_max(bars.iter().map(|b| b.amount));

        let min_width = years.len() as f32 * layout.step_chart1 * types.len().max(1) as f32;
        let width = ui.available_width().max(min_width);
        let year_labels: Vec<String> = years.iter().map(|y| y.to_string()).collect();
        let text_color = ui.visuals().text_color();

        Self::show_category_plot(
            ui,
            "type_year_chart",
            egui::vec2(width, layout.height_chart1),
            y_max,
            year_labels,
            true,
            |plot_ui| {
                for (type_idx, earmark_type) in types.iter().enumerate() {
                    let color = type_color(*earmark_type);
                    let mut chart_bars = Vec::new();

                    for bar in bars.iter().filter(|b| b.earmark_type == *earmark_type) {
                        let Some(slot) = years.iter().position(|y| *y == bar.year) else {
                            continue;
                        };
                        let x = slot as f64 + offsets[type_idx];
                        chart_bars.push(
                            Bar::new(x, bar.amount)
                                .width(bar_width * 0.95)
                                .fill(color)
                                .name(format!(
                                    "Ano: {}\nTipo: {}\nDotação: {}",
                                    bar.year,
                                    earmark_type.label(),
                                    bar.label
                                )),
                        );
                        plot_ui.text(
                            Text::new(
                                PlotPoint::new(x, bar.amount),
                                RichText::new(&bar.label).size(12.0),
                            )
                            .anchor(Align2::CENTER_BOTTOM)
                            .color(text_color),
                        );
                    }

                    plot_ui.bar_chart(
                        BarChart::new(chart_bars)
                            .color(color)
                            .name(earmark_type.label())
                            .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| bar.name.clone())),
                    );
                }
            },
        );
    }

    /// View 2: one small bar chart per government function, shared y scale.
    pub fn draw_function_facets(
        ui: &mut egui::Ui,
        bars: &[FunctionBar],
        years: &[i32],
        earmark_type: EarmarkType,
        layout: &LayoutConfig,
    ) {
        if bars.is_empty() {
            ui.label(RichText::new("Sem dotação para este tipo de emenda.").italics());
            return;
        }

        let mut by_function: BTreeMap<&str, Vec<&FunctionBar>> = BTreeMap::new();
        for bar in bars {
            by_function.entry(bar.function.as_str()).or_default().push(bar);
        }

        let color = type_color(earmark_type);
        let y_max = shared_y_max(bars.iter().map(|b| b.amount));
        let columns = layout.facet_columns.max(1);
        let spacing = ui.spacing().item_spacing.x;
        let facet_width = ((ui.available_width() - spacing * columns as f32) / columns as f32)
            .max(years.len() as f32 * layout.step_facet2);
        let year_labels: Vec<String> = years.iter().map(|y| y.to_string()).collect();
        let text_color = ui.visuals().text_color();

        egui::Grid::new(("function_facets", earmark_type))
            .num_columns(columns)
            .spacing([spacing, 12.0])
            .show(ui, |ui| {
                for (idx, (function, function_bars)) in by_function.iter().enumerate() {
                    ui.vertical(|ui| {
                        ui.set_width(facet_width);
                        ui.add(egui::Label::new(RichText::new(*function).strong().size(11.0)).truncate());

                        Self::show_category_plot(
                            ui,
                            ("function_facet", earmark_type, idx),
                            egui::vec2(facet_width, layout.height_facet2),
                            y_max,
                            year_labels.clone(),
                            true,
                            |plot_ui| {
                                let mut chart_bars = Vec::new();
                                for bar in function_bars {
                                    let Some(slot) = years.iter().position(|y| *y == bar.year) else {
                                        continue;
                                    };
                                    chart_bars.push(
                                        Bar::new(slot as f64, bar.amount)
                                            .width(0.8)
                                            .fill(color)
                                            .name(format!("Ano: {}\nDotação: {}", bar.year, bar.label)),
                                    );
                                    plot_ui.text(
                                        Text::new(
                                            PlotPoint::new(slot as f64, bar.amount),
                                            RichText::new(&bar.label).size(9.0),
                                        )
                                        .anchor(Align2::CENTER_BOTTOM)
                                        .color(text_color),
                                    );
                                }
                                plot_ui.bar_chart(
                                    BarChart::new(chart_bars)
                                        .color(color)
                                        .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| bar.name.clone())),
                                );
                            },
                        );
                    });

                    if (idx + 1) % columns == 0 {
                        ui.end_row();
                    }
                }
            });
    }

    /// View 3: rows are years, columns are earmark types, bars are modalities.
    pub fn draw_modality_facets(ui: &mut egui::Ui, bars: &[ModalityBar], layout: &LayoutConfig) {
        let years = modality_years(bars);
        let modalities = ordered_modalities(bars);
        let types: Vec<EarmarkType> = EarmarkType::ALL
            .into_iter()
            .filter(|t| bars.iter().any(|b| b.earmark_type == *t))
            .collect();
        if types.is_empty() {
            ui.label(RichText::new("Sem dados de modalidade.").italics());
            return;
        }

        let legend: Vec<(String, Color32)> = MODALITY_ORDER
            .iter()
            .map(|m| m.to_string())
            .chain(
                modalities
                    .iter()
                    .filter(|m| !MODALITY_ORDER.contains(&m.as_str()))
                    .cloned(),
            )
            .map(|m| {
                let color = modality_color(&m);
                (m, color)
            })
            .collect();
        Self::draw_legend(ui, "Modalidade de Aplicação", &legend, 4);
        ui.add_space(6.0);

        let y_max = shared_y_max(bars.iter().map(|b| b.amount));
        let spacing = ui.spacing().item_spacing.x;
        let year_col_width = 40.0;
        let cell_width = ((ui.available_width() - year_col_width - spacing * (types.len() + 1) as f32)
            / types.len() as f32)
            .max(modalities.len() as f32 * layout.step_facet3);
        let text_color = ui.visuals().text_color();

        egui::Grid::new("modality_facets")
            .num_columns(types.len() + 1)
            .spacing([spacing, 10.0])
            .show(ui, |ui| {
                ui.label("");
                for t in &types {
                    ui.vertical(|ui| {
                        ui.set_width(cell_width);
                        ui.add(egui::Label::new(RichText::new(t.label()).strong().size(11.0)).truncate());
                    });
                }
                ui.end_row();

                for year in &years {
                    ui.label(RichText::new(year.to_string()).strong());
                    for t in &types {
                        Self::show_category_plot(
                            ui,
                            ("modality_facet", *year, *t),
                            egui::vec2(cell_width, layout.height_facet3),
                            y_max,
                            modalities.clone(),
                            false,
                            |plot_ui| {
                                for bar in bars.iter().filter(|b| b.year == *year && b.earmark_type == *t) {
                                    let Some(slot) = modalities.iter().position(|m| *m == bar.modality)
                                    else {
                                        continue;
                                    };
                                    let color = modality_color(&bar.modality);
                                    let x = slot as f64;
                                    plot_ui.bar_chart(
                                        BarChart::new(vec![Bar::new(x, bar.amount)
                                            .width(0.8)
                                            .fill(color)
                                            .name(format!(
                                                "Ano: {}\nTipo: {}\nModalidade: {}\nDotação: {}",
                                                bar.year,
                                                bar.earmark_type.label(),
                                                bar.modality,
                                                bar.label
                                            ))])
                                        .color(color)
                                        .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| bar.name.clone())),
                                    );
                                    plot_ui.text(
                                        Text::new(
                                            PlotPoint::new(x, bar.amount),
                                            RichText::new(&bar.label).size(9.0),
                                        )
                                        .anchor(Align2::CENTER_BOTTOM)
                                        .color(text_color),
                                    );
                                }
                            },
                        );
                    }
                    ui.end_row();
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_centered_in_slot() {
        let offsets = bar_offsets(4, 0.8);
        assert_eq!(offsets.len(), 4);
        assert!((offsets[0] + 0.3).abs() < 1e-12);
        assert!((offsets[3] - 0.3).abs() < 1e-12);
        assert!((offsets.iter().sum::<f64>()).abs() < 1e-12);
        assert_eq!(bar_offsets(1, 0.8), vec![0.0]);
        assert!(bar_offsets(0, 0.8).is_empty());
    }

    #[test]
    fn y_max_leaves_room_for_labels() {
        assert_eq!(shared_y_max([0.0, 0.0]), 1.0);
        assert_eq!(shared_y_max(Vec::<f64>::new()), 1.0);
        assert!((shared_y_max([10.0, 50.0, 20.0]) - 59.0).abs() < 1e-9);
    }

    #[test]
    fn palettes_follow_display_order() {
        assert_eq!(type_color(EarmarkType::Bancada), Color32::from_rgb(0x1B, 0x5D, 0xA3));
        assert_eq!(
            type_color(EarmarkType::IndividualPix),
            Color32::from_rgb(0xFC, 0xA3, 0xA0)
        );
        assert_eq!(modality_color("Outras"), Color32::from_rgb(0xA0, 0xB6, 0xC8));
        assert_eq!(modality_color("Algo Novo"), Color32::GRAY);
    }

    #[test]
    fn modalities_ordered_by_palette_then_name() {
        let bar = |modality: &str| ModalityBar {
            year: 2024,
            earmark_type: EarmarkType::Bancada,
            modality: modality.to_string(),
            amount: 1.0,
            label: String::new(),
        };
        let bars = vec![
            bar("Zeta"),
            bar("A definir"),
            bar("Transf. Estados e DF"),
            bar("Alfa"),
            bar("A definir"),
        ];
        assert_eq!(
            ordered_modalities(&bars),
            vec!["Transf. Estados e DF", "A definir", "Alfa", "Zeta"]
        );
    }

    #[test]
    fn type_legend_lists_every_type_in_order() {
        let legend = type_legend();
        let names: Vec<&str> = legend.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Bancada",
                "Comissão",
                "Individual - finalidade definida",
                "Individual - transferência especial (Pix)",
            ]
        );
        assert_eq!(legend[3].1, TYPE_COLORS[3]);
    }

    #[test]
    fn modality_rows_come_from_cells() {
        let cell = |year: i32| ModalityBar {
            year,
            earmark_type: EarmarkType::Comissao,
            modality: "Outras".to_string(),
            amount: 1.0,
            label: String::new(),
        };
        let bars = vec![cell(2025), cell(2022), cell(2025)];
        assert_eq!(modality_years(&bars), vec![2022, 2025]);
        assert!(modality_years(&[]).is_empty());
    }
}
