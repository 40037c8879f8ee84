use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Plot, PlotPoints, Points};

use crate::data::Sample;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Scatter of a sequence against its index
// ---------------------------------------------------------------------------

/// `[index, value]` pairs for the present samples, optionally limited to `rows`.
fn indexed_points(values: &[Sample], rows: Option<&[usize]>) -> Vec<[f64; 2]> {
    match rows {
        Some(rows) => rows
            .iter()
            .filter_map(|&i| values.get(i).copied().flatten().map(|v| [i as f64, v]))
            .collect(),
        None => values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| [i as f64, v]))
            .collect(),
    }
}

fn points(name: &str, xy: Vec<[f64; 2]>, color: Color32, radius: f32) -> Points<'static> {
    let series: PlotPoints = xy.into_iter().collect();
    Points::new(series)
        .name(name)
        .color(color)
        .radius(radius)
}

/// Plain scatter used by the review window.
pub fn scatter(ui: &mut Ui, id: &str, label: &str, values: &[Sample]) {
    Plot::new(id)
        .legend(Legend::default())
        .x_axis_label("Index")
        .y_axis_label(label)
        .show(ui, |plot_ui| {
            plot_ui.points(points(label, indexed_points(values, None), Color32::LIGHT_BLUE, 1.5));
        });
}

// ---------------------------------------------------------------------------
// Series plot (central panel)
// ---------------------------------------------------------------------------

/// Render the selected column in the central panel.
pub fn series_plot(ui: &mut Ui, state: &AppState) {
    let (Some(column), Some(values)) = (state.column.as_deref(), state.displayed_sequence())
    else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to clean a series  (File → Open…)");
        });
        return;
    };

    if let Some(note) = state.annotation() {
        ui.label(note);
    }

    let flagged = state.flagged_points();

    Plot::new("series_plot")
        .legend(Legend::default())
        .x_axis_label("Index")
        .y_axis_label(column)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            match &state.color_map {
                Some(cm) => {
                    for (section, rows) in &state.sections {
                        let xy = indexed_points(&values, Some(rows));
                        plot_ui.points(points(&section.to_string(), xy, cm.color_for(section), 1.5));
                    }
                }
                None => {
                    plot_ui.points(points(
                        column,
                        indexed_points(&values, None),
                        Color32::LIGHT_BLUE,
                        1.5,
                    ));
                }
            }

            if !flagged.is_empty() {
                plot_ui.points(points("removed", flagged, Color32::RED, 2.5));
            }
        });
}
