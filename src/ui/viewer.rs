use anyhow::{anyhow, Result};
use eframe::egui;

use crate::data::Sample;
use crate::present::Presenter;
use crate::ui::plot;

// ---------------------------------------------------------------------------
// One-shot review window
// ---------------------------------------------------------------------------

struct SnapshotViewer {
    label: String,
    values: Vec<Sample>,
    note: Option<String>,
}

impl eframe::App for SnapshotViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(note) = &self.note {
                ui.label(note);
                ui.separator();
            }
            plot::scatter(ui, "snapshot_plot", &self.label, &self.values);
        });
    }
}

/// Presenter that opens a plot window and blocks until it is closed.
#[derive(Debug, Clone)]
pub struct PlotPresenter {
    pub size: [f32; 2],
}

impl Default for PlotPresenter {
    fn default() -> Self {
        Self { size: [900.0, 600.0] }
    }
}

impl Presenter for PlotPresenter {
    fn render(&mut self, sequence: &[Sample], label: &str, annotations: Option<&str>) -> Result<()> {
        let viewer = SnapshotViewer {
            label: label.to_string(),
            values: sequence.to_vec(),
            note: annotations.map(str::to_string),
        };
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default().with_inner_size(self.size),
            ..Default::default()
        };

        log::debug!("Opening review window for '{label}'");
        eframe::run_native(
            &format!("{label} data"),
            options,
            Box::new(|_cc| Ok(Box::new(viewer))),
        )
        .map_err(|e| anyhow!("rendering backend unavailable: {e}"))
    }
}
