use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::{load_dataset, save_dataset, SheetSelector, DEFAULT_SHEET};
use crate::present::review_note;
use crate::state::{AppState, StrategyKind, View};

// ---------------------------------------------------------------------------
// Left side panel – filter controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Outlier filter");
    ui.separator();

    let Some(dataset) = state.dataset() else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state below.
    let numeric = dataset.numeric_column_names();
    let columns = dataset.column_names();

    // ---- Column selector ----
    ui.strong("Column");
    let current = state.column.clone().unwrap_or_default();
    egui::ComboBox::from_id_salt("column")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for col in &numeric {
                if ui.selectable_label(current == *col, col).clicked() {
                    state.select_column(col.clone());
                }
            }
        });

    // ---- Colour-by selector ----
    ui.strong("Color by");
    let current_section = state.section_column.clone();
    egui::ComboBox::from_id_salt("color_by")
        .selected_text(current_section.as_deref().unwrap_or("none"))
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current_section.is_none(), "none").clicked() {
                state.set_section_column(None);
            }
            for col in &columns {
                if ui
                    .selectable_label(current_section.as_deref() == Some(col), col)
                    .clicked()
                {
                    state.set_section_column(Some(col.clone()));
                }
            }
        });
    ui.separator();

    // ---- Strategy and parameters ----
    ui.strong("Strategy");
    ui.radio_value(&mut state.form.kind, StrategyKind::RollingMean, "Moving average");
    ui.radio_value(&mut state.form.kind, StrategyKind::Neighbor, "Neighbors");

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Threshold");
        ui.add(
            egui::DragValue::new(&mut state.form.threshold)
                .speed(0.01)
                .range(0.0..=f64::MAX),
        );
    });
    if state.form.kind == StrategyKind::RollingMean {
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Window");
            ui.add(
                egui::DragValue::new(&mut state.form.window)
                    .speed(1.0)
                    .range(1..=usize::MAX),
            );
        });
    }
    ui.separator();

    // ---- Review actions ----
    let dirty = state.staged.as_ref().is_some_and(|s| s.is_dirty());
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Apply").clicked() {
            let result = state.apply_filter();
            state.report(result);
        }
        if ui.add_enabled(dirty, egui::Button::new("Save changes")).clicked() {
            let result = state.commit();
            state.report(result);
        }
        if ui.add_enabled(dirty, egui::Button::new("Discard")).clicked() {
            let result = state.discard();
            state.report(result);
        }
    });

    if let Some(working) = state.staged.as_ref().and_then(|s| s.working()) {
        ui.add_space(4.0);
        ui.label(RichText::new(format!("Pending: {}", working.column())).strong());
        ui.label(review_note(&working.summary));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let loaded = state.staged.is_some();
            if ui.add_enabled(loaded, egui::Button::new("Save as…")).clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
            ui.checkbox(&mut state.append_sheet, "Append as new sheet");
        });

        ui.separator();

        if let Some(ds) = state.dataset() {
            ui.label(format!("{} rows loaded", ds.len()));
        }

        ui.separator();

        for (view, label) in [
            (View::Source, "Source"),
            (View::Working, "Filtered"),
            (View::Committed, "Saved"),
        ] {
            if ui.selectable_label(state.view == view, label).clicked() {
                state.view = view;
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open measurement data")
        .add_filter(
            "Supported files",
            &["xlsx", "xlsm", "xls", "ods", "parquet", "pq", "json", "csv"],
        )
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match load_dataset(&path, &SheetSelector::Default) {
            Ok(dataset) => state.set_dataset(path, dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let Some(staged) = &state.staged else {
        return;
    };
    if staged.is_dirty() {
        log::warn!("Saving with an uncommitted result pending; only committed values are written");
    }

    let file = rfd::FileDialog::new()
        .set_title("Save cleaned data")
        .set_file_name("clean.xlsx")
        .add_filter("Excel workbook", &["xlsx"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = save_dataset(staged.export(), &path, DEFAULT_SHEET, state.save_policy()) {
            log::error!("Failed to save file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
