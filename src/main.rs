use std::path::PathBuf;

use eframe::egui;
use rusty_sieve::app::SieveApp;
use rusty_sieve::data::{load_dataset, SheetSelector};
use rusty_sieve::state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional file to open on start-up.
    let mut state = AppState::default();
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        match load_dataset(&path, &SheetSelector::Default) {
            Ok(dataset) => state.set_dataset(path, dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Sieve – Outlier Filter",
        options,
        Box::new(|_cc| Ok(Box::new(SieveApp::with_state(state)))),
    )
}
