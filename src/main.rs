mod app;
mod batch;
mod canvas;
mod compositor;
mod error;
mod source_scan;
mod ui_theme;

use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 420.0])
            .with_min_inner_size([440.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "BorderCzar",
        options,
        Box::new(|_cc| {
            let app = app::BorderCzarApp::new()?;
            Ok(Box::new(app))
        }),
    )
}
