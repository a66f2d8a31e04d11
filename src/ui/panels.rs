use chrono::Datelike;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;
use wildfire_aq::data::model::{Pollutant, Sensor};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – analysis parameters
// ---------------------------------------------------------------------------

/// Render the left parameter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- US/Canada map date ----
            ui.heading("US/Canada Wildfire Analysis Date");
            let mut regional = state.params.regional_date;
            ui.add(DatePickerButton::new(&mut regional).id_salt("regional_date"));
            state.set_regional_date(regional);
            ui.separator();

            let last_day = state.config.days_in_month();

            // ---- Target map + air-quality window day ----
            ui.heading("Wildfire Analysis Date");
            let mut target_day = state.params.target_date.day();
            ui.add(egui::Slider::new(&mut target_day, 1..=last_day).text("day"));
            state.set_target_day(target_day);
            ui.label(state.params.target_date.to_string());
            ui.separator();

            // ---- Correlation day ----
            ui.heading("Air Quality Correlation Date");
            let mut correlation_day = state.params.correlation_date.day();
            ui.add(egui::Slider::new(&mut correlation_day, 1..=last_day).text("day"));
            state.set_correlation_day(correlation_day);
            ui.label(state.params.correlation_date.to_string());
            ui.separator();

            // ---- Pollutant selectors ----
            ui.strong("Summary statistics for");
            if let Some(p) = pollutant_combo(ui, "stats_pollutant", state.params.stats_pollutant) {
                state.set_stats_pollutant(p);
            }
            ui.strong("Raw data for");
            if let Some(p) = pollutant_combo(ui, "raw_pollutant", state.params.raw_pollutant) {
                state.set_raw_pollutant(p);
            }
            ui.separator();

            // ---- Source status ----
            ui.strong("Sources");
            for sensor in Sensor::ALL {
                if let Some(result) = state.data.detections.get(&sensor) {
                    let rows = result.as_ref().map(Vec::len).map_err(|e| e.to_string());
                    source_line(ui, sensor.label(), rows);
                }
            }
            for pollutant in Pollutant::ALL {
                if let Some(result) = state.data.series.get(&pollutant) {
                    let rows = result.as_ref().map(|s| s.len()).map_err(|e| e.to_string());
                    source_line(ui, pollutant.label(), rows);
                }
            }
        });
}

/// Returns the newly chosen pollutant, if the selection changed.
fn pollutant_combo(ui: &mut Ui, id: &str, current: Pollutant) -> Option<Pollutant> {
    let mut selected = current;
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.label())
        .show_ui(ui, |ui: &mut Ui| {
            for p in Pollutant::ALL {
                ui.selectable_value(&mut selected, p, p.label());
            }
        });
    (selected != current).then_some(selected)
}

fn source_line(ui: &mut Ui, name: &str, rows: Result<usize, String>) {
    match rows {
        Ok(n) => {
            ui.label(format!("{name}: {n} rows"));
        }
        Err(e) => {
            ui.label(RichText::new(format!("{name}: unavailable")).color(Color32::RED))
                .on_hover_text(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(format!("Data: {}", state.config.data_dir.display()));
        ui.separator();
        ui.label(format!(
            "MODIS {} / VIIRS {} near targets on {}",
            state.targets.count(Sensor::Modis),
            state.targets.count(Sensor::Viirs),
            state.params.target_date
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open wildfire / air-quality data folder")
        .set_directory(&state.config.data_dir)
        .pick_folder();

    if let Some(path) = folder {
        state.set_data_dir(path);
    }
}
