use chrono::NaiveDate;
use eframe::egui::{self, Align2, Color32, FontId, RichText, Sense, Ui};
use wildfire_aq::analysis::{AirQualityWindow, CorrelationView};
use wildfire_aq::data::model::Pollutant;
use wildfire_aq::data::stats::GroupSummary;
use wildfire_aq::Section;

use crate::color::diverging;

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "–".to_string(), |v| format!("{v:.4}"))
}

fn unavailable(ui: &mut Ui, section: &Section<impl Sized>) {
    if let Some(e) = section.error() {
        ui.label(RichText::new(e.to_string()).color(Color32::RED));
    }
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

pub fn summary_table(ui: &mut Ui, section: &Section<Vec<GroupSummary>>) {
    let Some(rows) = section.ready() else {
        unavailable(ui, section);
        return;
    };

    egui::Grid::new("summary_stats")
        .striped(true)
        .num_columns(9)
        .show(ui, |ui: &mut Ui| {
            for header in ["County", "count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
                ui.strong(header);
            }
            ui.end_row();

            for r in rows {
                ui.label(&r.region);
                ui.label(r.count.to_string());
                for v in [r.mean, r.std, r.min, r.q25, r.median, r.q75, r.max] {
                    ui.label(cell(v));
                }
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Raw readings
// ---------------------------------------------------------------------------

pub fn raw_table(ui: &mut Ui, window: &AirQualityWindow, pollutant: Pollutant) {
    let Some(section) = window.section(pollutant) else {
        ui.label(format!("No {pollutant} source configured."));
        return;
    };
    let Some(series) = section.ready() else {
        if section.is_empty() {
            ui.label(format!("No {pollutant} readings around {}.", window.center));
        }
        unavailable(ui, section);
        return;
    };

    let mut readings: Vec<_> = series.readings.iter().collect();
    readings.sort_by(|a, b| (a.date, &a.region).cmp(&(b.date, &b.region)));

    egui::ScrollArea::vertical()
        .id_salt("raw_readings")
        .max_height(240.0)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("raw_readings_grid")
                .striped(true)
                .num_columns(3)
                .show(ui, |ui: &mut Ui| {
                    ui.strong("Date");
                    ui.strong("County");
                    ui.strong(pollutant.label());
                    ui.end_row();
                    for r in readings {
                        ui.label(r.date.to_string());
                        ui.label(&r.region);
                        ui.label(format!("{:.4}", r.value));
                        ui.end_row();
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Correlation heat-map
// ---------------------------------------------------------------------------

const CELL_SIZE: egui::Vec2 = egui::vec2(84.0, 30.0);

pub fn correlation_grid(ui: &mut Ui, section: &Section<CorrelationView>, date: NaiveDate) {
    let view = match section {
        Section::Ready(view) => view,
        Section::Empty => {
            ui.label(format!("No air-quality readings on {date}."));
            return;
        }
        Section::Unavailable(e) => {
            ui.label(RichText::new(e.to_string()).color(Color32::RED));
            return;
        }
    };

    ui.strong(format!("Correlation of Pollutant Levels on {}", view.date));
    for (pollutant, e) in &view.missing {
        ui.label(RichText::new(format!("{pollutant} left out: {e}")).color(Color32::RED));
    }

    let matrix = &view.matrix;
    egui::Grid::new("correlation_grid")
        .spacing([2.0, 2.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for f in &matrix.fields {
                ui.strong(f.label());
            }
            ui.end_row();

            for (i, row_field) in matrix.fields.iter().enumerate() {
                ui.strong(row_field.label());
                for j in 0..matrix.size() {
                    let value = matrix.cells[i][j];
                    let (rect, response) = ui.allocate_exact_size(CELL_SIZE, Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, diverging(value));
                    ui.painter().text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}")),
                        FontId::proportional(13.0),
                        Color32::BLACK,
                    );
                    response.on_hover_text(format!("{} complete pairs", matrix.pair_counts[i][j]));
                }
                ui.end_row();
            }
        });

    ui.label(format!("{} merged county rows", view.aligned.len()));
}
