use chrono::{Datelike, NaiveDate};
use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, Points, VLine};
use wildfire_aq::analysis::{AirQualityWindow, DetectionView};
use wildfire_aq::data::model::{Pollutant, PollutantSeries, TargetPoint};
use wildfire_aq::Section;

use crate::color::{sensor_color, ColorMap};

// ---------------------------------------------------------------------------
// Detection maps
// ---------------------------------------------------------------------------

/// Scatter of the detections of each sensor with the targets overlaid.
pub fn detection_map(ui: &mut Ui, id: &str, view: &DetectionView, targets: &[TargetPoint]) {
    if view.is_empty() {
        ui.label(format!("No wildfire data recorded for these locations on {}.", view.date));
    }

    Plot::new(id)
        .legend(Legend::default())
        .height(380.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (sensor, section) in &view.sensors {
                let Some(records) = section.ready() else {
                    continue;
                };
                let points: PlotPoints = records
                    .iter()
                    .map(|r| [r.longitude, r.latitude])
                    .collect();
                plot_ui.points(
                    Points::new(points)
                        .name(sensor.label())
                        .color(sensor_color(*sensor).gamma_multiply(0.5))
                        .radius(2.0),
                );
            }

            let target_points: PlotPoints =
                targets.iter().map(|t| [t.longitude, t.latitude]).collect();
            plot_ui.points(
                Points::new(target_points)
                    .name("Target Location")
                    .shape(MarkerShape::Asterisk)
                    .color(Color32::RED)
                    .radius(7.0),
            );
        });

    ui.horizontal(|ui: &mut Ui| {
        for (sensor, section) in &view.sensors {
            match section {
                Section::Ready(records) => {
                    ui.label(format!("Number of {sensor} detections: {}", records.len()));
                }
                Section::Empty => {
                    ui.label(format!("Number of {sensor} detections: 0"));
                }
                Section::Unavailable(e) => {
                    ui.label(RichText::new(format!("{sensor} unavailable")).color(Color32::RED))
                        .on_hover_text(e.to_string());
                }
            }
            ui.separator();
        }
    });
}

// ---------------------------------------------------------------------------
// Pollutant line charts
// ---------------------------------------------------------------------------

fn day_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn x_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

/// One line chart per pollutant, one line per region, with the anchor day
/// marked.
pub fn pollutant_charts(ui: &mut Ui, window: &AirQualityWindow, colors: &ColorMap) {
    let width = (ui.available_width() / 2.0 - 8.0).max(200.0);

    for pair in window.series.chunks(2) {
        ui.horizontal(|ui: &mut Ui| {
            for (pollutant, section) in pair {
                ui.vertical(|ui: &mut Ui| {
                    ui.set_width(width);
                    ui.strong(format!("{pollutant} Levels"));
                    pollutant_chart(ui, window, *pollutant, section, colors);
                });
            }
        });
    }
}

fn pollutant_chart(
    ui: &mut Ui,
    window: &AirQualityWindow,
    pollutant: Pollutant,
    section: &Section<PollutantSeries>,
    colors: &ColorMap,
) {
    match section {
        Section::Empty => {
            ui.label(format!("No {pollutant} readings around {}.", window.center));
        }
        Section::Unavailable(e) => {
            ui.label(RichText::new(e.to_string()).color(Color32::RED));
        }
        Section::Ready(_) => {}
    }

    let center = day_x(window.center);
    let (x_min, x_max) = match (window.days.first(), window.days.last()) {
        (Some(first), Some(last)) => (day_x(*first), day_x(*last)),
        _ => (center, center),
    };

    Plot::new(("pollutant_chart", pollutant))
        .legend(Legend::default())
        .height(240.0)
        .include_x(x_min)
        .include_x(x_max)
        .x_axis_label("Date")
        .y_axis_label("Concentration")
        .x_axis_formatter(|mark, _range| x_label(mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            if let Some(series) = section.ready() {
                let mut regions: Vec<&str> =
                    series.readings.iter().map(|r| r.region.as_str()).collect();
                regions.sort_unstable();
                regions.dedup();

                for region in regions {
                    let mut points: Vec<[f64; 2]> = series
                        .readings
                        .iter()
                        .filter(|r| r.region == region)
                        .map(|r| [day_x(r.date), r.value])
                        .collect();
                    points.sort_by(|a, b| a[0].total_cmp(&b[0]));

                    let color = colors.color_for(region);
                    plot_ui.line(
                        Line::new(PlotPoints::from(points.clone()))
                            .name(region)
                            .color(color)
                            .width(1.5),
                    );
                    plot_ui.points(Points::new(PlotPoints::from(points)).color(color).radius(2.5));
                }
            }
            plot_ui.vline(VLine::new(center).name("Selected Date").color(Color32::RED));
        });
}
