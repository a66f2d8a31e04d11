use eframe::egui::{self, ScrollArea, Ui};
use wildfire_aq::AnalysisConfig;

use crate::state::AppState;
use crate::ui::{panels, plot, tables};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct WildfireApp {
    pub state: AppState,
}

impl WildfireApp {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for WildfireApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: dates and pollutant selection ----
        egui::SidePanel::left("parameter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: maps, charts, tables ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    let state = &self.state;

                    ui.heading(format!(
                        "Canada and US Wildfire Detections – {}",
                        state.config.analysis_year
                    ));
                    plot::detection_map(ui, "regional_map", &state.regional, &state.config.targets);
                    ui.separator();

                    ui.heading("Wildfire Detections near Target Locations");
                    plot::detection_map(ui, "target_map", &state.targets, &state.config.targets);
                    ui.separator();

                    ui.heading("Air Quality Analysis");
                    plot::pollutant_charts(ui, &state.window, &state.region_colors);
                    ui.add_space(8.0);
                    ui.strong(format!("Summary Statistics – {}", state.params.stats_pollutant));
                    tables::summary_table(ui, &state.window.summary(state.params.stats_pollutant));
                    ui.add_space(8.0);
                    ui.strong(format!("Raw Air Quality Data – {}", state.params.raw_pollutant));
                    tables::raw_table(ui, &state.window, state.params.raw_pollutant);
                    ui.separator();

                    ui.heading("Air Quality Correlation Analysis");
                    tables::correlation_grid(ui, &state.correlation, state.params.correlation_date);
                });
        });
    }
}
