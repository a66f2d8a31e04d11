use std::path::PathBuf;

use chrono::NaiveDate;
use wildfire_aq::analysis::{
    air_quality_window, correlation_on, regional_detections, target_detections, AirQualityWindow,
    CorrelationView, DetectionView,
};
use wildfire_aq::data::model::Pollutant;
use wildfire_aq::{AnalysisConfig, AnalysisParams, LoadedData, Section};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AnalysisConfig,

    /// Every source, loaded once per data directory.
    pub data: LoadedData,

    /// Current selections from the side panel.
    pub params: AnalysisParams,

    /// Views for the current `params` (cached).
    pub regional: DetectionView,
    pub targets: DetectionView,
    pub window: AirQualityWindow,
    pub correlation: Section<CorrelationView>,

    /// One colour per target region for the pollutant charts.
    pub region_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AnalysisConfig) -> Self {
        let data = LoadedData::load(&config);
        let params = AnalysisParams::defaults_for(&config);
        let region_colors = ColorMap::new(&config.target_regions);

        let mut state = Self {
            regional: regional_detections(&data, &config, params.regional_date),
            targets: target_detections(&data, &config, params.target_date),
            window: air_quality_window(&data, &config, params.target_date),
            correlation: correlation_on(&data, &config, params.correlation_date),
            config,
            data,
            params,
            region_colors,
            status_message: None,
        };
        state.update_status();
        state
    }

    /// Point at another data directory and reload every source.
    pub fn set_data_dir(&mut self, dir: PathBuf) {
        log::info!("Switching data directory to {}", dir.display());
        self.config.data_dir = dir;
        self.reload();
    }

    pub fn reload(&mut self) {
        self.data = LoadedData::load(&self.config);
        self.recompute();
    }

    /// Rebuild every view from `params`.
    pub fn recompute(&mut self) {
        let p = self.params;
        self.regional = regional_detections(&self.data, &self.config, p.regional_date);
        self.targets = target_detections(&self.data, &self.config, p.target_date);
        self.window = air_quality_window(&self.data, &self.config, p.target_date);
        self.correlation = correlation_on(&self.data, &self.config, p.correlation_date);
        self.update_status();
    }

    fn update_status(&mut self) {
        let failed = self.data.detections.values().filter(|r| r.is_err()).count()
            + self.data.series.values().filter(|r| r.is_err()).count();
        self.status_message =
            (failed > 0).then(|| format!("{failed} source(s) unavailable, see log for details"));
    }

    pub fn set_regional_date(&mut self, date: NaiveDate) {
        let date = self.config.clamp_date(date);
        if date != self.params.regional_date {
            self.params.regional_date = date;
            self.regional = regional_detections(&self.data, &self.config, date);
        }
    }

    /// Day of the analysis month for the target map and air-quality window.
    pub fn set_target_day(&mut self, day: u32) {
        let date = self.config.day_in_month(day);
        if date != self.params.target_date {
            self.params.target_date = date;
            self.targets = target_detections(&self.data, &self.config, date);
            self.window = air_quality_window(&self.data, &self.config, date);
        }
    }

    pub fn set_correlation_day(&mut self, day: u32) {
        let date = self.config.day_in_month(day);
        if date != self.params.correlation_date {
            self.params.correlation_date = date;
            self.correlation = correlation_on(&self.data, &self.config, date);
        }
    }

    pub fn set_stats_pollutant(&mut self, pollutant: Pollutant) {
        self.params.stats_pollutant = pollutant;
    }

    pub fn set_raw_pollutant(&mut self, pollutant: Pollutant) {
        self.params.raw_pollutant = pollutant;
    }
}
