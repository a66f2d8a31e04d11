//! Analysis configuration.
//!
//! Every value has the default of the 2023 Québec fire season deployment,
//! so an empty (or absent) TOML file is a complete configuration:
//!
//! ```toml
//! data_dir = "Data"
//! max_distance_km = 75.0
//! target_regions = ["New York", "Suffolk"]
//!
//! [archive]
//! remote = "https://example.org/wildfire-aq-data.zip"
//!
//! [[targets]]
//! latitude = 48.8101
//! longitude = -76.3605
//! ```

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::data::fetch::ArchiveSource;
use crate::data::loader::{SeriesColumns, DETECTION_DATE_COLUMN};
use crate::data::model::{Pollutant, RegionAliasMap, Sensor, TargetPoint};
use crate::data::proximity::DEFAULT_MAX_DISTANCE_KM;
use crate::error::ConfigError;

/// Detection exports of one sensor, concatenated at load time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectionSource {
    pub sensor: Sensor,
    pub files: Vec<PathBuf>,
}

/// One pollutant table and the names of its columns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollutantSource {
    pub pollutant: Pollutant,
    pub file: PathBuf,
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default)]
    pub region_column: Option<String>,
    #[serde(default)]
    pub value_column: Option<String>,
}

impl PollutantSource {
    pub fn epa(pollutant: Pollutant, file: impl Into<PathBuf>) -> Self {
        Self {
            pollutant,
            file: file.into(),
            date_column: None,
            region_column: None,
            value_column: None,
        }
    }

    /// Column layout, falling back to the EPA export names.
    pub fn columns(&self) -> SeriesColumns<'_> {
        let epa = SeriesColumns::epa(self.pollutant);
        SeriesColumns {
            date: self.date_column.as_deref().unwrap_or(epa.date),
            region: self.region_column.as_deref().unwrap_or(epa.region),
            value: self.value_column.as_deref().unwrap_or(epa.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Root of the raw data; relative source paths are resolved against it.
    pub data_dir: PathBuf,
    /// Fetched into `data_dir` when that directory is missing.
    pub archive: Option<ArchiveSource>,
    pub detection_date_column: String,
    pub detections: Vec<DetectionSource>,
    pub pollutants: Vec<PollutantSource>,
    pub targets: Vec<TargetPoint>,
    pub aliases: RegionAliasMap,
    /// Counties shown in the air-quality window.
    pub target_regions: Vec<String>,
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_distance_km: f64,
    pub window_radius_days: u32,
    /// Year anchor dates are restricted to.
    pub analysis_year: i32,
    /// Month the correlation view is restricted to.
    pub analysis_month: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let wildfires = Path::new("NASA wildfires");
        let epa = Path::new("EPA");
        Self {
            data_dir: PathBuf::from("Data"),
            archive: None,
            detection_date_column: DETECTION_DATE_COLUMN.to_string(),
            detections: vec![
                DetectionSource {
                    sensor: Sensor::Modis,
                    files: vec![
                        wildfires.join("modis_2023_Canada.csv"),
                        wildfires.join("modis_2023_United_States.csv"),
                    ],
                },
                DetectionSource {
                    sensor: Sensor::Viirs,
                    files: vec![
                        wildfires.join("viirs-snpp_2023_Canada.csv"),
                        wildfires.join("viirs-snpp_2023_United_States.csv"),
                    ],
                },
            ],
            pollutants: vec![
                PollutantSource::epa(Pollutant::Pm25, epa.join("2.5/combined_2.5_data.csv")),
                PollutantSource::epa(Pollutant::Co, epa.join("CO/combined_co_data.csv")),
                PollutantSource::epa(Pollutant::No2, epa.join("NO2/combined_no2_data.csv")),
                PollutantSource::epa(Pollutant::Ozone, epa.join("Ozone/combined_ozone_data.csv")),
            ],
            targets: vec![
                TargetPoint::new(48.8101, -76.3605),
                TargetPoint::new(53.08228, -75.44976),
                TargetPoint::new(52.7008, -73.5289),
                TargetPoint::new(50.470, -74.259),
            ],
            aliases: RegionAliasMap::epa_counties(),
            target_regions: vec![
                "New York".to_string(),
                "Philadelphia".to_string(),
                "District of Columbia".to_string(),
                "Suffolk".to_string(),
            ],
            min_latitude: 25.0,
            min_longitude: -130.0,
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            window_radius_days: 3,
            analysis_year: 2023,
            analysis_month: 6,
        }
    }
}

impl AnalysisConfig {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.max_distance_km >= 0.0) {
            return invalid(format!("max_distance_km must be >= 0, got {}", self.max_distance_km));
        }
        if !(1..=12).contains(&self.analysis_month) {
            return invalid(format!("analysis_month must be 1-12, got {}", self.analysis_month));
        }
        if NaiveDate::from_ymd_opt(self.analysis_year, 1, 1).is_none() {
            return invalid(format!("analysis_year {} out of range", self.analysis_year));
        }
        for t in &self.targets {
            if !(t.latitude.abs() <= 90.0 && t.longitude.abs() <= 180.0) {
                return invalid(format!(
                    "target ({}, {}) is not a valid coordinate",
                    t.latitude, t.longitude
                ));
            }
        }
        for s in &self.detections {
            if s.files.is_empty() {
                return invalid(format!("{} detection source lists no files", s.sensor));
            }
        }
        Ok(())
    }

    /// Resolve a source path against `data_dir`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// First and last day of the analysis year.
    pub fn date_bounds(&self) -> (NaiveDate, NaiveDate) {
        let first = NaiveDate::from_ymd_opt(self.analysis_year, 1, 1).unwrap_or(NaiveDate::MIN);
        let last = NaiveDate::from_ymd_opt(self.analysis_year, 12, 31).unwrap_or(NaiveDate::MAX);
        (first, last)
    }

    /// Clamp an anchor date into the analysis year.
    pub fn clamp_date(&self, date: NaiveDate) -> NaiveDate {
        let (first, last) = self.date_bounds();
        date.clamp(first, last)
    }

    /// Day `day` of the analysis month, clamped to the month's length.
    pub fn day_in_month(&self, day: u32) -> NaiveDate {
        (1..=day.clamp(1, 31))
            .rev()
            .find_map(|d| NaiveDate::from_ymd_opt(self.analysis_year, self.analysis_month, d))
            .unwrap_or_else(|| self.date_bounds().0)
    }

    /// Number of days in the analysis month.
    pub fn days_in_month(&self) -> u32 {
        self.day_in_month(31).day()
    }

    /// Default anchor: the first of the analysis month.
    pub fn default_anchor(&self) -> NaiveDate {
        self.day_in_month(1)
    }

    pub fn source_for(&self, pollutant: Pollutant) -> Option<&PollutantSource> {
        self.pollutants.iter().find(|s| s.pollutant == pollutant)
    }
}
