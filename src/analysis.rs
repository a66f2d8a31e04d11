//! The analysis views built on top of the data layer.
//!
//! Sources are loaded once into [`LoadedData`], each independently, so a
//! missing VIIRS export does not hide the MODIS map and a broken CO table
//! does not hide the other pollutants. Every view below is a pure function
//! of the loaded data, the configuration and a few plain parameters.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::AnalysisConfig;
use crate::data::filter::{self, by_exact_day, by_month, by_window};
use crate::data::join::merge;
use crate::data::loader::{load_detection_files, load_pollutant_series};
use crate::data::model::{
    AlignedRecord, DetectionRecord, Pollutant, PollutantSeries, RegionAliasMap, Sensor,
};
use crate::data::stats::{correlate, describe, CorrelationMatrix, GroupSummary};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Section – outcome of one source in one view
// ---------------------------------------------------------------------------

/// What a view has to show for one source.
///
/// `Empty` is a normal outcome ("no data for this day") and must be told
/// apart from `Unavailable`, which means the source itself failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Ready(T),
    Empty,
    Unavailable(DataError),
}

impl<T> Section<T> {
    fn classify(value: T, is_empty: impl Fn(&T) -> bool) -> Self {
        if is_empty(&value) {
            Section::Empty
        } else {
            Section::Ready(value)
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Section::Empty)
    }

    pub fn error(&self) -> Option<&DataError> {
        match self {
            Section::Unavailable(e) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// LoadedData – every source, loaded independently
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub detections: BTreeMap<Sensor, Result<Vec<DetectionRecord>, DataError>>,
    pub series: BTreeMap<Pollutant, Result<PollutantSeries, DataError>>,
}

impl LoadedData {
    /// Load every configured source. Failures are recorded per source and
    /// never abort the others.
    pub fn load(config: &AnalysisConfig) -> Self {
        let mut data = LoadedData::default();

        for source in &config.detections {
            let paths: Vec<_> = source.files.iter().map(|p| config.resolve(p)).collect();
            let result = load_detection_files(&paths, source.sensor, &config.detection_date_column);
            if let Err(e) = &result {
                log::error!("{} detections unavailable: {e}", source.sensor);
            }
            data.detections.insert(source.sensor, result);
        }

        for source in &config.pollutants {
            let path = config.resolve(&source.file);
            let result = load_pollutant_series(&path, source.pollutant, &source.columns());
            if let Err(e) = &result {
                log::error!("{} readings unavailable: {e}", source.pollutant);
            }
            data.series.insert(source.pollutant, result);
        }

        data
    }

    fn detections_for(&self, sensor: Sensor) -> Result<&[DetectionRecord], DataError> {
        match self.detections.get(&sensor) {
            Some(Ok(records)) => Ok(records.as_slice()),
            Some(Err(e)) => Err(e.clone()),
            None => Err(not_configured(sensor.label())),
        }
    }

    fn series_for(&self, pollutant: Pollutant) -> Result<&PollutantSeries, DataError> {
        match self.series.get(&pollutant) {
            Some(Ok(series)) => Ok(series),
            Some(Err(e)) => Err(e.clone()),
            None => Err(not_configured(pollutant.label())),
        }
    }
}

fn not_configured(name: &str) -> DataError {
    DataError::unavailable(std::path::Path::new(name), "no source configured")
}

// ---------------------------------------------------------------------------
// Parameters handed over by the presentation layer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisParams {
    /// Anchor of the bounding-box detection map.
    pub regional_date: NaiveDate,
    /// Anchor of the target map and the air-quality window.
    pub target_date: NaiveDate,
    /// Day the pollutant correlation is computed for.
    pub correlation_date: NaiveDate,
    /// Pollutant whose summary statistics are shown.
    pub stats_pollutant: Pollutant,
    /// Pollutant whose raw readings are shown.
    pub raw_pollutant: Pollutant,
}

impl AnalysisParams {
    pub fn defaults_for(config: &AnalysisConfig) -> Self {
        let anchor = config.default_anchor();
        Self {
            regional_date: anchor,
            target_date: anchor,
            correlation_date: anchor,
            stats_pollutant: Pollutant::Pm25,
            raw_pollutant: Pollutant::Pm25,
        }
    }
}

// ---------------------------------------------------------------------------
// Detection maps
// ---------------------------------------------------------------------------

/// Detections per sensor for one day, ready for a point map.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionView {
    pub date: NaiveDate,
    pub sensors: Vec<(Sensor, Section<Vec<DetectionRecord>>)>,
}

impl DetectionView {
    pub fn count(&self, sensor: Sensor) -> usize {
        self.sensors
            .iter()
            .find(|(s, _)| *s == sensor)
            .and_then(|(_, section)| section.ready())
            .map_or(0, Vec::len)
    }

    /// No sensor has anything to show (failed sources included).
    pub fn is_empty(&self) -> bool {
        self.sensors.iter().all(|(_, s)| !s.is_ready())
    }
}

fn detection_view(
    data: &LoadedData,
    config: &AnalysisConfig,
    date: NaiveDate,
    spatial: impl Fn(&[DetectionRecord]) -> Vec<DetectionRecord>,
) -> DetectionView {
    let sensors = config
        .detections
        .iter()
        .map(|source| {
            let section = match data.detections_for(source.sensor) {
                Ok(records) => {
                    let on_day = by_exact_day(records, date);
                    let kept = spatial(&on_day);
                    log::debug!(
                        "{} on {date}: {} detections, {} after spatial filter",
                        source.sensor,
                        on_day.len(),
                        kept.len()
                    );
                    Section::classify(kept, Vec::is_empty)
                }
                Err(e) => Section::Unavailable(e),
            };
            (source.sensor, section)
        })
        .collect();

    DetectionView { date, sensors }
}

/// Detections on `date` inside the continental bounding filter.
pub fn regional_detections(
    data: &LoadedData,
    config: &AnalysisConfig,
    date: NaiveDate,
) -> DetectionView {
    detection_view(data, config, date, |records| {
        filter::bound(records, config.min_latitude, config.min_longitude)
    })
}

/// Detections on `date` within `max_distance_km` of a target.
pub fn target_detections(
    data: &LoadedData,
    config: &AnalysisConfig,
    date: NaiveDate,
) -> DetectionView {
    detection_view(data, config, date, |records| {
        filter::near_targets(records, &config.targets, config.max_distance_km)
    })
}

// ---------------------------------------------------------------------------
// Air-quality window
// ---------------------------------------------------------------------------

/// Readings of every pollutant in the target regions around an anchor day.
#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityWindow {
    pub center: NaiveDate,
    pub days: Vec<NaiveDate>,
    pub series: Vec<(Pollutant, Section<PollutantSeries>)>,
    regions: Vec<String>,
}

impl AirQualityWindow {
    pub fn section(&self, pollutant: Pollutant) -> Option<&Section<PollutantSeries>> {
        self.series
            .iter()
            .find(|(p, _)| *p == pollutant)
            .map(|(_, s)| s)
    }

    /// Per-region statistics of one pollutant inside the window. Target
    /// regions without readings still get a row (count 0).
    pub fn summary(&self, pollutant: Pollutant) -> Section<Vec<GroupSummary>> {
        let empty = PollutantSeries::new(pollutant, Vec::new());
        let series = match self.section(pollutant) {
            Some(Section::Ready(series)) => series,
            Some(Section::Empty) => &empty,
            Some(Section::Unavailable(e)) => return Section::Unavailable(e.clone()),
            None => return Section::Unavailable(not_configured(pollutant.label())),
        };
        // regions were resolved when the window was built
        let aligned = merge(std::slice::from_ref(series), &RegionAliasMap::identity());
        Section::Ready(describe(
            &aligned,
            pollutant,
            &self.regions,
            &RegionAliasMap::identity(),
        ))
    }
}

/// Readings within `center ± window_radius_days` for the target regions,
/// one independent section per pollutant. Region names are resolved
/// through the alias table.
pub fn air_quality_window(
    data: &LoadedData,
    config: &AnalysisConfig,
    center: NaiveDate,
) -> AirQualityWindow {
    let regions: Vec<String> = config
        .target_regions
        .iter()
        .map(|r| config.aliases.resolve(r).to_string())
        .collect();

    let series = config
        .pollutants
        .iter()
        .map(|source| {
            let section = match data.series_for(source.pollutant) {
                Ok(series) => {
                    let windowed = by_window(&series.readings, center, config.window_radius_days);
                    let mut readings = filter::in_regions(&windowed, &regions, &config.aliases);
                    for r in &mut readings {
                        r.region = config.aliases.resolve(&r.region).to_string();
                    }
                    Section::classify(series.with_readings(readings), PollutantSeries::is_empty)
                }
                Err(e) => Section::Unavailable(e),
            };
            (source.pollutant, section)
        })
        .collect();

    AirQualityWindow {
        center,
        days: filter::window_days(center, config.window_radius_days),
        series,
        regions,
    }
}

// ---------------------------------------------------------------------------
// Cross-pollutant correlation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationView {
    pub date: NaiveDate,
    /// Merged rows of the chosen day.
    pub aligned: Vec<AlignedRecord>,
    pub matrix: CorrelationMatrix,
    /// Pollutants left out because their source failed.
    pub missing: Vec<(Pollutant, DataError)>,
}

/// Merge every pollutant (restricted to the analysis month), keep `day`,
/// and correlate across regions.
///
/// Unavailable sources are skipped and listed in `missing`; their matrix
/// rows stay undefined. Only when every source failed is the whole view
/// unavailable.
pub fn correlation_on(
    data: &LoadedData,
    config: &AnalysisConfig,
    day: NaiveDate,
) -> Section<CorrelationView> {
    let mut available = Vec::new();
    let mut missing = Vec::new();

    for source in &config.pollutants {
        match data.series_for(source.pollutant) {
            Ok(series) => {
                let in_month =
                    by_month(&series.readings, config.analysis_year, config.analysis_month);
                available.push(series.with_readings(in_month));
            }
            Err(e) => missing.push((source.pollutant, e)),
        }
    }

    if available.is_empty() {
        return match missing.into_iter().next() {
            Some((_, e)) => Section::Unavailable(e),
            None => Section::Empty,
        };
    }

    let merged = merge(&available, &config.aliases);
    let aligned = by_exact_day(&merged, day);
    if aligned.is_empty() {
        log::warn!("No air-quality readings on {day}");
        return Section::Empty;
    }

    let fields: Vec<Pollutant> = config.pollutants.iter().map(|s| s.pollutant).collect();
    let matrix = correlate(&aligned, &fields);

    Section::Ready(CorrelationView {
        date: day,
        aligned,
        matrix,
        missing,
    })
}
