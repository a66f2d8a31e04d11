use chrono::{Datelike, Days, NaiveDate};

use super::model::{AlignedRecord, DetectionRecord, PollutantReading, RegionAliasMap, TargetPoint};
use super::proximity;

// ---------------------------------------------------------------------------
// Record capabilities the filters work against
// ---------------------------------------------------------------------------

/// Anything with a calendar date.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// Anything with a point location in degrees.
pub trait Located {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
}

/// Anything keyed by an administrative region name.
pub trait Regional {
    fn region(&self) -> &str;
}

impl Dated for DetectionRecord {
    fn date(&self) -> NaiveDate {
        self.acquisition_date
    }
}

impl Located for DetectionRecord {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Dated for PollutantReading {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Regional for PollutantReading {
    fn region(&self) -> &str {
        &self.region
    }
}

impl Dated for AlignedRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Regional for AlignedRecord {
    fn region(&self) -> &str {
        &self.region
    }
}

// ---------------------------------------------------------------------------
// Temporal filters
// ---------------------------------------------------------------------------

/// Records acquired on `day`.
pub fn by_exact_day<T: Dated + Clone>(records: &[T], day: NaiveDate) -> Vec<T> {
    records.iter().filter(|r| r.date() == day).cloned().collect()
}

/// Inclusive bounds of the window `center ± radius_days`, saturating at
/// the calendar limits.
pub fn window_bounds(center: NaiveDate, radius_days: u32) -> (NaiveDate, NaiveDate) {
    let radius = Days::new(u64::from(radius_days));
    let start = center.checked_sub_days(radius).unwrap_or(NaiveDate::MIN);
    let end = center.checked_add_days(radius).unwrap_or(NaiveDate::MAX);
    (start, end)
}

/// Records dated within `[center - radius_days, center + radius_days]`.
pub fn by_window<T: Dated + Clone>(records: &[T], center: NaiveDate, radius_days: u32) -> Vec<T> {
    let (start, end) = window_bounds(center, radius_days);
    records
        .iter()
        .filter(|r| (start..=end).contains(&r.date()))
        .cloned()
        .collect()
}

/// Every calendar day of the window, in order.
pub fn window_days(center: NaiveDate, radius_days: u32) -> Vec<NaiveDate> {
    let (start, end) = window_bounds(center, radius_days);
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Records dated in the given month.
pub fn by_month<T: Dated + Clone>(records: &[T], year: i32, month: u32) -> Vec<T> {
    records
        .iter()
        .filter(|r| {
            let d = r.date();
            d.year() == year && d.month() == month
        })
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Spatial filters
// ---------------------------------------------------------------------------

/// Lower-left bound only: latitude ≥ `min_lat` and longitude ≥ `min_lon`.
/// NaN coordinates never pass.
pub fn bound<T: Located + Clone>(records: &[T], min_lat: f64, min_lon: f64) -> Vec<T> {
    records
        .iter()
        .filter(|r| r.latitude() >= min_lat && r.longitude() >= min_lon)
        .cloned()
        .collect()
}

/// Records within `max_distance_km` of at least one target.
pub fn near_targets<T: Located + Clone>(
    records: &[T],
    targets: &[TargetPoint],
    max_distance_km: f64,
) -> Vec<T> {
    records
        .iter()
        .filter(|r| proximity::is_near(r.latitude(), r.longitude(), targets, max_distance_km))
        .cloned()
        .collect()
}

/// Records whose alias-resolved region is one of `regions` (also resolved).
pub fn in_regions<T: Regional + Clone, S: AsRef<str>>(
    records: &[T],
    regions: &[S],
    aliases: &RegionAliasMap,
) -> Vec<T> {
    let wanted: Vec<&str> = regions.iter().map(|r| aliases.resolve(r.as_ref())).collect();
    records
        .iter()
        .filter(|r| {
            let region = aliases.resolve(r.region());
            wanted.iter().any(|w| *w == region)
        })
        .cloned()
        .collect()
}
