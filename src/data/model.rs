use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sensor – which satellite instrument produced a detection
// ---------------------------------------------------------------------------

/// Satellite instrument of a detection table. MODIS is the primary sensor,
/// VIIRS the secondary one. The two tables are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensor {
    Modis,
    Viirs,
}

impl Sensor {
    pub const ALL: [Sensor; 2] = [Sensor::Modis, Sensor::Viirs];

    pub fn label(self) -> &'static str {
        match self {
            Sensor::Modis => "MODIS",
            Sensor::Viirs => "VIIRS",
        }
    }

    pub fn is_primary(self) -> bool {
        self == Sensor::Modis
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// DetectionRecord – one thermal anomaly
// ---------------------------------------------------------------------------

/// A single satellite-sensed thermal anomaly.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    /// Calendar date of acquisition (time-of-day dropped at load time).
    pub acquisition_date: NaiveDate,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    pub sensor: Sensor,
}

// ---------------------------------------------------------------------------
// TargetPoint – fixed reference location
// ---------------------------------------------------------------------------

/// A reference location detections are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl TargetPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

// ---------------------------------------------------------------------------
// Pollutant – the fixed set of measured substances
// ---------------------------------------------------------------------------

/// Pollutant kinds reported by the ground stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Pm25,
    Co,
    No2,
    Ozone,
}

impl Pollutant {
    pub const ALL: [Pollutant; 4] = [
        Pollutant::Pm25,
        Pollutant::Co,
        Pollutant::No2,
        Pollutant::Ozone,
    ];

    /// Canonical field name used once a series is loaded.
    pub fn label(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Co => "CO",
            Pollutant::No2 => "NO2",
            Pollutant::Ozone => "Ozone",
        }
    }

    /// Concentration column name in the EPA daily exports.
    pub fn default_column(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "Daily Mean PM2.5 Concentration",
            Pollutant::Co => "Daily Max 8-hour CO Concentration",
            Pollutant::No2 => "Daily Max 1-hour NO2 Concentration",
            Pollutant::Ozone => "Daily Max 8-hour Ozone Concentration",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Pollutant {
    type Err = String;

    /// Accepts the canonical label (`"PM2.5"`) or the config key (`"pm25"`),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '.')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "pm25" => Ok(Pollutant::Pm25),
            "co" => Ok(Pollutant::Co),
            "no2" => Ok(Pollutant::No2),
            "ozone" | "o3" => Ok(Pollutant::Ozone),
            _ => Err(format!("unknown pollutant '{s}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// PollutantSeries – one pollutant's readings across regions and days
// ---------------------------------------------------------------------------

/// A per-region, per-date concentration reading.
#[derive(Debug, Clone, PartialEq)]
pub struct PollutantReading {
    pub date: NaiveDate,
    /// County (or equivalent administrative unit) as written in the source.
    pub region: String,
    pub value: f64,
}

/// All readings of a single pollutant, loaded from one source.
#[derive(Debug, Clone, PartialEq)]
pub struct PollutantSeries {
    pub pollutant: Pollutant,
    pub readings: Vec<PollutantReading>,
}

impl PollutantSeries {
    pub fn new(pollutant: Pollutant, readings: Vec<PollutantReading>) -> Self {
        Self {
            pollutant,
            readings,
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Same pollutant, different readings. Used by the filters, which never
    /// touch the original series.
    pub fn with_readings(&self, readings: Vec<PollutantReading>) -> Self {
        Self {
            pollutant: self.pollutant,
            readings,
        }
    }
}

// ---------------------------------------------------------------------------
// AlignedRecord – one row of the merged multi-pollutant table
// ---------------------------------------------------------------------------

/// A (date, region) row of the outer-joined pollutant table.
/// A pollutant without a reading for this key is simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRecord {
    pub date: NaiveDate,
    pub region: String,
    values: BTreeMap<Pollutant, f64>,
}

impl AlignedRecord {
    pub fn new(date: NaiveDate, region: impl Into<String>) -> Self {
        Self {
            date,
            region: region.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, pollutant: Pollutant, value: f64) -> Self {
        self.set(pollutant, value);
        self
    }

    pub fn set(&mut self, pollutant: Pollutant, value: f64) {
        self.values.insert(pollutant, value);
    }

    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        self.values.get(&pollutant).copied()
    }

    /// Pollutants that have a value in this row.
    pub fn present(&self) -> impl Iterator<Item = Pollutant> + '_ {
        self.values.keys().copied()
    }
}

// ---------------------------------------------------------------------------
// RegionAliasMap – renamed administrative units across data vintages
// ---------------------------------------------------------------------------

/// Versioned table of historical region names and their current names.
///
/// Resolution trims surrounding whitespace and performs a single lookup;
/// names without an entry resolve to themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionAliasMap {
    version: String,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

impl RegionAliasMap {
    pub fn new<I, K, V>(version: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            version: version.into(),
            aliases: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// A table that maps every name to itself.
    pub fn identity() -> Self {
        Self::new("identity", Vec::<(String, String)>::new())
    }

    /// County renames between older and current EPA/Census vintages.
    ///
    /// Keys are bare county names without a state, so only names that are
    /// unique across states belong here. "Dade" (also GA, MO) and "Bedford"
    /// (also PA, TN, VA) are left out for that reason.
    pub fn epa_counties() -> Self {
        Self::new(
            "epa-counties-2023",
            [
                ("Shannon", "Oglala Lakota"),
                ("Wade Hampton", "Kusilvak"),
                ("Clifton Forge", "Alleghany"),
                ("District Of Columbia", "District of Columbia"),
            ],
        )
    }

    pub fn resolve<'a>(&'a self, region: &'a str) -> &'a str {
        let trimmed = region.trim();
        self.aliases
            .get(trimmed)
            .map(String::as_str)
            .unwrap_or(trimmed)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for RegionAliasMap {
    fn default() -> Self {
        Self::epa_counties()
    }
}
