//! Writes a synthetic `Data/` tree with the layout the viewer expects:
//! MODIS / VIIRS detection exports for Canada and the United States, a
//! Parquet copy of the combined VIIRS detections, and four EPA-style daily
//! pollutant tables.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;
use wildfire_aq::data::model::{Pollutant, Sensor, TargetPoint};
use wildfire_aq::AnalysisConfig;

#[derive(Parser, Debug)]
#[command(about = "Generate synthetic wildfire and air-quality data")]
struct Cli {
    /// Output directory.
    #[arg(long, default_value = "Data")]
    out: PathBuf,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Detections
// ---------------------------------------------------------------------------

struct Detection {
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
}

/// Rough bounding boxes (min lat, max lat, min lon, max lon).
const CANADA: (f64, f64, f64, f64) = (45.0, 60.0, -125.0, -62.0);
const UNITED_STATES: (f64, f64, f64, f64) = (27.0, 48.0, -122.0, -70.0);

/// Intensity of the Québec fire complex on a given day, peaking early June.
fn fire_activity(date: NaiveDate) -> f64 {
    let peak = NaiveDate::from_ymd_opt(2023, 6, 5).unwrap_or(date);
    let days = (date - peak).num_days() as f64;
    (-(days * days) / (2.0 * 12.0 * 12.0)).exp()
}

fn scattered(
    rng: &mut SimpleRng,
    date: NaiveDate,
    bbox: (f64, f64, f64, f64),
    n: usize,
) -> Vec<Detection> {
    let (lat0, lat1, lon0, lon1) = bbox;
    (0..n)
        .map(|_| Detection {
            date,
            latitude: rng.range(lat0, lat1),
            longitude: rng.range(lon0, lon1),
        })
        .collect()
}

fn clustered(
    rng: &mut SimpleRng,
    date: NaiveDate,
    targets: &[TargetPoint],
    n: usize,
) -> Vec<Detection> {
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let Some(t) = targets.get(i % targets.len().max(1)) else {
            break;
        };
        out.push(Detection {
            date,
            latitude: rng.gauss(t.latitude, 0.25),
            longitude: rng.gauss(t.longitude, 0.35),
        });
    }
    out
}

fn detections_for(
    rng: &mut SimpleRng,
    days: &[NaiveDate],
    targets: &[TargetPoint],
    canada: bool,
    density: f64,
) -> Vec<Detection> {
    let mut out = Vec::new();
    for &date in days {
        let background = (rng.range(2.0, 12.0) * density) as usize;
        if canada {
            out.extend(scattered(rng, date, CANADA, background));
            let near = (fire_activity(date) * 40.0 * density) as usize;
            out.extend(clustered(rng, date, targets, near));
        } else {
            out.extend(scattered(rng, date, UNITED_STATES, background));
        }
    }
    out
}

fn write_detection_csv(path: &Path, sensor: Sensor, rows: &[Detection]) -> Result<()> {
    let mut w =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    w.write_record(["latitude", "longitude", "acq_date", "instrument", "confidence"])?;
    for r in rows {
        w.write_record([
            format!("{:.5}", r.latitude),
            format!("{:.5}", r.longitude),
            r.date.format("%Y-%m-%d").to_string(),
            sensor.label().to_string(),
            "nominal".to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_detection_parquet(path: &Path, sensor: Sensor, rows: &[Detection]) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch date")?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("acq_date", DataType::Date32, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("instrument", DataType::Utf8, false),
    ]));

    let dates = Date32Array::from(
        rows.iter()
            .map(|r| (r.date - epoch).num_days() as i32)
            .collect::<Vec<_>>(),
    );
    let lats = Float64Array::from(rows.iter().map(|r| r.latitude).collect::<Vec<_>>());
    let lons = Float64Array::from(rows.iter().map(|r| r.longitude).collect::<Vec<_>>());
    let instrument = StringArray::from(vec![sensor.label(); rows.len()]);

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(dates), Arc::new(lats), Arc::new(lons), Arc::new(instrument)],
    )?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// EPA pollutant tables
// ---------------------------------------------------------------------------

/// County, state, and how strongly the Québec smoke reaches it.
/// "Shannon" is the pre-2015 name of Oglala Lakota and exercises aliasing.
const COUNTIES: [(&str, &str, f64); 7] = [
    ("New York", "New York", 1.0),
    ("Suffolk", "New York", 0.8),
    ("Philadelphia", "Pennsylvania", 0.7),
    ("District Of Columbia", "District Of Columbia", 0.5),
    ("Cook", "Illinois", 0.3),
    ("Los Angeles", "California", 0.0),
    ("Shannon", "South Dakota", 0.1),
];

/// (baseline, noise, smoke response) per pollutant.
fn pollutant_profile(pollutant: Pollutant) -> (f64, f64, f64) {
    match pollutant {
        Pollutant::Pm25 => (8.0, 2.0, 120.0),
        Pollutant::Co => (0.3, 0.05, 0.6),
        Pollutant::No2 => (20.0, 5.0, 10.0),
        Pollutant::Ozone => (0.040, 0.006, 0.015),
    }
}

fn write_pollutant_csv(
    path: &Path,
    pollutant: Pollutant,
    days: &[NaiveDate],
    rng: &mut SimpleRng,
) -> Result<usize> {
    let (baseline, noise, response) = pollutant_profile(pollutant);
    let mut w =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    w.write_record(["Date", "Site ID", pollutant.default_column(), "County", "State"])?;

    let mut rows = 0;
    for (site, &(county, state, exposure)) in COUNTIES.iter().enumerate() {
        for &date in days {
            // Stations skip a reading now and then.
            if rng.next_f64() < 0.05 {
                continue;
            }
            let smoke = fire_activity(date).powi(4) * exposure * response;
            let value = (rng.gauss(baseline, noise) + smoke).max(0.0);
            w.write_record([
                date.format("%m/%d/%Y").to_string(),
                format!("{:09}", 360_610_000 + site),
                format!("{value:.3}"),
                county.to_string(),
                state.to_string(),
            ])?;
            rows += 1;
        }
    }
    w.flush()?;
    Ok(rows)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);

    let layout = AnalysisConfig {
        data_dir: cli.out.clone(),
        ..AnalysisConfig::default()
    };

    let start = NaiveDate::from_ymd_opt(2023, 5, 1).context("start date")?;
    let days: Vec<NaiveDate> = start
        .iter_days()
        .take_while(|d| d.month() <= 7)
        .collect();

    for source in &layout.detections {
        let density = if source.sensor.is_primary() { 1.0 } else { 2.5 };
        let mut all = Vec::new();
        for file in &source.files {
            let path = layout.resolve(file);
            ensure_parent(&path)?;
            let canada = file.to_string_lossy().contains("Canada");
            let rows = detections_for(&mut rng, &days, &layout.targets, canada, density);
            write_detection_csv(&path, source.sensor, &rows)?;
            log::info!("Wrote {} {} detections to {}", rows.len(), source.sensor, path.display());
            all.extend(rows);
        }

        if source.sensor == Sensor::Viirs {
            let path = layout
                .resolve(Path::new("NASA wildfires"))
                .join("viirs-snpp_2023_combined.parquet");
            write_detection_parquet(&path, source.sensor, &all)?;
            log::info!("Wrote {} {} detections to {}", all.len(), source.sensor, path.display());
        }
    }

    for source in &layout.pollutants {
        let path = layout.resolve(&source.file);
        ensure_parent(&path)?;
        let rows = write_pollutant_csv(&path, source.pollutant, &days, &mut rng)?;
        log::info!("Wrote {rows} {} readings to {}", source.pollutant, path.display());
    }

    println!("Wrote synthetic data set to {}", cli.out.display());
    Ok(())
}
