//! End-to-end runs over small on-disk data sets.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use wildfire_aq::analysis::{
    air_quality_window, correlation_on, regional_detections, target_detections,
};
use wildfire_aq::config::{DetectionSource, PollutantSource};
use wildfire_aq::data::fetch::{ensure_dataset, ArchiveSource, FetchOutcome};
use wildfire_aq::data::model::{Pollutant, Sensor};
use wildfire_aq::{AnalysisConfig, DataError, LoadedData};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wildfire-aq-it-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, rel: &str, body: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, m, d).unwrap()
}

const MODIS_CANADA: &str = "\
latitude,longitude,acq_date,confidence
48.8101,-76.3605,2023-06-01,80
48.9000,-76.3000,2023-06-01,75
55.0000,-100.0000,2023-06-01,60
48.8101,-76.3605,2023-06-02,90
";

const MODIS_US: &str = "\
latitude,longitude,acq_date,confidence
10.0,10.0,2023-06-01,50
40.7,-74.0,2023-06-01,55
";

fn epa_table(pollutant: Pollutant, rows: &[(&str, &str, f64)]) -> String {
    let mut out = format!("Date,Site ID,{},County,State\n", pollutant.default_column());
    for (date, county, value) in rows {
        out.push_str(&format!("{date},1,{value},{county},X\n"));
    }
    out
}

/// A data set where VIIRS and ozone are missing on disk.
fn write_partial_data_set(dir: &Path) {
    write(dir, "NASA wildfires/modis_2023_Canada.csv", MODIS_CANADA);
    write(dir, "NASA wildfires/modis_2023_United_States.csv", MODIS_US);

    write(
        dir,
        "EPA/2.5/combined_2.5_data.csv",
        &epa_table(
            Pollutant::Pm25,
            &[
                ("06/01/2023", "New York", 20.0),
                ("06/01/2023", "Suffolk", 10.0),
                ("06/01/2023", "District Of Columbia", 15.0),
                ("06/03/2023", "New York", 60.0),
                ("06/07/2023", "New York", 95.0),
            ],
        ),
    );
    write(
        dir,
        "EPA/CO/combined_co_data.csv",
        &epa_table(
            Pollutant::Co,
            &[
                ("06/01/2023", "New York", 0.4),
                ("06/01/2023", "Suffolk", 0.2),
                ("06/01/2023", "District of Columbia", 0.3),
            ],
        ),
    );
    write(
        dir,
        "EPA/NO2/combined_no2_data.csv",
        &epa_table(Pollutant::No2, &[("06/20/2023", "Cook", 30.0)]),
    );
}

fn config_for(dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        data_dir: dir.to_path_buf(),
        ..AnalysisConfig::default()
    }
}

#[test]
fn shipped_config_file_matches_defaults() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/wildfire-aq.toml");
    let config = AnalysisConfig::load(&path).expect("load shipped config");
    assert_eq!(config, AnalysisConfig::default());
}

#[test]
fn missing_sources_are_isolated() {
    let dir = scratch_dir("isolated");
    write_partial_data_set(&dir);
    let config = config_for(&dir);

    let data = LoadedData::load(&config);

    let modis = data.detections[&Sensor::Modis].as_ref().unwrap();
    assert_eq!(modis.len(), 6);
    assert!(matches!(
        data.detections[&Sensor::Viirs],
        Err(DataError::DataUnavailable { .. })
    ));
    assert!(data.series[&Pollutant::Pm25].is_ok());
    assert!(matches!(
        data.series[&Pollutant::Ozone],
        Err(DataError::DataUnavailable { .. })
    ));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn detection_maps_from_disk() {
    let dir = scratch_dir("maps");
    write_partial_data_set(&dir);
    let config = config_for(&dir);
    let data = LoadedData::load(&config);

    // (10, 10) falls outside the bounding filter.
    let regional = regional_detections(&data, &config, date(6, 1));
    assert_eq!(regional.count(Sensor::Modis), 4);

    // The exact target and one ~10 km away; (55, -100) and New York are far.
    let near = target_detections(&data, &config, date(6, 1));
    assert_eq!(near.count(Sensor::Modis), 2);
    assert_eq!(near.count(Sensor::Viirs), 0);
    assert!(near
        .sensors
        .iter()
        .any(|(s, section)| *s == Sensor::Viirs && section.error().is_some()));

    let quiet = target_detections(&data, &config, date(6, 15));
    assert!(quiet.is_empty());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn air_quality_window_from_disk() {
    let dir = scratch_dir("window");
    write_partial_data_set(&dir);
    let config = config_for(&dir);
    let data = LoadedData::load(&config);

    let window = air_quality_window(&data, &config, date(6, 4));
    assert_eq!(window.days.first(), Some(&date(6, 1)));
    assert_eq!(window.days.last(), Some(&date(6, 7)));

    let pm = window.section(Pollutant::Pm25).unwrap().ready().unwrap();
    assert_eq!(pm.len(), 5);
    // Historical spelling resolved to the current one.
    assert!(pm.readings.iter().any(|r| r.region == "District of Columbia"));

    // Cook is outside the target regions and the window.
    assert!(window.section(Pollutant::No2).unwrap().is_empty());
    assert!(window.section(Pollutant::Ozone).unwrap().error().is_some());

    let summary = window.summary(Pollutant::Pm25);
    let rows = summary.ready().unwrap();
    let row = |name: &str| rows.iter().find(|r| r.region == name).unwrap();
    assert_eq!(row("New York").count, 3);
    assert_eq!(row("New York").max, Some(95.0));
    assert_eq!(row("Philadelphia").count, 0);
    assert_eq!(row("Philadelphia").mean, None);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn correlation_from_disk() {
    let dir = scratch_dir("correlation");
    write_partial_data_set(&dir);
    let config = config_for(&dir);
    let data = LoadedData::load(&config);

    let section = correlation_on(&data, &config, date(6, 1));
    let view = section.ready().unwrap();

    assert_eq!(view.aligned.len(), 3);
    assert!(view
        .aligned
        .iter()
        .all(|r| r.get(Pollutant::Pm25).is_some() && r.get(Pollutant::Co).is_some()));

    let r = view.matrix.get(Pollutant::Pm25, Pollutant::Co).unwrap();
    assert!((r - view.matrix.get(Pollutant::Co, Pollutant::Pm25).unwrap()).abs() < 1e-12);
    assert!(r > 0.9);
    assert_eq!(view.matrix.get(Pollutant::Pm25, Pollutant::No2), None);
    assert_eq!(view.missing.len(), 1);

    assert!(correlation_on(&data, &config, date(6, 30)).is_empty());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn schema_errors_name_the_column() {
    let dir = scratch_dir("schema");
    write(&dir, "modis.csv", "lat,lon,acq_date\n1,2,2023-06-01\n");
    write(&dir, "pm.csv", "Date,County,PM\n06/01/2023,Suffolk,not-a-number\n");

    let config = AnalysisConfig {
        data_dir: dir.clone(),
        detections: vec![DetectionSource {
            sensor: Sensor::Modis,
            files: vec![PathBuf::from("modis.csv")],
        }],
        pollutants: vec![PollutantSource {
            value_column: Some("PM".to_string()),
            ..PollutantSource::epa(Pollutant::Pm25, "pm.csv")
        }],
        ..AnalysisConfig::default()
    };
    let data = LoadedData::load(&config);

    match &data.detections[&Sensor::Modis] {
        Err(DataError::Schema { message, .. }) => assert!(message.contains("latitude")),
        other => panic!("expected schema error, got {other:?}"),
    }
    match &data.series[&Pollutant::Pm25] {
        Err(DataError::Schema { message, .. }) => assert!(message.contains("PM")),
        other => panic!("expected schema error, got {other:?}"),
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn fetched_archive_feeds_the_loader() {
    let dir = scratch_dir("fetch");
    let archive = dir.join("data.zip");
    {
        let file = fs::File::create(&archive).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        zip.start_file("NASA wildfires/modis_2023_Canada.csv", options).unwrap();
        zip.write_all(MODIS_CANADA.as_bytes()).unwrap();
        zip.start_file("NASA wildfires/modis_2023_United_States.csv", options).unwrap();
        zip.write_all(MODIS_US.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    let data_dir = dir.join("Data");
    let source = ArchiveSource::Local(archive);
    let outcome = ensure_dataset(&source, &data_dir).unwrap();
    assert_eq!(outcome, FetchOutcome::Extracted { entries: 2 });
    assert_eq!(ensure_dataset(&source, &data_dir).unwrap(), FetchOutcome::AlreadyPresent);

    let config = config_for(&data_dir);
    let data = LoadedData::load(&config);
    assert_eq!(data.detections[&Sensor::Modis].as_ref().unwrap().len(), 6);

    let _ = fs::remove_dir_all(&dir);
}
