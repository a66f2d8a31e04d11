use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{DetectionRecord, Pollutant, PollutantReading, PollutantSeries, Sensor};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Cell / RawTable – untyped, record-oriented view of any source file
// ---------------------------------------------------------------------------

/// A single cell as it came out of the file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Null,
}

/// Rows of cells with named columns. Every row has `columns.len()` cells.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub path: PathBuf,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Index of a required column, or a schema error naming it.
    pub fn column_index(&self, name: &str) -> Result<usize, DataError> {
        self.columns
            .iter()
            .position(|c| c.trim() == name)
            .ok_or_else(|| {
                DataError::schema(
                    &self.path,
                    format!("missing column '{name}' (found {:?})", self.columns),
                )
            })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Default acquisition-date column of the FIRMS detection exports.
pub const DETECTION_DATE_COLUMN: &str = "acq_date";

/// Column names of a pollutant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesColumns<'a> {
    pub date: &'a str,
    pub region: &'a str,
    pub value: &'a str,
}

impl SeriesColumns<'static> {
    /// Layout of the EPA daily exports for `pollutant`.
    pub fn epa(pollutant: Pollutant) -> Self {
        Self {
            date: "Date",
            region: "County",
            value: pollutant.default_column(),
        }
    }
}

/// Read a tabular file into a [`RawTable`].  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one observation per line
/// * `.parquet` – any flat schema (`.pq` also accepted)
/// * `.json`    – `[{ "column": value, ... }, ...]` (records orientation)
pub fn read_table(path: &Path) -> Result<RawTable, DataError> {
    if !path.is_file() {
        return Err(DataError::unavailable(path, "file not found"));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        "csv" => read_csv(path)?,
        other => {
            return Err(DataError::schema(
                path,
                format!("unsupported file extension: .{other}"),
            ))
        }
    };

    log::info!(
        "Read {} rows with columns {:?} from {}",
        table.len(),
        table.columns,
        path.display()
    );
    Ok(table)
}

/// Load one detection export. `date_column` names the acquisition date.
pub fn load_detections(
    path: &Path,
    sensor: Sensor,
    date_column: &str,
) -> Result<Vec<DetectionRecord>, DataError> {
    let table = read_table(path)?;
    let date_idx = table.column_index(date_column)?;
    let lat_idx = table.column_index("latitude")?;
    let lon_idx = table.column_index("longitude")?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(row_no, row)| {
            let acquisition_date = cell_date(&row[date_idx])
                .map_err(|e| row_error(path, row_no, date_column, e))?;
            let latitude =
                cell_f64(&row[lat_idx]).map_err(|e| row_error(path, row_no, "latitude", e))?;
            let longitude =
                cell_f64(&row[lon_idx]).map_err(|e| row_error(path, row_no, "longitude", e))?;
            Ok(DetectionRecord {
                acquisition_date,
                latitude,
                longitude,
                sensor,
            })
        })
        .collect()
}

/// Load and concatenate several exports of the same sensor (e.g. one per
/// country). The first failing file fails the whole source.
pub fn load_detection_files(
    paths: &[PathBuf],
    sensor: Sensor,
    date_column: &str,
) -> Result<Vec<DetectionRecord>, DataError> {
    let mut all = Vec::new();
    for path in paths {
        let mut records = load_detections(path, sensor, date_column)?;
        all.append(&mut records);
    }
    log::info!("Loaded {} {sensor} detections from {} file(s)", all.len(), paths.len());
    Ok(all)
}

/// Load one pollutant table, renaming its concentration column to the
/// canonical pollutant.
pub fn load_pollutant_series(
    path: &Path,
    pollutant: Pollutant,
    columns: &SeriesColumns<'_>,
) -> Result<PollutantSeries, DataError> {
    let table = read_table(path)?;
    let date_idx = table.column_index(columns.date)?;
    let region_idx = table.column_index(columns.region)?;
    let value_idx = table.column_index(columns.value)?;

    let readings = table
        .rows
        .iter()
        .enumerate()
        .map(|(row_no, row)| {
            let date =
                cell_date(&row[date_idx]).map_err(|e| row_error(path, row_no, columns.date, e))?;
            let region = cell_text(&row[region_idx])
                .map_err(|e| row_error(path, row_no, columns.region, e))?;
            let value =
                cell_f64(&row[value_idx]).map_err(|e| row_error(path, row_no, columns.value, e))?;
            Ok(PollutantReading {
                date,
                region,
                value,
            })
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    log::info!("Loaded {} {pollutant} readings from {}", readings.len(), path.display());
    Ok(PollutantSeries::new(pollutant, readings))
}

// ---------------------------------------------------------------------------
// Cell conversion
// ---------------------------------------------------------------------------

fn row_error(path: &Path, row: usize, column: &str, message: String) -> DataError {
    DataError::schema(path, format!("row {row}, column '{column}': {message}"))
}

/// Parse the date representations found in the FIRMS and EPA exports.
/// Any time-of-day component is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn cell_date(cell: &Cell) -> Result<NaiveDate, String> {
    match cell {
        Cell::Date(d) => Ok(*d),
        Cell::Text(s) => parse_date(s).ok_or_else(|| format!("'{s}' is not a date")),
        Cell::Number(n) => Err(format!("{n} is not a date")),
        Cell::Null => Err("missing date".to_string()),
    }
}

fn cell_f64(cell: &Cell) -> Result<f64, String> {
    match cell {
        Cell::Number(n) => Ok(*n),
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{s}' is not a number")),
        Cell::Date(d) => Err(format!("{d} is not a number")),
        Cell::Null => Err("missing value".to_string()),
    }
}

fn cell_text(cell: &Cell) -> Result<String, String> {
    match cell {
        Cell::Text(s) if !s.trim().is_empty() => Ok(s.clone()),
        Cell::Number(n) => Ok(n.to_string()),
        Cell::Date(d) => Ok(d.to_string()),
        Cell::Text(_) | Cell::Null => Err("missing text".to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable, DataError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::unavailable(path, e))?;
    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| DataError::schema(path, format!("reading CSV headers: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| DataError::schema(path, format!("CSV row {row_no}: {e}")))?;
        let row = (0..columns.len())
            .map(|i| match record.get(i) {
                Some(s) if !s.is_empty() => Cell::Text(s.to_string()),
                _ => Cell::Null,
            })
            .collect();
        rows.push(row);
    }

    Ok(RawTable {
        path: path.to_path_buf(),
        columns,
        rows,
    })
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "acq_date": "2023-06-01", "latitude": 48.8, "longitude": -76.3 },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys in first-seen order.
fn read_json(path: &Path) -> Result<RawTable, DataError> {
    let text = std::fs::read_to_string(path).map_err(|e| DataError::unavailable(path, e))?;
    let root: JsonValue = serde_json::from_str(&text)
        .map_err(|e| DataError::schema(path, format!("parsing JSON: {e}")))?;

    let records = root
        .as_array()
        .ok_or_else(|| DataError::schema(path, "expected top-level JSON array"))?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| DataError::schema(path, format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map_or(Cell::Null, json_to_cell))
                .collect()
        })
        .collect();

    Ok(RawTable {
        path: path.to_path_buf(),
        columns,
        rows,
    })
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => n
            .as_f64()
            .map_or_else(|| Cell::Text(n.to_string()), Cell::Number),
        JsonValue::Null => Cell::Null,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file. Numeric columns become numbers, date and
/// timestamp columns become calendar dates, strings stay text.
/// Multiple row groups are concatenated.
fn read_parquet(path: &Path) -> Result<RawTable, DataError> {
    let file = std::fs::File::open(path).map_err(|e| DataError::unavailable(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DataError::schema(path, format!("reading parquet metadata: {e}")))?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder
        .build()
        .map_err(|e| DataError::schema(path, format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| DataError::schema(path, format!("reading parquet record batch: {e}")))?;

        let cells_by_column = batch
            .columns()
            .iter()
            .map(column_cells)
            .collect::<Result<Vec<_>, ArrowError>>()
            .map_err(|e| DataError::schema(path, format!("converting parquet column: {e}")))?;

        for row in 0..batch.num_rows() {
            rows.push(cells_by_column.iter().map(|c| c[row].clone()).collect());
        }
    }

    Ok(RawTable {
        path: path.to_path_buf(),
        columns,
        rows,
    })
}

/// Convert a whole Arrow column to cells, casting to a handful of
/// canonical types first.
fn column_cells(col: &ArrayRef) -> Result<Vec<Cell>, ArrowError> {
    let data_type = col.data_type();

    if data_type.is_numeric() {
        let cast_col = cast(col, &DataType::Float64)?;
        let arr = downcast::<Float64Array>(&cast_col)?;
        return Ok((0..arr.len())
            .map(|i| {
                if arr.is_null(i) {
                    Cell::Null
                } else {
                    Cell::Number(arr.value(i))
                }
            })
            .collect());
    }

    if data_type.is_temporal() {
        let cast_col = cast(col, &DataType::Date32)?;
        let arr = downcast::<Date32Array>(&cast_col)?;
        return Ok((0..arr.len())
            .map(|i| {
                if arr.is_null(i) {
                    Cell::Null
                } else {
                    arr.value_as_date(i).map_or(Cell::Null, Cell::Date)
                }
            })
            .collect());
    }

    let cast_col = cast(col, &DataType::Utf8)?;
    let arr = downcast::<StringArray>(&cast_col)?;
    Ok((0..arr.len())
        .map(|i| {
            if arr.is_null(i) {
                Cell::Null
            } else {
                Cell::Text(arr.value(i).to_string())
            }
        })
        .collect())
}

fn downcast<T: 'static>(col: &ArrayRef) -> Result<&T, ArrowError> {
    col.as_any().downcast_ref::<T>().ok_or_else(|| {
        ArrowError::CastError(format!("unexpected array type {:?}", col.data_type()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("wildfire-aq-loader-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_native_date_formats() {
        assert_eq!(parse_date("2023-06-01"), Some(date(2023, 6, 1)));
        assert_eq!(parse_date("06/01/2023"), Some(date(2023, 6, 1)));
        assert_eq!(parse_date("2023-06-01 23:59:59"), Some(date(2023, 6, 1)));
        assert_eq!(parse_date("2023-06-01T08:15:00"), Some(date(2023, 6, 1)));
        assert_eq!(parse_date("2023-06-01T08:15:00+02:00"), Some(date(2023, 6, 1)));
        assert_eq!(parse_date("June 1st"), None);
    }

    #[test]
    fn loads_detection_csv() {
        let dir = scratch_dir("detections");
        let path = dir.join("modis.csv");
        fs::write(
            &path,
            "latitude,longitude,acq_date,confidence\n\
             48.81,-76.36,2023-06-01,80\n\
             10.0,10.0,2023-06-02,40\n",
        )
        .unwrap();

        let records = load_detections(&path, Sensor::Modis, DETECTION_DATE_COLUMN).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].acquisition_date, date(2023, 6, 1));
        assert_eq!(records[1].latitude, 10.0);
        assert!(records.iter().all(|r| r.sensor == Sensor::Modis));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = load_detections(Path::new("/nonexistent/modis.csv"), Sensor::Modis, "acq_date")
            .unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }

    #[test]
    fn missing_column_is_schema_error() {
        let dir = scratch_dir("missing-col");
        let path = dir.join("viirs.csv");
        fs::write(&path, "latitude,acq_date\n48.81,2023-06-01\n").unwrap();

        let err = load_detections(&path, Sensor::Viirs, "acq_date").unwrap_err();
        match err {
            DataError::Schema { message, .. } => assert!(message.contains("longitude")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bad_date_row_is_schema_error() {
        let dir = scratch_dir("bad-date");
        let path = dir.join("modis.csv");
        fs::write(
            &path,
            "acq_date,latitude,longitude\n2023-06-01,1,1\nyesterday,2,2\n",
        )
        .unwrap();

        let err = load_detections(&path, Sensor::Modis, "acq_date").unwrap_err();
        match err {
            DataError::Schema { message, .. } => assert!(message.contains("row 1")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn loads_epa_series_with_native_dates() {
        let dir = scratch_dir("epa");
        let path = dir.join("co.csv");
        fs::write(
            &path,
            "Date,Site ID,Daily Max 8-hour CO Concentration,County\n\
             06/01/2023,1,0.4,Suffolk\n\
             06/02/2023,1,0.5,New York\n",
        )
        .unwrap();

        let series =
            load_pollutant_series(&path, Pollutant::Co, &SeriesColumns::epa(Pollutant::Co))
                .unwrap();
        assert_eq!(series.pollutant, Pollutant::Co);
        assert_eq!(series.len(), 2);
        assert_eq!(series.readings[1].date, date(2023, 6, 2));
        assert_eq!(series.readings[1].region, "New York");
        assert_eq!(series.readings[0].value, 0.4);
    }

    #[test]
    fn blank_concentration_is_schema_error() {
        let dir = scratch_dir("blank");
        let path = dir.join("no2.csv");
        fs::write(
            &path,
            "Date,County,Daily Max 1-hour NO2 Concentration\n06/01/2023,Suffolk,\n",
        )
        .unwrap();

        let err = load_pollutant_series(&path, Pollutant::No2, &SeriesColumns::epa(Pollutant::No2))
            .unwrap_err();
        assert!(matches!(err, DataError::Schema { .. }));
    }

    #[test]
    fn loads_records_json() {
        let dir = scratch_dir("json");
        let path = dir.join("viirs.json");
        fs::write(
            &path,
            r#"[{"acq_date":"2023-06-03","latitude":52.7,"longitude":-73.5},
                {"acq_date":"2023-06-04","latitude":50.4,"longitude":-74.2,"frp":3.1}]"#,
        )
        .unwrap();

        let records = load_detections(&path, Sensor::Viirs, "acq_date").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].acquisition_date, date(2023, 6, 4));
    }

    #[test]
    fn loads_detection_parquet() {
        use std::sync::Arc;

        use arrow::array::{Date32Array, Float64Array, StringArray};
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let dir = scratch_dir("parquet");
        let path = dir.join("viirs.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("acq_date", DataType::Date32, false),
            Field::new("latitude", DataType::Float64, false),
            Field::new("longitude", DataType::Float64, false),
            Field::new("instrument", DataType::Utf8, false),
        ]));
        // 19509 days after 1970-01-01 is 2023-06-01
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(vec![19509, 19510])),
                Arc::new(Float64Array::from(vec![48.81, 53.08])),
                Arc::new(Float64Array::from(vec![-76.36, -75.45])),
                Arc::new(StringArray::from(vec!["VIIRS", "VIIRS"])),
            ],
        )
        .unwrap();
        let file = fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let records = load_detections(&path, Sensor::Viirs, DETECTION_DATE_COLUMN).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].acquisition_date, date(2023, 6, 1));
        assert_eq!(records[1].acquisition_date, date(2023, 6, 2));
        assert_eq!(records[1].latitude, 53.08);
        assert_eq!(records[1].sensor, Sensor::Viirs);
    }

    #[test]
    fn concatenates_detection_files() {
        let dir = scratch_dir("concat");
        let ca = dir.join("ca.csv");
        let us = dir.join("us.csv");
        fs::write(&ca, "acq_date,latitude,longitude\n2023-06-01,50,-75\n").unwrap();
        fs::write(&us, "acq_date,latitude,longitude\n2023-06-01,40,-100\n2023-06-02,41,-101\n")
            .unwrap();

        let records = load_detection_files(&[ca, us], Sensor::Viirs, "acq_date").unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn unsupported_extension_is_schema_error() {
        let dir = scratch_dir("ext");
        let path = dir.join("modis.xlsx");
        fs::write(&path, "whatever").unwrap();
        assert!(matches!(read_table(&path), Err(DataError::Schema { .. })));
    }
}
