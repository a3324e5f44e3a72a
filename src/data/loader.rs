use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{LoadError, LoadResult};
use super::model::{RawTable, SalesDataset};

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

/// Where a dataset comes from: a local file or an `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    /// Interpret a config / dialog string as a source.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            DataSource::Url(s.to_string())
        } else {
            DataSource::File(PathBuf::from(s))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(p) => write!(f, "{}", p.display()),
            DataSource::Url(u) => write!(f, "{u}"),
        }
    }
}

/// Result of a load attempt that never fails: on error the dataset is empty
/// and the message is kept for the UI.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub dataset: Arc<SalesDataset>,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a sales dataset from any source.
pub fn load_source(source: &DataSource, fetch_timeout: Duration) -> LoadResult<SalesDataset> {
    match source {
        DataSource::File(path) => load_file(path),
        DataSource::Url(url) => load_url(url, fetch_timeout),
    }
}

/// Load a source, falling back to an empty dataset on failure.
pub fn load_or_empty(source: &DataSource, fetch_timeout: Duration) -> LoadOutcome {
    match load_source(source, fetch_timeout) {
        Ok(dataset) => {
            log::info!(
                "Loaded {} records from {source} ({} regions, {} categories)",
                dataset.len(),
                dataset.regions.len(),
                dataset.categories.len()
            );
            LoadOutcome {
                dataset: Arc::new(dataset),
                error: None,
            }
        }
        Err(e) => {
            log::error!("Failed to load {source}: {e}");
            LoadOutcome {
                dataset: Arc::new(SalesDataset::empty()),
                error: Some(format!("Error loading dataset: {e}")),
            }
        }
    }
}

static SESSION: OnceLock<LoadOutcome> = OnceLock::new();

/// The startup dataset, loaded on first call and kept for the rest of the
/// process. Later calls ignore their arguments.
pub fn session_dataset(source: &DataSource, fetch_timeout: Duration) -> LoadOutcome {
    SESSION
        .get_or_init(|| load_or_empty(source, fetch_timeout))
        .clone()
}

/// Load a local file. Dispatch by extension; anything unknown is read as CSV.
///
/// Supported formats:
/// * `.csv`     – header row plus one line per record
/// * `.json`    – `[{ "Order ID": "...", "Sales": 12.5, ... }, ...]`
/// * `.parquet` – any scalar columns
pub fn load_file(path: &Path) -> LoadResult<SalesDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(&read_bytes(path)?)?,
        "csv" | "txt" | "" => read_csv(&read_bytes(path)?)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };
    SalesDataset::from_raw_table(table)
}

fn read_bytes(path: &Path) -> LoadResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// URL loader
// ---------------------------------------------------------------------------

fn load_url(url: &str, timeout: Duration) -> LoadResult<SalesDataset> {
    let http_err = |source| LoadError::Http {
        url: url.to_string(),
        source,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(http_err)?;
    let body = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .map_err(http_err)?;
    SalesDataset::from_raw_table(read_csv(&body)?)
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Decode as UTF-8, or as Latin-1 when that fails. Latin-1 maps every byte
/// to the code point of the same value, so decoding cannot fail.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.strip_prefix('\u{feff}').unwrap_or(s).to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Every record must have as many fields as the header.
pub fn read_csv(bytes: &[u8]) -> LoadResult<RawTable> {
    let text = decode_text(bytes);
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// Columns are the union of object keys in order of first appearance;
/// absent keys and `null` become empty cells.
fn read_json(bytes: &[u8]) -> LoadResult<RawTable> {
    let root: JsonValue = serde_json::from_slice(bytes)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Shape("expected top-level JSON array".to_string()))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Shape(format!("row {} is not a JSON object", i + 1)))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Read every column through Arrow's display formatter, so dates come out
/// as `YYYY-MM-DD` and nulls as empty cells.
fn read_parquet(path: &Path) -> LoadResult<RawTable> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let options = FormatOptions::default();
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let formatters = batch
            .columns()
            .iter()
            .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            rows.push(
                formatters
                    .iter()
                    .map(|f| f.value(row).to_string())
                    .collect(),
            );
        }
    }

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc as StdArc;

    use arrow::array::{Date32Array, Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const CSV: &str = "\
Row ID,Order ID,Order Date,Ship Date,Region,Category,Sales,Quantity,Profit
1,CA-1,11/8/2016,11/11/2016,South,Furniture,261.96,2,41.9136
2,CA-1,11/8/2016,11/11/2016,South,Furniture,731.94,3,219.582
3,CA-2,6/12/2016,6/16/2016,West,Office Supplies,14.62,2,6.8714
";

    fn write_temp(suffix: &str, bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(bytes).unwrap();
        f
    }

    #[test]
    fn loads_csv_file() {
        let f = write_temp(".csv", CSV.as_bytes());
        let ds = load_file(f.path()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.headers[0], "Row ID");
        assert_eq!(ds.regions, vec!["South", "West"]);
        assert_eq!(
            ds.records[2].order_date,
            NaiveDate::from_ymd_opt(2016, 6, 12).unwrap()
        );
        assert_eq!(
            ds.numeric_columns,
            vec!["Row ID", "Sales", "Quantity", "Profit"]
        );
    }

    #[test]
    fn latin1_bytes_are_decoded() {
        let mut bytes = b"Order ID,Order Date,Ship Date,Region,Category,Sales,Profit,Customer\n".to_vec();
        bytes.extend_from_slice(b"A1,1/1/2017,1/2/2017,East,Technology,10,1,Jos");
        bytes.push(0xE9);
        bytes.push(b'\n');
        let table = read_csv(&bytes).unwrap();
        assert_eq!(table.rows[0][7], "José");
    }

    #[test]
    fn ragged_csv_is_an_error() {
        let f = write_temp(".csv", b"Order ID,Region\nA1,East,extra\n");
        assert!(matches!(load_file(f.path()), Err(LoadError::Csv(_))));
    }

    #[test]
    fn loads_json_records() {
        let json = r#"[
            {"Order ID": "A1", "Order Date": "2017-01-01", "Ship Date": "2017-01-03",
             "Region": "East", "Category": "Technology", "Sales": 10.5, "Profit": 2},
            {"Order ID": "A2", "Order Date": "2017-01-02", "Ship Date": "2017-01-04",
             "Region": "West", "Category": "Technology", "Sales": 4, "Profit": null}
        ]"#;
        let table = read_json(json.as_bytes()).unwrap();
        let profit = table.headers.iter().position(|h| h == "Profit").unwrap();
        assert_eq!(table.rows[1][profit], "");
        let f = write_temp(".json", json.as_bytes());
        // Second record has no profit, so the load as a whole fails.
        assert!(matches!(
            load_file(f.path()),
            Err(LoadError::BadNumber { row: 2, .. })
        ));
    }

    #[test]
    fn json_must_be_an_array() {
        let err = read_json(br#"{"Order ID": "A1"}"#).unwrap_err();
        assert!(matches!(err, LoadError::Shape(_)));
    }

    #[test]
    fn loads_parquet_with_date_columns() {
        let schema = StdArc::new(Schema::new(vec![
            Field::new("Order ID", DataType::Utf8, false),
            Field::new("Order Date", DataType::Date32, false),
            Field::new("Ship Date", DataType::Date32, false),
            Field::new("Region", DataType::Utf8, false),
            Field::new("Category", DataType::Utf8, false),
            Field::new("Sales", DataType::Float64, false),
            Field::new("Profit", DataType::Float64, false),
        ]));
        // 17000 days after the epoch is 2016-07-18.
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                StdArc::new(StringArray::from(vec!["A1", "A2"])),
                StdArc::new(Date32Array::from(vec![17000, 17001])),
                StdArc::new(Date32Array::from(vec![17002, 17003])),
                StdArc::new(StringArray::from(vec!["East", "West"])),
                StdArc::new(StringArray::from(vec!["Furniture", "Technology"])),
                StdArc::new(Float64Array::from(vec![100.0, 25.5])),
                StdArc::new(Float64Array::from(vec![10.0, -3.0])),
            ],
        )
        .unwrap();

        let f = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(f.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(f.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.records[0].order_date,
            NaiveDate::from_ymd_opt(2016, 7, 18).unwrap()
        );
        assert_eq!(ds.records[1].profit, -3.0);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let f = write_temp(".xlsx", b"");
        assert!(matches!(
            load_file(f.path()),
            Err(LoadError::UnsupportedExtension(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn missing_file_falls_back_to_empty_dataset() {
        let source = DataSource::parse("/definitely/not/here.csv");
        let outcome = load_or_empty(&source, Duration::from_secs(1));
        assert!(outcome.dataset.is_empty());
        assert!(outcome.error.unwrap().starts_with("Error loading dataset"));
    }

    // The only test touching the process-wide session cache.
    #[test]
    fn session_dataset_is_loaded_once() {
        let f = write_temp(".csv", CSV.as_bytes());
        let source = DataSource::File(f.path().to_path_buf());
        let first = session_dataset(&source, Duration::from_secs(1));
        assert_eq!(first.dataset.len(), 3);
        assert!(first.error.is_none());

        let other = DataSource::parse("/definitely/not/here.csv");
        let second = session_dataset(&other, Duration::from_secs(1));
        assert!(Arc::ptr_eq(&first.dataset, &second.dataset));
        assert!(second.error.is_none());
    }

    #[test]
    fn source_parsing_distinguishes_urls() {
        assert_eq!(
            DataSource::parse(" https://example.com/s.csv "),
            DataSource::Url("https://example.com/s.csv".to_string())
        );
        assert_eq!(
            DataSource::parse("data/Superstore.csv"),
            DataSource::File(PathBuf::from("data/Superstore.csv"))
        );
    }
}
