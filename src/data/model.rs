use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::error::{LoadError, LoadResult};

// ---------------------------------------------------------------------------
// Column names every sales table must carry
// ---------------------------------------------------------------------------

pub const ORDER_ID: &str = "Order ID";
pub const ORDER_DATE: &str = "Order Date";
pub const SHIP_DATE: &str = "Ship Date";
pub const REGION: &str = "Region";
pub const CATEGORY: &str = "Category";
pub const SALES: &str = "Sales";
pub const PROFIT: &str = "Profit";

// ---------------------------------------------------------------------------
// RawTable – untyped cells straight out of a loader
// ---------------------------------------------------------------------------

/// Header plus rows of cell text, as read from CSV / JSON / Parquet.
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ---------------------------------------------------------------------------
// SalesRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// A single sales transaction (one line item).
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub ship_date: NaiveDate,
    pub region: String,
    pub category: String,
    pub sales: f64,
    pub profit: f64,
    /// Source cell text for every column, in header order. Used for export.
    pub cells: Vec<String>,
    /// Parsed values of the numeric columns, aligned with
    /// [`SalesDataset::numeric_columns`]. `None` is a missing cell.
    pub numeric: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// SalesDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed distinct values.
#[derive(Debug, Clone, Default)]
pub struct SalesDataset {
    /// All records, in source order.
    pub records: Vec<SalesRecord>,
    /// Source column names, in source order.
    pub headers: Vec<String>,
    /// Columns whose non-empty cells are all numbers.
    pub numeric_columns: Vec<String>,
    /// Distinct regions in order of first appearance.
    pub regions: Vec<String>,
    /// Distinct categories in order of first appearance.
    pub categories: Vec<String>,
}

struct RequiredColumns {
    order_id: usize,
    order_date: usize,
    ship_date: usize,
    region: usize,
    category: usize,
    sales: usize,
    profit: usize,
}

impl RequiredColumns {
    fn locate(headers: &[String]) -> LoadResult<Self> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(LoadError::MissingColumn(name))
        };
        Ok(Self {
            order_id: find(ORDER_ID)?,
            order_date: find(ORDER_DATE)?,
            ship_date: find(SHIP_DATE)?,
            region: find(REGION)?,
            category: find(CATEGORY)?,
            sales: find(SALES)?,
            profit: find(PROFIT)?,
        })
    }
}

impl SalesDataset {
    /// The empty dataset shown when nothing could be loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Type the cells of a raw table. Fails on the first missing column,
    /// unparseable date, or non-numeric Sales / Profit cell.
    pub fn from_raw_table(table: RawTable) -> LoadResult<Self> {
        let RawTable { headers, rows } = table;
        let cols = RequiredColumns::locate(&headers)?;

        let numeric_idx: Vec<usize> = (0..headers.len())
            .filter(|&c| is_numeric_column(&rows, c))
            .collect();
        let numeric_columns = numeric_idx.iter().map(|&c| headers[c].clone()).collect();

        let mut regions: Vec<String> = Vec::new();
        let mut categories: Vec<String> = Vec::new();
        let mut records = Vec::with_capacity(rows.len());

        for (i, cells) in rows.into_iter().enumerate() {
            let row = i + 1;
            let order_date = required_date(&cells[cols.order_date], row, ORDER_DATE)?;
            let ship_date = required_date(&cells[cols.ship_date], row, SHIP_DATE)?;
            let sales = required_number(&cells[cols.sales], row, SALES)?;
            let profit = required_number(&cells[cols.profit], row, PROFIT)?;

            let region = cells[cols.region].clone();
            let category = cells[cols.category].clone();
            if !regions.contains(&region) {
                regions.push(region.clone());
            }
            if !categories.contains(&category) {
                categories.push(category.clone());
            }

            let numeric = numeric_idx.iter().map(|&c| parse_number(&cells[c])).collect();

            records.push(SalesRecord {
                order_id: cells[cols.order_id].clone(),
                order_date,
                ship_date,
                region,
                category,
                sales,
                profit,
                cells,
                numeric,
            });
        }

        Ok(SalesDataset {
            records,
            headers,
            numeric_columns,
            regions,
            categories,
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn is_numeric_column(rows: &[Vec<String>], col: usize) -> bool {
    let mut seen_value = false;
    for row in rows {
        let cell = row[col].trim();
        if cell.is_empty() {
            continue;
        }
        if cell.parse::<f64>().is_err() {
            return false;
        }
        seen_value = true;
    }
    seen_value
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

fn required_number(s: &str, row: usize, column: &'static str) -> LoadResult<f64> {
    parse_number(s).ok_or_else(|| LoadError::BadNumber {
        row,
        column,
        value: s.to_string(),
    })
}

fn required_date(s: &str, row: usize, column: &'static str) -> LoadResult<NaiveDate> {
    parse_date(s).ok_or_else(|| LoadError::BadDate {
        row,
        column,
        value: s.to_string(),
    })
}

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a calendar date. Timestamps are accepted and truncated to their
/// date part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}
