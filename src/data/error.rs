use thiserror::Error;

/// Everything that can go wrong while turning a data source into a
/// [`SalesDataset`](super::model::SalesDataset).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("parsing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reading parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("decoding arrow batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("{0}")]
    Shape(String),

    #[error("dataset is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: '{value}' in column '{column}' is not a date")]
    BadDate {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: '{value}' in column '{column}' is not a number")]
    BadNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;
