/// Data layer: core types, loading, filtering, aggregation and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet / http(s) URL
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  source → RawTable → SalesDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SalesDataset  │  Vec<SalesRecord>, headers, distinct regions/categories
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  region × category selection → FilteredView (indices)
///   └──────────┘
///        │
///        ├──────────────► export     (CSV of the visible rows)
///        ▼
///   ┌───────────┐
///   │ aggregate  │  totals, grouped sums, correlation matrix
///   └───────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
