use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use super::filter::FilteredView;

// ---------------------------------------------------------------------------
// Scalar metrics
// ---------------------------------------------------------------------------

pub fn total_sales(view: &FilteredView<'_>) -> f64 {
    view.records().map(|r| r.sales).sum()
}

pub fn total_profit(view: &FilteredView<'_>) -> f64 {
    view.records().map(|r| r.profit).sum()
}

/// Number of unique Order IDs; an order spanning several line items counts once.
/// Rows without an Order ID are not counted.
pub fn distinct_order_count(view: &FilteredView<'_>) -> usize {
    view.records()
        .map(|r| r.order_id.as_str())
        .filter(|id| !id.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

// ---------------------------------------------------------------------------
// Grouped sums
// ---------------------------------------------------------------------------

/// Sales per category. Categories without rows are absent, as are rows
/// with an empty category.
pub fn sum_by_category(view: &FilteredView<'_>) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for r in view.records().filter(|r| !r.category.is_empty()) {
        *out.entry(r.category.clone()).or_insert(0.0) += r.sales;
    }
    out
}

/// Sales per order date, ascending. Dates without rows are skipped, not zero.
pub fn sum_by_order_date(view: &FilteredView<'_>) -> Vec<(NaiveDate, f64)> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in view.records() {
        *by_date.entry(r.order_date).or_insert(0.0) += r.sales;
    }
    by_date.into_iter().collect()
}

/// Profit per region; rows with an empty region are left out.
pub fn sum_profit_by_region(view: &FilteredView<'_>) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for r in view.records().filter(|r| !r.region.is_empty()) {
        *out.entry(r.region.clone()).or_insert(0.0) += r.profit;
    }
    out
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Square matrix of Pearson coefficients between numeric columns.
/// Undefined coefficients are `NaN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()²` entries.
    values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Coefficient at matrix position (`row`, `col`).
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.columns.len() + col]
    }
}

/// Pearson correlation of every pair of numeric columns, each pair over the
/// rows where both cells are present.
pub fn correlation_matrix(view: &FilteredView<'_>) -> CorrelationMatrix {
    let columns = view.dataset().numeric_columns.clone();
    let k = columns.len();
    let mut values = vec![f64::NAN; k * k];

    for i in 0..k {
        for j in i..k {
            let pairs = view.records().filter_map(|r| Some((r.numeric[i]?, r.numeric[j]?)));
            let r = pearson(pairs, i == j);
            values[i * k + j] = r;
            values[j * k + i] = r;
        }
    }

    CorrelationMatrix { columns, values }
}

/// Pearson coefficient from running means and co-moments (Welford). A
/// constant column keeps its mean exactly, so its variance is exactly zero.
/// `NaN` with fewer than two observations or zero variance on either side.
/// `same_column` pins the result to exactly 1.
fn pearson(pairs: impl Iterator<Item = (f64, f64)>, same_column: bool) -> f64 {
    let (mut n, mut mean_x, mut mean_y) = (0usize, 0.0, 0.0);
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        n += 1;
        let dx = x - mean_x;
        let dy = y - mean_y;
        mean_x += dx / n as f64;
        mean_y += dy / n as f64;
        sxx += dx * (x - mean_x);
        syy += dy * (y - mean_y);
        sxy += dx * (y - mean_y);
    }
    if n < 2 || sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    if same_column {
        return 1.0;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

// ---------------------------------------------------------------------------
// DashboardSummary – everything the dashboard shows, computed in one pass
// ---------------------------------------------------------------------------

/// All aggregates for one filter selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_sales: f64,
    pub total_profit: f64,
    pub order_count: usize,
    pub sales_by_category: BTreeMap<String, f64>,
    pub sales_by_date: Vec<(NaiveDate, f64)>,
    pub profit_by_region: BTreeMap<String, f64>,
    pub correlation: CorrelationMatrix,
}

impl DashboardSummary {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        Self {
            total_sales: total_sales(view),
            total_profit: total_profit(view),
            order_count: distinct_order_count(view),
            sales_by_category: sum_by_category(view),
            sales_by_date: sum_by_order_date(view),
            profit_by_region: sum_profit_by_region(view),
            correlation: correlation_matrix(view),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::filter::tests::{fixture, set};
    use crate::data::filter::{filter, FilterSelection};
    use crate::data::model::{RawTable, SalesDataset};

    impl CorrelationMatrix {
        fn get(&self, a: &str, b: &str) -> Option<f64> {
            let i = self.columns.iter().position(|c| c == a)?;
            let j = self.columns.iter().position(|c| c == b)?;
            Some(self.at(i, j))
        }
    }

    fn all_of(ds: &SalesDataset) -> FilteredView<'_> {
        let sel = FilterSelection::all(ds);
        filter(ds, &sel.regions, &sel.categories)
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, m, d).unwrap()
    }

    #[test]
    fn east_selection_matches_reference_numbers() {
        let ds = fixture();
        let view = filter(&ds, &set(&["East"]), &set(&["Furniture", "Office"]));
        assert_eq!(view.len(), 2);
        assert_eq!(total_sales(&view), 150.0);
        assert_eq!(total_profit(&view), 15.0);
        assert_eq!(distinct_order_count(&view), 1);
    }

    #[test]
    fn category_sums_over_full_dataset() {
        let ds = fixture();
        let sums = sum_by_category(&all_of(&ds));
        let expected: BTreeMap<String, f64> =
            [("Furniture".to_string(), 300.0), ("Office".to_string(), 80.0)].into();
        assert_eq!(sums, expected);
    }

    #[test]
    fn category_entry_exists_only_for_present_rows() {
        let ds = fixture();
        let view = filter(&ds, &set(&["West"]), &set(&["Office"]));
        let sums = sum_by_category(&view);
        assert_eq!(sums.len(), 1);
        assert_eq!(sums["Office"], 30.0);
        assert!(!sums.contains_key("Furniture"));
    }

    #[test]
    fn totals_match_brute_force_for_every_selection() {
        let ds = fixture();
        let selections: [(&[&str], &[&str]); 4] = [
            (&["East"], &["Office"]),
            (&["West"], &["Furniture", "Office"]),
            (&["East", "West"], &["Furniture"]),
            (&["North"], &["Furniture"]),
        ];
        for (regions, categories) in selections {
            let (r, c): (BTreeSet<String>, BTreeSet<String>) = (set(regions), set(categories));
            let view = filter(&ds, &r, &c);
            let expected: f64 = ds
                .records
                .iter()
                .filter(|rec| r.contains(&rec.region) && c.contains(&rec.category))
                .map(|rec| rec.sales)
                .sum();
            assert_eq!(total_sales(&view), expected);
        }
    }

    #[test]
    fn empty_view_aggregates_to_zero() {
        let ds = fixture();
        let view = filter(&ds, &set(&[]), &set(&["Office"]));
        let summary = DashboardSummary::compute(&view);
        assert_eq!(summary.total_sales, 0.0);
        assert_eq!(summary.total_profit, 0.0);
        assert_eq!(summary.order_count, 0);
        assert!(summary.sales_by_category.is_empty());
        assert!(summary.sales_by_date.is_empty());
        assert!(summary.profit_by_region.is_empty());
        assert!(summary.correlation.at(0, 0).is_nan());
    }

    #[test]
    fn empty_dataset_summary_has_no_columns() {
        let ds = SalesDataset::empty();
        let summary = DashboardSummary::compute(&all_of(&ds));
        assert_eq!(summary, DashboardSummary::default());
    }

    #[test]
    fn dates_are_ascending_without_gap_fill() {
        let ds = fixture();
        let series = sum_by_order_date(&all_of(&ds));
        assert_eq!(
            series,
            vec![(date(1, 3), 200.0), (date(1, 5), 150.0), (date(1, 9), 30.0)]
        );
    }

    #[test]
    fn profit_by_region_sums_profit() {
        let ds = fixture();
        let sums = sum_profit_by_region(&all_of(&ds));
        assert_eq!(sums["East"], 15.0);
        assert_eq!(sums["West"], 43.0);
    }

    #[test]
    fn correlation_of_fixture_columns() {
        let ds = fixture();
        let corr = correlation_matrix(&all_of(&ds));
        assert_eq!(corr.columns, vec!["Sales", "Profit"]);
        assert_eq!(corr.get("Sales", "Sales"), Some(1.0));
        let r = corr.get("Sales", "Profit").unwrap();
        assert_eq!(Some(r), corr.get("Profit", "Sales"));
        assert!(r > 0.9 && r <= 1.0, "r = {r}");
        assert_eq!(corr.get("Sales", "Quantity"), None);
    }

    #[test]
    fn perfectly_anticorrelated_columns() {
        let ds = table(&[("B1", "10", "5"), ("B2", "20", "4"), ("B3", "30", "3")]);
        let corr = correlation_matrix(&all_of(&ds));
        let r = corr.get("Sales", "Discount").unwrap();
        assert!((r + 1.0).abs() < 1e-12, "r = {r}");
    }

    #[test]
    fn degenerate_correlations_are_nan() {
        // Discount is constant; a single row has no defined correlation at all.
        let ds = table(&[("B1", "10", "0.2"), ("B2", "30", "0.2")]);
        let corr = correlation_matrix(&all_of(&ds));
        assert!(corr.get("Discount", "Sales").unwrap().is_nan());
        assert!(corr.get("Discount", "Discount").unwrap().is_nan());
        assert_eq!(corr.get("Sales", "Sales"), Some(1.0));

        let single = filter(&ds, &set(&["East"]), &set(&["Office"]));
        let single = FilteredView::from_indices(single.dataset(), vec![0]);
        assert!(correlation_matrix(&single).get("Sales", "Profit").unwrap().is_nan());
    }

    #[test]
    fn constant_inexact_column_has_no_correlation() {
        // 0.1 has no exact binary form; the running mean must still stay at 0.1.
        let ds = table(&[("B1", "10", "0.1"), ("B2", "20", "0.1"), ("B3", "35", "0.1")]);
        let corr = correlation_matrix(&all_of(&ds));
        assert!(corr.get("Discount", "Discount").unwrap().is_nan());
        assert!(corr.get("Sales", "Discount").unwrap().is_nan());
        assert!(corr.get("Discount", "Profit").unwrap().is_nan());
        let r = corr.get("Sales", "Profit").unwrap();
        assert!((r - 1.0).abs() < 1e-12, "r = {r}");
    }

    #[test]
    fn empty_keys_are_not_grouped() {
        let headers = ["Order ID", "Order Date", "Ship Date", "Region", "Category", "Sales", "Profit"];
        let rows = [
            ["A1", "1/1/2017", "1/2/2017", "East", "Office", "10", "1"],
            ["", "1/1/2017", "1/2/2017", "", "", "20", "2"],
        ];
        let ds = SalesDataset::from_raw_table(RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        })
        .unwrap();
        let view = all_of(&ds);
        assert_eq!(view.len(), 2);
        assert_eq!(total_sales(&view), 30.0);
        assert_eq!(distinct_order_count(&view), 1);
        assert_eq!(sum_by_category(&view).keys().collect::<Vec<_>>(), vec!["Office"]);
        assert_eq!(sum_profit_by_region(&view).keys().collect::<Vec<_>>(), vec!["East"]);
    }

    #[test]
    fn missing_cells_are_skipped_pairwise() {
        let ds = table(&[("B1", "10", "1"), ("B2", "20", ""), ("B3", "30", "3"), ("B4", "40", "4")]);
        let corr = correlation_matrix(&all_of(&ds));
        let r = corr.get("Sales", "Discount").unwrap();
        assert!(r > 0.99, "r = {r}");
    }

    /// Rows of (order id, sales, discount); profit mirrors sales.
    fn table(rows: &[(&str, &str, &str)]) -> SalesDataset {
        let headers = [
            "Order ID", "Order Date", "Ship Date", "Region", "Category", "Sales", "Profit",
            "Discount",
        ];
        SalesDataset::from_raw_table(RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|&(id, sales, discount)| {
                    [
                        id, "1/1/2017", "1/2/2017", "East", "Office", sales, sales, discount,
                    ]
                    .iter()
                    .map(|c| c.to_string())
                    .collect()
                })
                .collect(),
        })
        .unwrap()
    }
}
