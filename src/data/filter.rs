use std::collections::BTreeSet;

use super::model::{SalesDataset, SalesRecord};

// ---------------------------------------------------------------------------
// Filter selection: which regions and categories are shown
// ---------------------------------------------------------------------------

/// Selected regions and categories. A record is shown when both its region
/// and its category are selected; an empty set hides everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub regions: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

impl FilterSelection {
    /// Everything selected (the initial state after a load).
    pub fn all(dataset: &SalesDataset) -> Self {
        Self {
            regions: dataset.regions.iter().cloned().collect(),
            categories: dataset.categories.iter().cloned().collect(),
        }
    }

    /// Whether a record passes this selection.
    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.regions.contains(&record.region) && self.categories.contains(&record.category)
    }
}

// ---------------------------------------------------------------------------
// FilteredView: borrowed, order-preserving subset of the dataset
// ---------------------------------------------------------------------------

/// Records of a dataset passing a selection, by index, in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a SalesDataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Build a view from precomputed indices (must be ascending and in range).
    pub fn from_indices(dataset: &'a SalesDataset, indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(indices.last().map_or(true, |&i| i < dataset.len()));
        Self { dataset, indices }
    }

    pub fn dataset(&self) -> &'a SalesDataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate the visible records in dataset order.
    pub fn records(&self) -> impl Iterator<Item = &'a SalesRecord> + Clone + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }
}

/// Return indices of records that pass the selection.
pub fn filtered_indices(dataset: &SalesDataset, selection: &FilterSelection) -> Vec<usize> {
    if selection.regions.is_empty() || selection.categories.is_empty() {
        return Vec::new();
    }
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// Records whose region is in `regions` and category is in `categories`.
pub fn filter<'a>(
    dataset: &'a SalesDataset,
    regions: &BTreeSet<String>,
    categories: &BTreeSet<String>,
) -> FilteredView<'a> {
    let selection = FilterSelection {
        regions: regions.clone(),
        categories: categories.clone(),
    };
    FilteredView::from_indices(dataset, filtered_indices(dataset, &selection))
}
