use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::color::ColorMap;
use crate::config::ExplorerConfig;
use crate::data::aggregate::DashboardSummary;
use crate::data::export;
use crate::data::filter::{filter, FilterSelection, FilteredView};
use crate::data::loader::{self, DataSource, LoadOutcome};
use crate::data::model::SalesDataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

const EXPORT_FAILED: &str = "Export failed";

/// Which of the two filter columns a widget edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    Region,
    Category,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ExplorerConfig,

    /// Where the current dataset came from.
    pub source: DataSource,

    /// Loaded dataset; empty when the load failed.
    pub dataset: Arc<SalesDataset>,

    /// Current region / category selection.
    pub selection: FilterSelection,

    /// Indices of records passing the current selection (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregates over the visible records (cached).
    pub summary: DashboardSummary,

    pub category_colors: ColorMap,
    pub region_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    pub show_preview: bool,
}

impl AppState {
    /// State for the startup dataset from the session cache.
    pub fn new(config: ExplorerConfig) -> Self {
        let source = config.data_source();
        let outcome = loader::session_dataset(&source, config.fetch_timeout());
        Self::from_outcome(config, source, outcome)
    }

    pub fn from_outcome(config: ExplorerConfig, source: DataSource, outcome: LoadOutcome) -> Self {
        let mut state = Self {
            config,
            source,
            dataset: Arc::new(SalesDataset::empty()),
            selection: FilterSelection::default(),
            visible_indices: Vec::new(),
            summary: DashboardSummary::default(),
            category_colors: ColorMap::default(),
            region_colors: ColorMap::default(),
            status_message: None,
            show_preview: false,
        };
        state.apply_outcome(outcome);
        state
    }

    /// Ingest a load result, reset filters to "everything" and recompute.
    pub fn apply_outcome(&mut self, outcome: LoadOutcome) {
        let LoadOutcome { dataset, error } = outcome;
        self.selection = FilterSelection::all(&dataset);
        self.category_colors = ColorMap::new(&dataset.categories);
        self.region_colors = ColorMap::new(&dataset.regions);
        self.dataset = dataset;
        self.status_message = error;
        self.refilter();
    }

    /// Load a new source, replacing the current dataset.
    pub fn load(&mut self, source: DataSource) {
        let outcome = loader::load_or_empty(&source, self.config.fetch_timeout());
        self.source = source;
        self.apply_outcome(outcome);
    }

    /// Re-read the current source from disk / network.
    pub fn reload(&mut self) {
        self.load(self.source.clone());
    }

    /// Borrowed view of the visible records.
    pub fn view(&self) -> FilteredView<'_> {
        FilteredView::from_indices(&self.dataset, self.visible_indices.clone())
    }

    /// Recompute `visible_indices` and the summary after a selection change.
    pub fn refilter(&mut self) {
        let view = filter(
            &self.dataset,
            &self.selection.regions,
            &self.selection.categories,
        );
        let summary = DashboardSummary::compute(&view);
        self.visible_indices = view.indices().to_vec();
        self.summary = summary;
    }

    /// All distinct values of a filter column, in first-seen order.
    pub fn values(&self, column: FilterColumn) -> &[String] {
        match column {
            FilterColumn::Region => &self.dataset.regions,
            FilterColumn::Category => &self.dataset.categories,
        }
    }

    pub fn is_selected(&self, column: FilterColumn, value: &str) -> bool {
        match column {
            FilterColumn::Region => self.selection.regions.contains(value),
            FilterColumn::Category => self.selection.categories.contains(value),
        }
    }

    /// Set a single value's membership in a column's selection.
    pub fn set_selected(&mut self, column: FilterColumn, value: &str, selected: bool) {
        let set = self.selection_mut(column);
        let changed = if selected {
            set.insert(value.to_string())
        } else {
            set.remove(value)
        };
        if changed {
            self.refilter();
        }
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: FilterColumn) {
        let all: BTreeSet<String> = self.values(column).iter().cloned().collect();
        *self.selection_mut(column) = all;
        self.refilter();
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: FilterColumn) {
        self.selection_mut(column).clear();
        self.refilter();
    }

    fn selection_mut(&mut self, column: FilterColumn) -> &mut BTreeSet<String> {
        match column {
            FilterColumn::Region => &mut self.selection.regions,
            FilterColumn::Category => &mut self.selection.categories,
        }
    }

    /// Write the visible records to `path`, reporting failures in the status line.
    /// A successful export only clears an earlier export failure.
    pub fn export_visible(&mut self, path: &Path) {
        let view = self.view();
        if view.is_empty() {
            log::warn!("Exporting an empty selection, only the header is written");
        }
        let result = export::export_to_file(&view, path);
        match result {
            Ok(()) => {
                let stale = self
                    .status_message
                    .as_deref()
                    .is_some_and(|msg| msg.starts_with(EXPORT_FAILED));
                if stale {
                    self.status_message = None;
                }
            }
            Err(e) => {
                log::error!("{EXPORT_FAILED}: {e:#}");
                self.status_message = Some(format!("{EXPORT_FAILED}: {e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::fixture;

    fn state() -> AppState {
        let outcome = LoadOutcome {
            dataset: Arc::new(fixture()),
            error: None,
        };
        AppState::from_outcome(
            ExplorerConfig::default(),
            DataSource::parse("fixture.csv"),
            outcome,
        )
    }

    #[test]
    fn starts_with_everything_selected() {
        let s = state();
        assert_eq!(s.visible_indices, vec![0, 1, 2, 3]);
        assert_eq!(s.summary.total_sales, 380.0);
        assert_eq!(s.summary.order_count, 3);
    }

    #[test]
    fn toggling_a_region_recomputes_the_summary() {
        let mut s = state();
        s.set_selected(FilterColumn::Region, "West", false);
        assert_eq!(s.visible_indices, vec![0, 1]);
        assert_eq!(s.summary.total_sales, 150.0);
        assert_eq!(s.summary.order_count, 1);
        assert!(!s.is_selected(FilterColumn::Region, "West"));

        s.set_selected(FilterColumn::Region, "West", true);
        assert_eq!(s.visible_indices.len(), 4);
    }

    #[test]
    fn select_none_then_all() {
        let mut s = state();
        s.select_none(FilterColumn::Category);
        assert!(s.visible_indices.is_empty());
        assert_eq!(s.summary.total_profit, 0.0);
        s.select_all(FilterColumn::Category);
        assert_eq!(s.visible_indices.len(), 4);
    }

    #[test]
    fn failed_load_keeps_running_with_empty_data() {
        let mut s = state();
        s.load(DataSource::parse("/no/such/file.csv"));
        assert!(s.dataset.is_empty());
        assert!(s.visible_indices.is_empty());
        assert!(s.status_message.is_some());
        assert_eq!(s.summary.total_sales, 0.0);
        assert!(s.values(FilterColumn::Region).is_empty());
    }

    #[test]
    fn export_failure_is_reported() {
        let mut s = state();
        s.export_visible(Path::new("/no/such/dir/out.csv"));
        assert!(s.status_message.unwrap().starts_with("Export failed"));
    }

    #[test]
    fn successful_export_keeps_a_load_error_but_clears_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.csv");

        let mut s = state();
        s.status_message = Some("Error loading dataset: boom".to_string());
        s.export_visible(&target);
        assert_eq!(s.status_message.as_deref(), Some("Error loading dataset: boom"));

        s.export_visible(Path::new("/no/such/dir/out.csv"));
        assert!(s.status_message.as_deref().unwrap().starts_with("Export failed"));
        s.export_visible(&target);
        assert_eq!(s.status_message, None);
    }

    #[test]
    fn refilter_matches_the_filter_operation() {
        let mut s = state();
        s.set_selected(FilterColumn::Category, "Furniture", false);
        let ds = fixture();
        let view = filter(&ds, &s.selection.regions, &s.selection.categories);
        assert_eq!(s.visible_indices, view.indices());
        assert_eq!(s.summary, DashboardSummary::compute(&view));
    }
}
