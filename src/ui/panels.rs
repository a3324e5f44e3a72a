use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::loader::DataSource;
use crate::state::{AppState, FilterColumn};
use crate::ui::{charts, format};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Options");
    ui.separator();

    if state.dataset.is_empty() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            filter_group(ui, state, FilterColumn::Region, "Select Regions:");
            ui.separator();
            filter_group(ui, state, FilterColumn::Category, "Select Categories:");
            ui.separator();

            if ui.button("Download Filtered Data as CSV").clicked() {
                save_file_dialog(state);
            }
        });
}

/// Multi-select for one filter column: All / None plus one checkbox per value.
fn filter_group(ui: &mut Ui, state: &mut AppState, column: FilterColumn, title: &str) {
    let values = state.values(column).to_vec();
    let n_selected = values
        .iter()
        .filter(|v| state.is_selected(column, v))
        .count();
    let header_text = format!("{title}  ({n_selected}/{})", values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(column);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(column);
                }
            });

            for val in &values {
                let colors = match column {
                    FilterColumn::Region => &state.region_colors,
                    FilterColumn::Category => &state.category_colors,
                };
                let text = RichText::new(val).color(colors.color_for(val));
                let mut checked = state.is_selected(column, val);
                if ui.checkbox(&mut checked, text).changed() {
                    state.set_selected(column, val, checked);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            if ui.button("Export filtered CSV…").clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} records loaded, {} visible",
            state.dataset.len(),
            state.visible_indices.len()
        ));

        ui.separator();
        ui.label(RichText::new(state.source.to_string()).weak());

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – title, preview, metrics, charts
// ---------------------------------------------------------------------------

pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Superstore Sales Analysis Dashboard");
    ui.label("Explore sales trends, categories, and regions in the Superstore dataset.");

    if state.dataset.is_empty() {
        ui.label(
            RichText::new("Dataset could not be loaded. Please check the file path or format.")
                .color(Color32::RED),
        );
    } else {
        ui.checkbox(&mut state.show_preview, "Show Dataset Preview");
        if state.show_preview {
            ui.push_id("preview", |ui: &mut Ui| preview_table(ui, state));
        }
    }

    ui.add_space(8.0);
    ui.heading("Key Metrics");
    key_metrics(ui, state);

    ui.add_space(8.0);
    ui.strong("Sales by Category");
    charts::sales_by_category(ui, state);

    ui.add_space(8.0);
    ui.strong("Sales Over Time");
    charts::sales_over_time(ui, state);

    ui.add_space(8.0);
    ui.strong("Profit by Region");
    charts::profit_by_region(ui, state);

    ui.add_space(8.0);
    ui.strong("Correlation Heatmap");
    charts::correlation_heatmap(ui, &state.summary.correlation);
}

fn key_metrics(ui: &mut Ui, state: &AppState) {
    let summary = &state.summary;
    ui.columns(3, |cols: &mut [Ui]| {
        metric_card(&mut cols[0], "Total Sales", format::currency(summary.total_sales));
        metric_card(&mut cols[1], "Total Profit", format::currency(summary.total_profit));
        metric_card(&mut cols[2], "Total Orders", summary.order_count.to_string());
    });
}

fn metric_card(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(26.0).strong());
    });
}

/// First rows of the full dataset, every source column.
fn preview_table(ui: &mut Ui, state: &AppState) {
    let dataset = &state.dataset;
    let n_rows = state.config.preview_rows.min(dataset.len());

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(60.0), dataset.headers.len())
            .header(20.0, |mut header| {
                for name in &dataset.headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|mut body| {
                for rec in &dataset.records[..n_rows] {
                    body.row(18.0, |mut row| {
                        for cell in &rec.cells {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell);
                            });
                        }
                    });
                }
            });
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load(DataSource::File(path));
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Download filtered data")
        .set_file_name(state.config.export_file_name.as_str())
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.export_visible(&path);
    }
}
