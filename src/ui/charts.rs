use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{Align2, Color32, FontId, Rect, Sense, Ui, Vec2};
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints, Points};

use crate::color::{contrast_text, diverging_color, ColorMap};
use crate::data::aggregate::CorrelationMatrix;
use crate::state::AppState;
use crate::ui::format;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

pub fn sales_by_category(ui: &mut Ui, state: &AppState) {
    labelled_bar_chart(
        ui,
        "sales_by_category",
        ("Category", "Sales"),
        &state.summary.sales_by_category,
        &state.category_colors,
    );
}

pub fn profit_by_region(ui: &mut Ui, state: &AppState) {
    labelled_bar_chart(
        ui,
        "profit_by_region",
        ("Region", "Profit"),
        &state.summary.profit_by_region,
        &state.region_colors,
    );
}

/// One bar per key, placed at x = 0, 1, 2, … with the key as tick label.
fn labelled_bar_chart(
    ui: &mut Ui,
    id: &str,
    (x_label, y_label): (&str, &str),
    values: &BTreeMap<String, f64>,
    colors: &ColorMap,
) {
    let labels: Vec<String> = values.keys().cloned().collect();
    let bars: Vec<Bar> = values
        .iter()
        .enumerate()
        .map(|(i, (key, &value))| {
            Bar::new(i as f64, value)
                .name(key)
                .fill(colors.color_for(key))
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_tick(&labels, mark.value)
        })
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).width(0.6));
        });
}

/// Tick label for an integer position, blank between bars.
fn category_tick(labels: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// Daily sales as a line with point markers. Days without orders are simply
/// not plotted, the line joins the neighbouring points.
pub fn sales_over_time(ui: &mut Ui, state: &AppState) {
    let points: Vec<[f64; 2]> = state
        .summary
        .sales_by_date
        .iter()
        .map(|(date, sales)| [date_to_x(*date), *sales])
        .collect();

    Plot::new("sales_over_time")
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Sales")
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| x_to_label(mark.value))
        .label_formatter(|_name, point| {
            format!("{}\n{}", x_to_label(point.x), format::currency(point.y))
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .color(Color32::LIGHT_BLUE)
                    .width(1.5),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .color(Color32::LIGHT_BLUE)
                    .radius(2.5),
            );
        });
}

fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn x_to_label(x: f64) -> String {
    if !x.is_finite() || x.abs() > i32::MAX as f64 {
        return String::new();
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

const LABEL_WIDTH: f32 = 110.0;
const HEADER_HEIGHT: f32 = 22.0;

/// Annotated grid of coefficients. Undefined cells are grey and read "nan".
pub fn correlation_heatmap(ui: &mut Ui, corr: &CorrelationMatrix) {
    if corr.is_empty() {
        ui.label("No numeric columns to correlate.");
        return;
    }
    let k = corr.len();
    let cell = ((ui.available_width() - LABEL_WIDTH) / k as f32).clamp(36.0, 90.0);
    let size = Vec2::new(LABEL_WIDTH + cell * k as f32, HEADER_HEIGHT + cell * k as f32);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min;

    let text_color = ui.visuals().text_color();
    let label_font = FontId::proportional(12.0);
    let value_font = FontId::proportional((cell * 0.28).clamp(10.0, 14.0));
    let max_chars = ((cell / 7.0) as usize).max(3);

    for (j, name) in corr.columns.iter().enumerate() {
        let center = origin + Vec2::new(LABEL_WIDTH + cell * (j as f32 + 0.5), HEADER_HEIGHT * 0.5);
        painter.text(
            center,
            Align2::CENTER_CENTER,
            abbreviate(name, max_chars),
            label_font.clone(),
            text_color,
        );
    }

    for i in 0..k {
        let row_y = HEADER_HEIGHT + cell * i as f32;
        painter.text(
            origin + Vec2::new(LABEL_WIDTH - 6.0, row_y + cell * 0.5),
            Align2::RIGHT_CENTER,
            abbreviate(&corr.columns[i], 16),
            label_font.clone(),
            text_color,
        );

        for j in 0..k {
            let value = corr.at(i, j);
            let fill = diverging_color(value);
            let min = origin + Vec2::new(LABEL_WIDTH + cell * j as f32, row_y);
            let rect = Rect::from_min_size(min, Vec2::splat(cell)).shrink(1.0);
            painter.rect_filled(rect, 2.0, fill);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                format::coefficient(value),
                value_font.clone(),
                contrast_text(fill),
            );
        }
    }

    if let Some(pos) = response.hover_pos() {
        let rel = pos - origin - Vec2::new(LABEL_WIDTH, HEADER_HEIGHT);
        if rel.x >= 0.0 && rel.y >= 0.0 {
            let (i, j) = ((rel.y / cell) as usize, (rel.x / cell) as usize);
            if i < k && j < k {
                response.on_hover_text(format!(
                    "{} × {}: {}",
                    corr.columns[i],
                    corr.columns[j],
                    format::coefficient(corr.at(i, j))
                ));
            }
        }
    }
}

/// Shorten to `max_chars`, marking the cut with an ellipsis.
fn abbreviate(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let keep: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{keep}…")
}
