//! Chart drawing with plotters.
//!
//! Each function draws one view onto a fresh bitmap and saves it to `path`.

use super::palette::{is_dark, MISSING};
use crate::analysis::stats::{gaussian_kde, linspace, mean, scott_bandwidth, Histogram};
use crate::config::{ChartKind, ChartSpec};
use crate::models::{CorrelationMatrix, SalesRecord};
use crate::report::format_currency;
use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;
use std::ops::Range;
use std::path::Path;

const FONT: &str = "sans-serif";
const KDE_POINTS: usize = 200;
const MEAN_LINE_COLOR: RGBColor = RGBColor(0, 0, 255);
const BAR_HALF_WIDTH: f64 = 0.4;
/// Pixel gap between a data point and its value label.
const LABEL_GAP: i32 = 10;

fn caption_font<'a>() -> FontDesc<'a> {
    (FONT, 30).into_font().style(FontStyle::Bold)
}

fn value_label_style<'a>(pos: Pos) -> TextStyle<'a> {
    TextStyle::from((FONT, 15).into_font()).pos(pos)
}

/// Axis range placing `n` unit-wide slots centred on `0..n`.
fn slot_axis(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Label of the slot centred on `value`, blank between slots.
fn slot_label(value: f64, labels: &[String]) -> String {
    let index = value.round();
    if (value - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Tick label for a count axis, blank for fractional ticks.
fn count_label(value: f64) -> String {
    if (value - value.round()).abs() > 1e-6 {
        String::new()
    } else {
        format!("{:.0}", value)
    }
}

/// Axis range covering zero and every value, with headroom for labels.
pub fn padded_range(values: &[f64], headroom: f64) -> (f64, f64) {
    let lo = values.iter().copied().fold(0.0, f64::min);
    let hi = values.iter().copied().fold(0.0, f64::max);

    if lo == hi {
        return (0.0, 1.0);
    }

    let lo = if lo < 0.0 { lo * (1.0 + headroom) } else { lo };
    let hi = if hi > 0.0 { hi * (1.0 + headroom) } else { hi };
    (lo, hi)
}

/// Bar or line chart of labelled totals.
pub fn draw_totals_chart(
    path: &Path,
    size: (u32, u32),
    spec: &ChartSpec,
    title: &str,
    labels: &[String],
    values: &[f64],
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let n = labels.len();
    let (y_lo, y_hi) = padded_range(values, 0.15);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, caption_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(slot_axis(n), y_lo..y_hi)?;

    let x_fmt = |v: &f64| slot_label(*v, labels);
    let y_fmt = |v: &f64| format_currency(*v);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n + 1)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style((FONT, 20))
        .label_style((FONT, 16))
        .draw()?;

    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();

    match spec.kind {
        ChartKind::Line => {
            let color = spec.palette.color(0);
            chart.draw_series(LineSeries::new(points.clone(), color.stroke_width(3)))?;
            chart.draw_series(points.iter().map(|&p| Circle::new(p, 6, color.filled())))?;
        }
        _ => {
            chart.draw_series(points.iter().enumerate().map(|(i, &(x, v))| {
                Rectangle::new(
                    [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, v)],
                    spec.palette.color(i).filled(),
                )
            }))?;
        }
    }

    let label_style = value_label_style(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(points.iter().map(|&(x, v)| {
        EmptyElement::at((x, v))
            + Text::new(format_currency(v), (0, -LABEL_GAP), label_style.clone())
    }))?;

    root.present()?;
    Ok(())
}

/// Horizontal bars of the most profitable orders, coloured by category.
pub fn draw_top_profit_chart(
    path: &Path,
    size: (u32, u32),
    spec: &ChartSpec,
    records: &[SalesRecord],
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let n = records.len();
    let profits: Vec<f64> = records.iter().map(|r| r.profit).collect();
    let (x_lo, x_hi) = padded_range(&profits, 0.2);

    // Highest profit on top: row 0 of the input becomes the last slot.
    let row_of = |i: usize| (n - 1 - i) as f64;
    let labels: Vec<String> = records.iter().rev().map(|r| r.order_id.clone()).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title.as_str(), caption_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(x_lo..x_hi, slot_axis(n))?;

    let x_fmt = |v: &f64| format_currency(*v);
    let y_fmt = |v: &f64| slot_label(*v, &labels);
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n + 1)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style((FONT, 20))
        .label_style((FONT, 16))
        .draw()?;

    let mut categories: Vec<&str> = Vec::new();
    for record in records {
        if !categories.contains(&record.product_category.as_str()) {
            categories.push(&record.product_category);
        }
    }

    for (ci, category) in categories.iter().enumerate() {
        let color = spec.palette.color(ci);
        chart
            .draw_series(
                records
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.product_category == *category)
                    .map(|(i, r)| {
                        let row = row_of(i);
                        Rectangle::new(
                            [(0.0, row - BAR_HALF_WIDTH), (r.profit, row + BAR_HALF_WIDTH)],
                            color.filled(),
                        )
                    }),
            )?
            .label(*category)
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));
    }

    let label_style = value_label_style(Pos::new(HPos::Left, VPos::Center));
    chart.draw_series(records.iter().enumerate().map(|(i, r)| {
        EmptyElement::at((r.profit, row_of(i)))
            + Text::new(format_currency(r.profit), (LABEL_GAP, 0), label_style.clone())
    }))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .label_font((FONT, 16))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Histogram of ages with a count-scaled density curve and a mean marker.
pub fn draw_age_histogram(
    path: &Path,
    size: (u32, u32),
    spec: &ChartSpec,
    ages: &[f64],
    bins: usize,
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let hist = Histogram::new(ages, bins);
    let pad = hist.bin_width;
    let (x_lo, x_hi) = (hist.start - pad, hist.end() + pad);

    let xs = linspace(x_lo, x_hi, KDE_POINTS);
    let curve: Vec<(f64, f64)> = match scott_bandwidth(ages) {
        Some(bw) => {
            let scale = ages.len() as f64 * hist.bin_width;
            xs.iter()
                .zip(gaussian_kde(ages, bw, &xs))
                .map(|(&x, d)| (x, d * scale))
                .collect()
        }
        None => Vec::new(),
    };

    let max_count = hist.counts.iter().copied().max().unwrap_or(0) as f64;
    let max_curve = curve.iter().map(|p| p.1).fold(0.0, f64::max);
    let y_hi = (max_count.max(max_curve) * 1.15).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title.as_str(), caption_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)?;

    let x_fmt = |v: &f64| format!("{:.0}", v);
    let y_fmt = |v: &f64| count_label(*v);
    chart
        .configure_mesh()
        .y_labels(count_ticks(y_hi))
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style((FONT, 20))
        .label_style((FONT, 16))
        .draw()?;

    let color = spec.palette.color(0);
    chart.draw_series(hist.bins().map(|(left, right, count)| {
        Rectangle::new([(left, 0.0), (right, count as f64)], color.mix(0.6).filled())
    }))?;
    chart.draw_series(hist.bins().map(|(left, right, count)| {
        Rectangle::new([(left, 0.0), (right, count as f64)], WHITE.stroke_width(1))
    }))?;

    if !curve.is_empty() {
        chart.draw_series(LineSeries::new(curve, color.stroke_width(3)))?;
    }

    if let Some(mean_age) = mean(ages) {
        // Dashed vertical marker.
        let dashes = 24;
        let step = y_hi / (dashes * 2) as f64;
        let mean_style = MEAN_LINE_COLOR.stroke_width(2);
        chart
            .draw_series((0..dashes).map(|k| {
                let y0 = step * (2 * k) as f64;
                PathElement::new(vec![(mean_age, y0), (mean_age, y0 + step)], mean_style)
            }))?
            .label(format!("Mean: {:.1} years", mean_age))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], mean_style));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .label_font((FONT, 16))
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Number of count-axis ticks: one per whole count, at most ten.
fn count_ticks(y_hi: f64) -> usize {
    (y_hi.ceil() as usize + 1).min(10)
}

/// Annotated heatmap of the correlation matrix with a colour bar.
pub fn draw_correlation_heatmap(
    path: &Path,
    size: (u32, u32),
    spec: &ChartSpec,
    matrix: &CorrelationMatrix,
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let split = (size.0 as f64 * 0.85) as i32;
    let (main, bar_area) = root.split_horizontally(split);

    let n = matrix.metrics.len();
    let names: Vec<String> = matrix.metrics.iter().map(|m| m.to_string()).collect();
    let row_names: Vec<String> = names.iter().rev().cloned().collect();

    let mut chart = ChartBuilder::on(&main)
        .caption(spec.title.as_str(), caption_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(140)
        .build_cartesian_2d(slot_axis(n), slot_axis(n))?;

    let x_fmt = |v: &f64| slot_label(*v, &names);
    let y_fmt = |v: &f64| slot_label(*v, &row_names);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n + 1)
        .y_labels(n + 1)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style((FONT, 20))
        .label_style((FONT, 16))
        .draw()?;

    let mut cells = Vec::with_capacity(n * n);
    for r in 0..n {
        for c in 0..n {
            // First metric on the top row.
            let y = (n - 1 - r) as f64;
            let x = c as f64;
            let fill = match matrix.get(r, c) {
                Some(v) => spec.palette.gradient((v + 1.0) / 2.0),
                None => MISSING,
            };
            cells.push((x, y, matrix.get(r, c), fill));
        }
    }

    chart.draw_series(cells.iter().map(|&(x, y, _, fill)| {
        let mut cell = Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], fill.filled());
        cell.set_margin(2, 2, 2, 2);
        cell
    }))?;

    chart.draw_series(cells.iter().map(|&(x, y, value, fill)| {
        let text = value
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "n/a".to_string());
        let ink: &'static RGBColor = if is_dark(fill) { &WHITE } else { &BLACK };
        let style = TextStyle::from((FONT, 26).into_font())
            .color(ink)
            .pos(Pos::new(HPos::Center, VPos::Center));
        Text::new(text, (x, y), style)
    }))?;

    draw_color_bar(&bar_area, spec)?;

    root.present()?;
    Ok(())
}

fn draw_color_bar(
    area: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    spec: &ChartSpec,
) -> Result<()> {
    let steps = 100;

    let mut bar = ChartBuilder::on(area)
        .margin_top(80)
        .margin_bottom(80)
        .margin_right(20)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..1.0, -1.0..1.0)?;

    let y_fmt = |v: &f64| format!("{:.1}", v);
    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(5)
        .y_label_formatter(&y_fmt)
        .label_style((FONT, 14))
        .draw()?;

    bar.draw_series((0..steps).map(|k| {
        let lo = -1.0 + 2.0 * k as f64 / steps as f64;
        let hi = lo + 2.0 / steps as f64;
        let color = spec.palette.gradient((lo + hi) / 4.0 + 0.5);
        Rectangle::new([(0.0, lo), (1.0, hi)], color.filled())
    }))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::coord::ranged1d::Ranged;
    use plotters::coord::types::RangedCoordf64;

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(&[], 0.1), (0.0, 1.0));
        assert_eq!(padded_range(&[0.0, 0.0], 0.1), (0.0, 1.0));

        let (lo, hi) = padded_range(&[10.0, 100.0], 0.1);
        assert_eq!(lo, 0.0);
        assert!((hi - 110.0).abs() < 1e-9);

        let (lo, hi) = padded_range(&[-50.0, 100.0], 0.2);
        assert!((lo + 60.0).abs() < 1e-9);
        assert!((hi - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_slot_label() {
        let labels = vec!["North".to_string(), "South".to_string()];
        assert_eq!(slot_label(0.0, &labels), "North");
        assert_eq!(slot_label(1.0, &labels), "South");
        assert_eq!(slot_label(0.5, &labels), "");
        assert_eq!(slot_label(-1.0, &labels), "");
        assert_eq!(slot_label(5.0, &labels), "");
    }

    #[test]
    fn test_single_slot_is_centred() {
        assert_eq!(slot_axis(1), -0.5..0.5);
        assert_eq!(slot_axis(0), -0.5..0.5);

        let axis: RangedCoordf64 = slot_axis(1).into();
        assert_eq!(axis.map(&0.0, (100, 300)), 200);
        assert_eq!(axis.map(&-BAR_HALF_WIDTH, (100, 300)), 120);
    }

    #[test]
    fn test_slots_split_axis_evenly() {
        assert_eq!(slot_axis(4), -0.5..3.5);

        let axis: RangedCoordf64 = slot_axis(4).into();
        assert_eq!(axis.map(&0.0, (0, 400)), 50);
        assert_eq!(axis.map(&3.0, (0, 400)), 350);
    }

    #[test]
    fn test_count_labels_skip_fractions() {
        assert_eq!(count_label(0.0), "0");
        assert_eq!(count_label(1.0), "1");
        assert_eq!(count_label(12.0), "12");
        assert_eq!(count_label(0.2), "");
        assert_eq!(count_label(1.5), "");
    }

    #[test]
    fn test_count_ticks() {
        // Three single-count bins: ticks at 0, 1 and 2 at most.
        assert_eq!(count_ticks(1.15), 3);
        assert_eq!(count_ticks(4.6), 6);
        assert_eq!(count_ticks(230.0), 10);
    }
}
