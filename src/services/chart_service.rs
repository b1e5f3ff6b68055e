use chrono::{DateTime, Utc};
use plotters::coord::ranged1d::Ranged;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::config::{ChartStyle, GridStyle, PanelLayout};
use crate::models::Candle;
use crate::utils::errors::RenderError;
use crate::utils::png::RgbFrame;

type PanelChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const FONT: &str = "sans-serif";
const X_LABELS: usize = 10;
const PRICE_Y_LABELS: usize = 8;
const VOLUME_Y_LABELS: usize = 3;
/// Share of each candle slot covered by the body or volume bar
const BODY_FILL: f64 = 0.7;

/// Draws a windowed candle series into an RGB frame
pub trait ChartRenderer {
    fn render(
        &self,
        candles: &[Candle],
        title: &str,
        style: &ChartStyle,
        layout: &PanelLayout,
    ) -> Result<RgbFrame, RenderError>;
}

/// Bitmap renderer backed by plotters
#[derive(Debug, Default, Clone, Copy)]
pub struct PlottersRenderer;

impl ChartRenderer for PlottersRenderer {
    fn render(
        &self,
        candles: &[Candle],
        title: &str,
        style: &ChartStyle,
        layout: &PanelLayout,
    ) -> Result<RgbFrame, RenderError> {
        if candles.is_empty() {
            return Err(RenderError::EmptySeries);
        }

        let (width, height) = layout.canvas_size();
        let mut pixels = vec![0u8; width as usize * height as usize * 3];

        // The backend borrows the buffer; it is released when this block ends,
        // whether drawing succeeded or not.
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            draw_figure(&root, candles, title, style, layout)?;
            root.present().map_err(drawing_error("render chart"))?;
        }

        debug!("Rendered {} candles on a {}x{} canvas", candles.len(), width, height);

        Ok(RgbFrame {
            pixels,
            width,
            height,
        })
    }
}

/// Title shown above the price panel. `now` is the render time, not data time.
pub fn chart_title(token_name: &str, symbol: &str, timeframe: &str, now: DateTime<Utc>) -> String {
    format!(
        "{} ({}) - {} Candlestick Chart • {}",
        token_name,
        symbol,
        timeframe.to_uppercase(),
        now.format("%Y-%m-%d %H:%M UTC")
    )
}

fn drawing_error<E: std::fmt::Display>(step: &'static str) -> impl FnOnce(E) -> RenderError {
    move |e| RenderError::Drawing(format!("Failed to {}: {}", step, e))
}

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    candles: &[Candle],
    title: &str,
    style: &ChartStyle,
    layout: &PanelLayout,
) -> Result<(), RenderError> {
    let price_bounds = price_bounds(candles)?;
    let volume_bounds = volume_bounds(candles)?;

    root.fill(&style.background)
        .map_err(drawing_error("fill canvas"))?;

    let outer = layout.px(6.0);
    let root = root.margin(outer, outer, outer, outer);

    let title_font = FontDesc::new(
        FontFamily::SansSerif,
        layout.px(style.title.size) as f64,
        if style.title.bold { FontStyle::Bold } else { FontStyle::Normal },
    );
    let body = root
        .titled(title, title_font.color(&style.title.color))
        .map_err(drawing_error("draw title"))?;

    let label_px = layout.px(style.label_size);
    let title_pad = layout.px(style.title.pad);
    let x_label_area = label_px * 3;
    let y_label_area = label_px * 8;
    let side = layout.px(8.0);
    let (left_labels, right_labels) = if style.y_on_right {
        (0, y_label_area)
    } else {
        (y_label_area, 0)
    };

    let (_, body_height) = body.dim_in_pixel();
    let price_plot = layout.price_panel_height(body_height, title_pad + x_label_area);
    let (price_area, volume_area) = body.split_vertically(title_pad + price_plot);
    debug!(
        "Panel layout: body {}px, price plot {}px, title pad {}px",
        body_height, price_plot, title_pad
    );

    let count = candles.len();
    let x_bounds = (-0.5, count as f64 - 0.5);
    let x_ticks = index_ticks(count);

    let label_style = (FONT, label_px as f64);
    let desc_style = (FONT, layout.px(style.label_size + 2.0) as f64);
    let time_format = |x: &f64| time_label(candles, *x);

    // Price panel
    let mut price_chart = ChartBuilder::on(&price_area)
        .margin_top(title_pad)
        .margin_left(side)
        .margin_right(side)
        .x_label_area_size(0)
        .y_label_area_size(left_labels)
        .right_y_label_area_size(right_labels)
        .build_cartesian_2d(x_bounds.0..x_bounds.1, price_bounds.0..price_bounds.1)
        .map_err(drawing_error("build price panel"))?;

    price_chart
        .plotting_area()
        .fill(&style.background)
        .map_err(drawing_error("fill price panel"))?;

    price_chart
        .configure_mesh()
        .disable_mesh()
        .y_labels(PRICE_Y_LABELS)
        .y_label_formatter(&format_price)
        .y_desc(layout.price_label)
        .label_style(label_style)
        .axis_desc_style(desc_style)
        .draw()
        .map_err(drawing_error("draw price axes"))?;

    let price_ticks = value_ticks(price_bounds, PRICE_Y_LABELS);
    draw_grid(&mut price_chart, &x_ticks, &price_ticks, x_bounds, price_bounds, &style.price_grid, layout)?;

    let (plot_width, _) = price_chart.plotting_area().dim_in_pixel();
    let candle_px = candle_width_px(plot_width, count);
    let wick_px = layout.px(0.8);
    let colors = style.colors;

    price_chart
        .draw_series(candles.iter().enumerate().map(|(i, c)| {
            let color = colors.for_direction(c.is_up()).mix(colors.alpha);
            let body_style = color.filled().stroke_width(wick_px);
            CandleStick::new(i as f64, c.open, c.high, c.low, c.close, body_style, body_style, candle_px)
        }))
        .map_err(drawing_error("draw candles"))?;

    draw_spines(&mut price_chart, x_bounds, price_bounds, style, layout)?;

    // Volume panel
    let mut volume_chart = ChartBuilder::on(&volume_area)
        .margin_left(side)
        .margin_right(side)
        .x_label_area_size(x_label_area)
        .y_label_area_size(left_labels)
        .right_y_label_area_size(right_labels)
        .build_cartesian_2d(x_bounds.0..x_bounds.1, volume_bounds.0..volume_bounds.1)
        .map_err(drawing_error("build volume panel"))?;

    volume_chart
        .plotting_area()
        .fill(&style.background)
        .map_err(drawing_error("fill volume panel"))?;

    volume_chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(X_LABELS)
        .x_label_formatter(&time_format)
        .y_labels(VOLUME_Y_LABELS)
        .y_label_formatter(&format_volume)
        .y_desc(layout.volume_label)
        .label_style(label_style)
        .axis_desc_style(desc_style)
        .draw()
        .map_err(drawing_error("draw volume axes"))?;

    let volume_ticks = value_ticks(volume_bounds, VOLUME_Y_LABELS);
    draw_grid(&mut volume_chart, &x_ticks, &volume_ticks, x_bounds, volume_bounds, &style.volume_grid, layout)?;

    let half = BODY_FILL / 2.0;
    volume_chart
        .draw_series(candles.iter().enumerate().map(|(i, c)| {
            let x = i as f64;
            let color = colors.for_direction(c.is_up()).mix(colors.volume_alpha);
            Rectangle::new([(x - half, 0.0), (x + half, c.volume)], color.filled())
        }))
        .map_err(drawing_error("draw volume bars"))?;

    draw_spines(&mut volume_chart, x_bounds, volume_bounds, style, layout)?;

    Ok(())
}

/// Dotted horizontal and vertical grid lines at the given ticks
fn draw_grid<DB: DrawingBackend>(
    chart: &mut PanelChart<'_, DB>,
    x_ticks: &[f64],
    y_ticks: &[f64],
    x_bounds: (f64, f64),
    y_bounds: (f64, f64),
    grid: &GridStyle,
    layout: &PanelLayout,
) -> Result<(), RenderError> {
    let (width_px, height_px) = chart.plotting_area().dim_in_pixel();
    let line = grid.color.mix(grid.alpha).stroke_width(layout.px(grid.width));
    let dot = Dots {
        on: layout.px(grid.width) as f64,
        off: layout.px(grid.width * 1.65).max(2) as f64,
    };

    let mut segments = Vec::new();
    for &x in x_ticks {
        segments.extend(dot.segments((x, y_bounds.0), (x, y_bounds.1), height_px as f64));
    }
    for &y in y_ticks {
        segments.extend(dot.segments((x_bounds.0, y), (x_bounds.1, y), width_px as f64));
    }

    chart
        .draw_series(segments.into_iter().map(|[a, b]| PathElement::new(vec![a, b], line)))
        .map_err(drawing_error("draw grid"))?;

    Ok(())
}

fn draw_spines<DB: DrawingBackend>(
    chart: &mut PanelChart<'_, DB>,
    x_bounds: (f64, f64),
    y_bounds: (f64, f64),
    style: &ChartStyle,
    layout: &PanelLayout,
) -> Result<(), RenderError> {
    let (x0, x1) = x_bounds;
    let (y0, y1) = y_bounds;
    let border = style.spine_color.stroke_width(layout.px(style.spine_width));

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)],
            border,
        )))
        .map_err(drawing_error("draw spines"))?;

    Ok(())
}

/// Dash pattern of a dotted line, in pixels
#[derive(Debug, Clone, Copy)]
struct Dots {
    on: f64,
    off: f64,
}

impl Dots {
    /// Split the line `from..to`, spanning `length_px` on screen, into visible pieces
    fn segments(&self, from: (f64, f64), to: (f64, f64), length_px: f64) -> Vec<[(f64, f64); 2]> {
        let period = self.on + self.off;
        if length_px <= 0.0 || period <= 0.0 {
            return Vec::new();
        }

        let at = |t: f64| (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t);
        let mut out = Vec::new();
        let mut start = 0.0;
        while start < length_px {
            let end = (start + self.on).min(length_px);
            out.push([at(start / length_px), at(end / length_px)]);
            start += period;
        }
        out
    }
}

/// Axis ticks never terminate on an infinite range, so reject it up front
fn finite_range(lower: f64, upper: f64) -> Result<(f64, f64), RenderError> {
    if !(lower.is_finite() && upper.is_finite() && (upper - lower).is_finite()) {
        return Err(RenderError::Drawing(
            "Failed to scale axes: non-finite range".to_string(),
        ));
    }
    Ok((lower, upper))
}

fn price_bounds(candles: &[Candle]) -> Result<(f64, f64), RenderError> {
    let min = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let max = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);

    // Avoid a zero-height axis for flat series
    let padding = (max - min).max(1e-8) * 0.1;
    let lower = if min >= 0.0 { (min - padding).max(0.0) } else { min - padding };
    finite_range(lower, max + padding)
}

fn volume_bounds(candles: &[Candle]) -> Result<(f64, f64), RenderError> {
    let max = candles.iter().map(|c| c.volume).fold(0.0, f64::max);
    if max > 0.0 {
        finite_range(0.0, max * 1.1)
    } else {
        Ok((0.0, 1.0))
    }
}

fn value_ticks(bounds: (f64, f64), count: usize) -> Vec<f64> {
    let axis: RangedCoordf64 = (bounds.0..bounds.1).into();
    axis.key_points(count)
}

/// Candle indices that get an x label and a vertical grid line
fn index_ticks(count: usize) -> Vec<f64> {
    let axis: RangedCoordf64 = (-0.5..count as f64 - 0.5).into();
    axis.key_points(X_LABELS)
        .into_iter()
        .filter_map(|x| candle_index(x, count).map(|i| i as f64))
        .collect()
}

fn candle_index(x: f64, count: usize) -> Option<usize> {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 || rounded as usize >= count {
        return None;
    }
    Some(rounded as usize)
}

fn time_label(candles: &[Candle], x: f64) -> String {
    candle_index(x, candles.len())
        .map(|i| candles[i].time.format("%b %d %H:%M").to_string())
        .unwrap_or_default()
}

fn candle_width_px(plot_width: u32, count: usize) -> u32 {
    let slot = plot_width as f64 / count.max(1) as f64;
    ((slot * BODY_FILL).round() as u32).max(1)
}

fn format_price(value: &f64) -> String {
    let magnitude = value.abs();
    let decimals = if magnitude == 0.0 || magnitude >= 1000.0 {
        2
    } else if magnitude >= 1.0 {
        4
    } else {
        ((-magnitude.log10()).ceil() as usize + 3).min(12)
    };
    format!("{:.*}", decimals, value)
}

fn format_volume(value: &f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if magnitude >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}
