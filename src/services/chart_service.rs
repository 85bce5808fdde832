use chrono::{Datelike, Months, NaiveDate};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, FontTransform};
use std::ops::Range;

use crate::models::{
    AxisTick, ChartLayout, ChartRequest, FrameSpec, OverlayLayout, PriceSeries, TextOverlay,
    Watermark, YLimits,
};
use crate::services::price_service::display_symbol;
use crate::utils::dates::format_long_date;
use crate::utils::errors::GeneratorError;

pub const CANVAS_WIDTH: u32 = 720;
pub const BASE_HEIGHT: u32 = 1200;
const MIN_HEIGHT: u32 = 120;

/// Share of leading frames dropped by "cut initial frames"
pub const CUT_FRACTION: f64 = 0.1;

/// Upper bound on y-axis labels per frame
const MAX_Y_TICKS: usize = 100;
const MAX_TICK_DECIMALS: usize = 12;

/// Top of the plotting area as a fraction of canvas height; the label band
/// sits above it.
const PLOT_TOP: f64 = 0.12;

const START_LABEL_Y: f64 = 0.03;
const END_LABEL_Y: f64 = 0.06;
const CUSTOM_TEXT_Y: f64 = 0.09;
const CAPTION_LINE_SPACING: f64 = 0.025;
const LABEL_SIZE: f64 = 18.0;
const WATERMARK_SIZE: f64 = 40.0;
const WATERMARK_ALPHA: f64 = 0.5;

const GRID: RGBColor = RGBColor(64, 64, 64);

/// Canvas size for a chart height fraction.
///
/// The height is rounded up to an even number because the encoder's pixel
/// format needs even dimensions.
pub fn canvas_size(height_fraction: f64) -> (u32, u32) {
    let height = ((BASE_HEIGHT as f64 * height_fraction).round() as u32).max(MIN_HEIGHT);
    (CANVAS_WIDTH, height + height % 2)
}

/// Y-axis range for the whole run: `[min * 0.95, max * 1.05]`
pub fn y_limits(series: &PriceSeries) -> Result<YLimits, GeneratorError> {
    if series.is_empty() {
        return Err(GeneratorError::Render("Cannot scale an empty series".to_string()));
    }
    let min = series.points().iter().map(|p| p.close).fold(f64::INFINITY, f64::min);
    let max = series.points().iter().map(|p| p.close).fold(f64::NEG_INFINITY, f64::max);

    let limits = YLimits {
        min: min * 0.95,
        max: max * 1.05,
    };
    // All-zero series
    if limits.max - limits.min <= f64::EPSILON {
        return Ok(YLimits { min: 0.0, max: 1.0 });
    }
    Ok(limits)
}

/// First-of-month ticks every `interval_months` months within `first..=last`.
///
/// Tick values are day offsets from `first`.
pub fn month_ticks(first: NaiveDate, last: NaiveDate, interval_months: u32) -> Vec<AxisTick> {
    let interval = Months::new(interval_months.max(1));
    let month_start = first.with_day(1).unwrap_or(first);
    let mut tick = if month_start < first {
        month_start.checked_add_months(Months::new(1))
    } else {
        Some(month_start)
    };

    let mut ticks = Vec::new();
    while let Some(date) = tick {
        if date > last {
            break;
        }
        ticks.push(AxisTick {
            value: (date - first).num_days() as f64,
            label: date.format("%Y-%m").to_string(),
        });
        tick = date.checked_add_months(interval);
    }
    ticks
}

/// Fewest decimals that print `step` exactly, so neighbouring labels differ
fn tick_decimals(step: f64) -> usize {
    (0..=MAX_TICK_DECIMALS)
        .find(|&d| {
            let scaled = step * 10f64.powi(d as i32);
            (scaled - scaled.round()).abs() < 1e-6 * scaled.abs().max(1.0)
        })
        .unwrap_or(MAX_TICK_DECIMALS)
}

/// Ticks at multiples of `interval` inside `limits`.
///
/// The interval is widened by whole multiples when it would produce more
/// than `MAX_Y_TICKS` labels.
pub fn value_ticks(limits: YLimits, interval: f64) -> Vec<AxisTick> {
    if !(interval > 0.0) || !interval.is_finite() {
        return Vec::new();
    }
    let span = limits.max - limits.min;
    let factor = (span / MAX_Y_TICKS as f64 / interval).ceil();
    let step = if factor > 1.0 { interval * factor } else { interval };
    if !step.is_finite() || step <= 0.0 {
        return Vec::new();
    }

    let decimals = tick_decimals(step);
    let first = (limits.min / step).ceil() as i64;
    let last = (limits.max / step).floor() as i64;

    (first..=last)
        .take(MAX_Y_TICKS + 1)
        .map(|k| {
            let value = k as f64 * step;
            AxisTick {
                value,
                label: format!("{:.*}", decimals, value),
            }
        })
        .collect()
}

/// Labels and watermark for a request; identical on every frame
pub fn build_overlays(request: &ChartRequest) -> OverlayLayout {
    let centered = |text: String, y: f64, size: f64| TextOverlay { text, x: 0.5, y, size };
    let mut labels = Vec::new();

    if request.include_start_label {
        labels.push(centered(
            format!("Start Date: {}", format_long_date(request.start_date)),
            START_LABEL_Y,
            LABEL_SIZE,
        ));
    }
    if request.include_end_label {
        labels.push(centered(
            format!("End Date: {}", format_long_date(request.end_date)),
            END_LABEL_Y,
            LABEL_SIZE,
        ));
    }
    if let Some(text) = request.custom_text.as_deref() {
        let lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        for (i, line) in lines.enumerate() {
            let y = CUSTOM_TEXT_Y + i as f64 * CAPTION_LINE_SPACING;
            labels.push(centered(line.to_string(), y, LABEL_SIZE));
        }
    }

    let watermark = request
        .watermark_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|text| Watermark {
            overlay: centered(text.to_string(), 0.5, WATERMARK_SIZE),
            color: request.watermark_color,
            alpha: WATERMARK_ALPHA,
        });

    OverlayLayout { labels, watermark }
}

/// Static geometry for animating `series` (already sampled)
pub fn build_layout(request: &ChartRequest, series: &PriceSeries) -> Result<ChartLayout, GeneratorError> {
    let points = series.points();
    if points.len() < 2 {
        return Err(GeneratorError::Render(format!(
            "Not enough price data to animate ({} point(s), need at least 2)",
            points.len()
        )));
    }
    let first = points[0].date;
    let last = points[points.len() - 1].date;

    let (width, height) = canvas_size(request.chart_height_fraction);
    let y_limits = y_limits(series)?;

    Ok(ChartLayout {
        title: format!(
            "{} Ticker: {}",
            request.asset_class.label(),
            display_symbol(&request.symbol)
        ),
        width,
        height,
        x_span: (last - first).num_days() as f64,
        y_limits,
        x_ticks: month_ticks(first, last, request.x_tick_interval_months),
        y_ticks: value_ticks(y_limits, request.y_tick_interval),
        overlays: build_overlays(request),
    })
}

/// Indices of the frames to emit for a sampled series of `len` points.
///
/// Frame `i` shows points `0..=i`. With `cut_initial` the first 10% of
/// frames are dropped.
pub fn frame_range(len: usize, cut_initial: bool) -> Range<usize> {
    let skipped = if cut_initial {
        (len as f64 * CUT_FRACTION).floor() as usize
    } else {
        0
    };
    skipped..len
}

/// Callout text for the latest price
pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

/// Draws single frames into RGB24 buffers
pub trait FrameRenderer {
    fn dimensions(&self) -> (u32, u32);
    fn render(&self, frame: &FrameSpec<'_>, buffer: &mut [u8]) -> Result<(), GeneratorError>;
}

/// Dark-theme line chart renderer backed by plotters
pub struct PlottersRenderer {
    layout: ChartLayout,
    first_date: NaiveDate,
}

fn render_err<E: std::fmt::Display>(action: &'static str) -> impl Fn(E) -> GeneratorError {
    move |e| GeneratorError::Render(format!("Failed to {}: {}", action, e))
}

impl PlottersRenderer {
    pub fn new(layout: ChartLayout, first_date: NaiveDate) -> Self {
        Self { layout, first_date }
    }

    pub fn layout(&self) -> &ChartLayout {
        &self.layout
    }

    fn x_of(&self, date: NaiveDate) -> f64 {
        (date - self.first_date).num_days() as f64
    }
}

impl FrameRenderer for PlottersRenderer {
    fn dimensions(&self) -> (u32, u32) {
        (self.layout.width, self.layout.height)
    }

    fn render(&self, frame: &FrameSpec<'_>, buffer: &mut [u8]) -> Result<(), GeneratorError> {
        let layout = &self.layout;
        let (width, height) = (layout.width, layout.height);
        let expected = width as usize * height as usize * 3;
        if buffer.len() != expected {
            return Err(GeneratorError::Render(format!(
                "Frame buffer holds {} bytes, expected {}",
                buffer.len(),
                expected
            )));
        }

        let root = BitMapBackend::with_buffer(buffer, (width, height)).into_drawing_area();
        root.fill(&BLACK).map_err(render_err("fill canvas"))?;

        let YLimits { min, max } = layout.y_limits;
        let mut chart = ChartBuilder::on(&root)
            .caption(&layout.title, ("sans-serif", 28.0).into_font().color(&WHITE))
            .margin_top((height as f64 * PLOT_TOP) as u32)
            .margin_left(90)
            .margin_right(30)
            .margin_bottom(70)
            .build_cartesian_2d(0f64..layout.x_span, min..max)
            .map_err(render_err("build chart"))?;

        // Grid
        chart
            .draw_series(
                layout
                    .x_ticks
                    .iter()
                    .map(|t| PathElement::new(vec![(t.value, min), (t.value, max)], GRID)),
            )
            .map_err(render_err("draw x grid"))?;
        chart
            .draw_series(
                layout
                    .y_ticks
                    .iter()
                    .map(|t| PathElement::new(vec![(0.0, t.value), (layout.x_span, t.value)], GRID)),
            )
            .map_err(render_err("draw y grid"))?;

        // Axes
        chart
            .draw_series(vec![
                PathElement::new(vec![(0.0, min), (0.0, max)], WHITE),
                PathElement::new(vec![(0.0, min), (layout.x_span, min)], WHITE),
            ])
            .map_err(render_err("draw axes"))?;

        let tick_font = ("sans-serif", 14.0).into_font().color(&WHITE);
        for tick in &layout.x_ticks {
            let (px, py) = chart.backend_coord(&(tick.value, min));
            root.draw(&Text::new(
                tick.label.clone(),
                (px, py + 8),
                tick_font.pos(Pos::new(HPos::Center, VPos::Top)),
            ))
            .map_err(render_err("draw x tick label"))?;
        }
        for tick in &layout.y_ticks {
            let (px, py) = chart.backend_coord(&(0.0, tick.value));
            root.draw(&Text::new(
                tick.label.clone(),
                (px - 8, py),
                tick_font.pos(Pos::new(HPos::Right, VPos::Center)),
            ))
            .map_err(render_err("draw y tick label"))?;
        }

        let axis_font = ("sans-serif", 16.0).into_font().color(&WHITE);
        let (px, py) = chart.backend_coord(&(layout.x_span / 2.0, min));
        root.draw(&Text::new(
            "Date",
            (px, py + 36),
            axis_font.pos(Pos::new(HPos::Center, VPos::Top)),
        ))
        .map_err(render_err("draw x axis title"))?;
        let (px, py) = chart.backend_coord(&(0.0, (min + max) / 2.0));
        root.draw(&Text::new(
            "Price",
            (px - 70, py),
            axis_font
                .transform(FontTransform::Rotate270)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        ))
        .map_err(render_err("draw y axis title"))?;

        // Price line up to this frame
        chart
            .draw_series(LineSeries::new(
                frame.visible.iter().map(|p| (self.x_of(p.date), p.close)),
                GREEN.stroke_width(2),
            ))
            .map_err(render_err("draw price line"))?;

        if let Some(last) = frame.last_point() {
            let (px, py) = chart.backend_coord(&(self.x_of(last.date), last.close));
            let label = format_price(last.close);
            let callout_font = ("sans-serif", 18.0)
                .into_font()
                .style(FontStyle::Bold)
                .color(&BLACK);
            let (text_w, text_h) = root
                .estimate_text_size(&label, &callout_font)
                .map_err(render_err("measure price label"))?;

            let pad = 6;
            let right = px.max(text_w as i32 + 2 * pad);
            let left = right - text_w as i32 - 2 * pad;
            let top = py - text_h as i32 / 2 - pad;
            let bottom = py + text_h as i32 / 2 + pad;
            root.draw(&Rectangle::new([(left, top), (right, bottom)], YELLOW.filled()))
                .map_err(render_err("draw price box"))?;
            root.draw(&Rectangle::new([(left, top), (right, bottom)], WHITE))
                .map_err(render_err("draw price box border"))?;
            root.draw(&Text::new(
                label,
                ((left + right) / 2, py),
                callout_font.pos(Pos::new(HPos::Center, VPos::Center)),
            ))
            .map_err(render_err("draw price label"))?;
        }

        // Fixed overlays
        let at = |o: &TextOverlay| ((o.x * width as f64) as i32, (o.y * height as f64) as i32);
        for label in &frame.overlays.labels {
            root.draw(&Text::new(
                label.text.clone(),
                at(label),
                ("sans-serif", label.size)
                    .into_font()
                    .color(&WHITE)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            ))
            .map_err(render_err("draw label"))?;
        }
        if let Some(mark) = &frame.overlays.watermark {
            let color = RGBColor(mark.color.0, mark.color.1, mark.color.2).mix(mark.alpha);
            root.draw(&Text::new(
                mark.overlay.text.clone(),
                at(&mark.overlay),
                ("sans-serif", mark.overlay.size)
                    .into_font()
                    .style(FontStyle::Bold)
                    .color(&color)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            ))
            .map_err(render_err("draw watermark"))?;
        }

        root.present().map_err(render_err("render frame"))?;
        Ok(())
    }
}
