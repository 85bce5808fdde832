//! Frame and layout models shared by the renderer and the exporter

use crate::models::PricePoint;
use crate::models::Rgb;

/// Vertical scale of every frame in a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YLimits {
    pub min: f64,
    pub max: f64,
}

/// A labelled major tick; `value` is in axis units
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTick {
    pub value: f64,
    pub label: String,
}

/// Text drawn at a fixed canvas position.
///
/// `x`/`y` are fractions of the canvas width/height measured from the
/// top-left corner and mark the centre of the text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub overlay: TextOverlay,
    pub color: Rgb,
    pub alpha: f64,
}

/// Overlays computed once per run and drawn unchanged on every frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayLayout {
    pub labels: Vec<TextOverlay>,
    pub watermark: Option<Watermark>,
}

/// Static chart geometry for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Days between the first and last sampled point
    pub x_span: f64,
    pub y_limits: YLimits,
    pub x_ticks: Vec<AxisTick>,
    pub y_ticks: Vec<AxisTick>,
    pub overlays: OverlayLayout,
}

/// What a single video frame shows
#[derive(Debug, Clone, Copy)]
pub struct FrameSpec<'a> {
    pub index: usize,
    pub visible: &'a [PricePoint],
    pub overlays: &'a OverlayLayout,
}

impl<'a> FrameSpec<'a> {
    /// Point the price callout is anchored to
    pub fn last_point(&self) -> Option<&'a PricePoint> {
        self.visible.last()
    }
}
