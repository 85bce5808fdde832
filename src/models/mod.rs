//! Data models for the animation pipeline
//!
//! This module organizes the request, series, frame and video structs passed
//! between the input, acquisition, rendering and export stages.

pub mod chart;
pub mod frame;
pub mod request;
pub mod video;

// Re-export commonly used types for convenience
pub use chart::{DailyBar, PricePoint, PriceSeries};
pub use frame::{AxisTick, ChartLayout, FrameSpec, OverlayLayout, TextOverlay, Watermark, YLimits};
pub use request::{AssetClass, ChartRequest, Rgb};
pub use video::{RenderedVideo, FRAME_RATE};
