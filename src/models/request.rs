//! Chart request models

use chrono::NaiveDate;
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;

/// Kind of asset the ticker refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AssetClass {
    Stock,
    Crypto,
}

impl AssetClass {
    /// Capitalised name used in the chart title
    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::Stock => "Stock",
            AssetClass::Crypto => "Crypto",
        }
    }

    /// Lowercase tag used in output filenames
    pub fn tag(&self) -> &'static str {
        match self {
            AssetClass::Stock => "stock",
            AssetClass::Crypto => "crypto",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// 24-bit colour used for the watermark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

/// Everything one animation run needs, built once from user input
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub skip_days: u32,
    pub include_start_label: bool,
    pub include_end_label: bool,
    pub custom_text: Option<String>,
    pub watermark_text: Option<String>,
    pub watermark_color: Rgb,
    pub x_tick_interval_months: u32,
    pub y_tick_interval: f64,
    pub chart_height_fraction: f64,
    pub cut_initial_frames: bool,
    pub prefix: String,
    pub output_dir: PathBuf,
    pub force: bool,
}

#[cfg(test)]
impl ChartRequest {
    /// Request with the form defaults, for tests
    pub fn with_defaults(symbol: &str, asset_class: AssetClass, start: NaiveDate, end: NaiveDate) -> Self {
        ChartRequest {
            symbol: symbol.to_string(),
            asset_class,
            start_date: start,
            end_date: end,
            skip_days: 0,
            include_start_label: true,
            include_end_label: true,
            custom_text: None,
            watermark_text: None,
            watermark_color: Rgb::WHITE,
            x_tick_interval_months: 1,
            y_tick_interval: 10.0,
            chart_height_fraction: 1.0,
            cut_initial_frames: false,
            prefix: "ticker-anim".to_string(),
            output_dir: PathBuf::from("."),
            force: false,
        }
    }
}
