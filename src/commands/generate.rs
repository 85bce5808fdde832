use clap::Args;
use chrono::Local;
use std::path::PathBuf;
use tracing::info;

use crate::models::AssetClass;
use crate::services::{animation_service, input_service};
use crate::utils::config::Config;
use crate::utils::errors::GeneratorError;

/// Options for `ticker-anim generate`
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Ticker symbol, e.g. AAPL or BTC
    #[arg(long)]
    pub symbol: String,

    #[arg(long, value_enum, default_value_t = AssetClass::Stock)]
    pub asset_class: AssetClass,

    /// First day to include (YYYY-MM-DD). Defaults to 365 days ago
    #[arg(long)]
    pub start: Option<String>,

    /// Last day, exclusive (YYYY-MM-DD). Defaults to yesterday
    #[arg(long)]
    pub end: Option<String>,

    /// Keep every (n+1)th trading day
    #[arg(long, default_value_t = 0)]
    pub skip_days: u32,

    #[arg(long)]
    pub no_start_label: bool,

    #[arg(long)]
    pub no_end_label: bool,

    /// Caption shown under the date labels
    #[arg(long)]
    pub custom_text: Option<String>,

    #[arg(long)]
    pub watermark: Option<String>,

    /// CSS colour name (e.g. steelblue), base letter (r, k, ...) or hex code
    #[arg(long, default_value = "white")]
    pub watermark_color: String,

    #[arg(long, default_value_t = 1)]
    pub x_tick_months: u32,

    #[arg(long, default_value_t = 10.0)]
    pub y_tick: f64,

    /// Fraction of the full height in (0, 1], or a percentage such as 80
    #[arg(long, default_value_t = 1.0)]
    pub chart_height: f64,

    /// Drop the first 10% of frames
    #[arg(long)]
    pub cut_initial_frames: bool,

    /// Output filename prefix
    #[arg(long, default_value = "ticker-anim")]
    pub prefix: String,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Overwrite an existing video
    #[arg(long)]
    pub force: bool,
}

pub async fn execute(args: GenerateArgs, config: &Config) -> Result<String, GeneratorError> {
    let today = Local::now().date_naive();
    let request = input_service::build_request(args, today)?;

    info!(
        "📈 Generating {} animation for {} ({} to {})",
        request.asset_class, request.symbol, request.start_date, request.end_date
    );

    let video = animation_service::generate(request, config).await?;
    info!(
        "✓ {} frames, {:.1}s at {} fps",
        video.frame_count,
        video.duration_secs(),
        video.fps
    );

    Ok(format!(
        "✅ Animation saved successfully as {}",
        video.path.display()
    ))
}
