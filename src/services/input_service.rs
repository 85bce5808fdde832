use chrono::NaiveDate;
use tracing::debug;

use crate::commands::generate::GenerateArgs;
use crate::models::ChartRequest;
use crate::utils::color::parse_color;
use crate::utils::dates::{default_range, parse_date};
use crate::utils::errors::GeneratorError;

fn invalid(msg: impl Into<String>) -> GeneratorError {
    GeneratorError::InputValidation(msg.into())
}

/// Blank optional text is treated as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Accept either a fraction in (0, 1] or a percentage in (1, 100]
pub fn parse_chart_height(value: f64) -> Result<f64, GeneratorError> {
    let fraction = if value > 1.0 { value / 100.0 } else { value };
    if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
        return Err(invalid(format!(
            "Chart height {} must be a fraction in (0, 1] or a percentage up to 100",
            value
        )));
    }
    Ok(fraction)
}

/// Apply defaults and validate raw arguments into a `ChartRequest`
pub fn build_request(args: GenerateArgs, today: NaiveDate) -> Result<ChartRequest, GeneratorError> {
    let symbol = args.symbol.trim().to_string();
    if symbol.is_empty() {
        return Err(invalid("Symbol is required"));
    }

    let (default_start, default_end) = default_range(today);
    let start_date = match args.start.as_deref() {
        Some(s) => parse_date("Start date", s)?,
        None => default_start,
    };
    let end_date = match args.end.as_deref() {
        Some(s) => parse_date("End date", s)?,
        None => default_end,
    };
    if end_date < start_date {
        return Err(invalid(format!(
            "End date {} is before start date {}",
            end_date, start_date
        )));
    }

    if args.x_tick_months < 1 {
        return Err(invalid("X tick interval must be at least 1 month"));
    }
    if !args.y_tick.is_finite() || args.y_tick <= 0.0 {
        return Err(invalid(format!(
            "Y tick interval {} must be a positive number",
            args.y_tick
        )));
    }

    let chart_height_fraction = parse_chart_height(args.chart_height)?;
    let watermark_color = parse_color(&args.watermark_color)?;

    let request = ChartRequest {
        symbol,
        asset_class: args.asset_class,
        start_date,
        end_date,
        skip_days: args.skip_days,
        include_start_label: !args.no_start_label,
        include_end_label: !args.no_end_label,
        custom_text: non_blank(args.custom_text),
        watermark_text: non_blank(args.watermark),
        watermark_color,
        x_tick_interval_months: args.x_tick_months,
        y_tick_interval: args.y_tick,
        chart_height_fraction,
        cut_initial_frames: args.cut_initial_frames,
        prefix: args.prefix,
        output_dir: args.output_dir,
        force: args.force,
    };
    debug!("Validated request: {:?}", request);
    Ok(request)
}
