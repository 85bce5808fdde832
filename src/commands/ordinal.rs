use clap::Args;

use crate::utils::dates::{format_long_date, parse_date};
use crate::utils::errors::GeneratorError;

#[derive(Debug, Clone, Args)]
pub struct OrdinalArgs {
    /// Date to format (YYYY-MM-DD)
    pub date: String,
}

pub fn execute(args: &OrdinalArgs) -> Result<String, GeneratorError> {
    let date = parse_date("Date", &args.date)?;
    Ok(format_long_date(date))
}
