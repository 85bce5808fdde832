use chrono::{Datelike, Duration, NaiveDate};

use crate::utils::errors::GeneratorError;

/// English ordinal suffix for a day of the month
pub fn ordinal_suffix(n: u32) -> &'static str {
    if (11..=13).contains(&(n % 100)) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Format a number with its ordinal suffix, e.g. `21` -> `21st`
pub fn ordinal(n: u32) -> String {
    format!("{}{}", n, ordinal_suffix(n))
}

/// Human-readable label such as `January 1st 2024`
pub fn format_long_date(date: NaiveDate) -> String {
    format!("{} {} {}", date.format("%B"), ordinal(date.day()), date.year())
}

/// Parse an ISO `YYYY-MM-DD` date coming from user input
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, GeneratorError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        GeneratorError::InputValidation(format!(
            "{} '{}' is not a valid date (expected YYYY-MM-DD)",
            field, value
        ))
    })
}

/// Default range: from 365 days ago until yesterday
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(365), today - Duration::days(1))
}
