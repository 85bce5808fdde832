//! Price series models

use chrono::NaiveDate;

use crate::utils::errors::GeneratorError;

/// A single daily close on a price chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// One row as returned by the market-data provider
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

/// Date-ascending daily closes for one symbol.
///
/// Dates are strictly increasing and every close is non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from provider rows.
    ///
    /// Rows without a close or with a negative close are dropped. When the
    /// provider repeats a date the last row wins.
    pub fn from_bars(bars: Vec<DailyBar>) -> Self {
        let mut points: Vec<PricePoint> = bars
            .into_iter()
            .filter_map(|bar| match bar.close {
                Some(close) if close.is_finite() && close >= 0.0 => Some(PricePoint {
                    date: bar.date,
                    close,
                }),
                _ => None,
            })
            .collect();

        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self { points: deduped }
    }

    /// Build a series from points that already satisfy the ordering invariant
    pub fn from_points(points: Vec<PricePoint>) -> Result<Self, GeneratorError> {
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(GeneratorError::DataUnavailable(format!(
                    "Price dates are not strictly increasing at {}",
                    pair[1].date
                )));
            }
        }
        if let Some(bad) = points.iter().find(|p| !(p.close >= 0.0)) {
            return Err(GeneratorError::DataUnavailable(format!(
                "Negative or missing close on {}",
                bad.date
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keep every `skip_days + 1`-th point, starting with the first
    pub fn sampled(&self, skip_days: u32) -> PriceSeries {
        let stride = skip_days as usize + 1;
        PriceSeries {
            points: self.points.iter().copied().step_by(stride).collect(),
        }
    }
}
