//! Trend forecaster
//!
//! Extrapolates future monthly expense from historical aggregates with an
//! ordinary-least-squares line. Pure and deterministic; callers supply the
//! aggregate series (see `aggregate::monthly_aggregates`).

use crate::models::MonthlyAggregate;
use crate::stats::{self, LinearFit};

/// Fewer data points than this fall back to the arithmetic mean
const MIN_POINTS_FOR_REGRESSION: usize = 3;

/// Forecasts monthly expense totals
#[derive(Debug, Default, Clone, Copy)]
pub struct TrendForecaster;

impl TrendForecaster {
    pub fn new() -> Self {
        Self
    }

    /// Forecast the expense total `months_ahead` months past the end of the
    /// chronologically ordered series.
    ///
    /// Fewer than 3 points: the mean of the available points (0.0 when
    /// empty). Otherwise an OLS fit over x = 1..N predicted at
    /// x = N + months_ahead. Never negative: a forecast cannot predict
    /// negative spend.
    pub fn forecast(&self, expense_totals: &[f64], months_ahead: u32) -> f64 {
        let months_ahead = months_ahead.max(1);

        if expense_totals.len() < MIN_POINTS_FOR_REGRESSION {
            return stats::mean(expense_totals).max(0.0);
        }

        let points: Vec<(f64, f64)> = expense_totals
            .iter()
            .enumerate()
            .map(|(i, &y)| ((i + 1) as f64, y))
            .collect();

        let predicted = match LinearFit::fit(&points) {
            Some(fit) => fit.predict((expense_totals.len() + months_ahead as usize) as f64),
            // Degenerate fit cannot happen with 3+ distinct x values, but
            // the mean is the right answer if it ever does
            None => stats::mean(expense_totals),
        };

        predicted.max(0.0)
    }

    /// Convenience wrapper over an ordered aggregate series
    pub fn forecast_from_aggregates(
        &self,
        aggregates: &[MonthlyAggregate],
        months_ahead: u32,
    ) -> f64 {
        let series = crate::aggregate::expense_series(aggregates);
        self.forecast(&series, months_ahead)
    }
}
