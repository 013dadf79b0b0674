//! Summary performance metrics for daily return series.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::portfolio::ReturnSeries;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

fn finite(values: &[f64]) -> Array1<f64> {
    Array1::from_iter(values.iter().copied().filter(|r| r.is_finite()))
}

/// Annualized Sharpe ratio of a daily return series (zero risk-free rate).
///
/// Non-finite entries are excluded. NaN when fewer than two usable
/// observations remain or the volatility is zero.
#[must_use]
pub fn sharpe_ratio(returns: &[f64], periods_per_year: usize) -> f64 {
    let valid = finite(returns);
    if valid.len() < 2 {
        return f64::NAN;
    }

    let mean = valid.mean().unwrap_or(0.0);
    let std = valid.std(1.0); // ddof=1 for sample std

    if std == 0.0 {
        f64::NAN
    } else {
        mean / std * (periods_per_year as f64).sqrt()
    }
}

/// Annualized volatility (sample standard deviation) of a daily series.
#[must_use]
pub fn annualized_volatility(returns: &[f64], periods_per_year: usize) -> f64 {
    let valid = finite(returns);
    if valid.len() < 2 {
        return f64::NAN;
    }
    valid.std(1.0) * (periods_per_year as f64).sqrt()
}

/// Maximum peak-to-trough drawdown over a cumulative return series.
#[must_use]
pub fn max_drawdown(cumulative_returns: &[f64]) -> f64 {
    let mut max_dd = 0.0;
    let mut peak = 0.0;

    for &cum in cumulative_returns {
        if cum > peak {
            peak = cum;
        }
        let dd = (peak - cum) / (1.0 + peak);
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Geometric annualized return given a total return over `n_periods`.
#[must_use]
pub fn annualized_return(total_return: f64, n_periods: usize, periods_per_year: usize) -> f64 {
    if n_periods == 0 {
        return f64::NAN;
    }
    let years = n_periods as f64 / periods_per_year as f64;
    (1.0 + total_return).powf(1.0 / years) - 1.0
}

/// One factor's performance summary over its daily return series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Number of daily observations (including empty-policy zeros).
    pub n_obs: usize,
    /// Total compounded return.
    pub total_return: f64,
    /// Geometric annualized return.
    pub annualized_return: f64,
    /// Annualized volatility.
    pub annualized_volatility: f64,
    /// Annualized Sharpe ratio.
    pub sharpe_ratio: f64,
    /// Maximum peak-to-trough drawdown.
    pub max_drawdown: f64,
}

impl SeriesSummary {
    /// Summarizes a daily return series.
    #[must_use]
    pub fn calculate(series: &ReturnSeries, periods_per_year: usize) -> Self {
        let values = series.values();
        let cumulative = series.cumulative();
        let total = series.total_return();
        Self {
            n_obs: values.len(),
            total_return: total,
            annualized_return: annualized_return(total, values.len(), periods_per_year),
            annualized_volatility: annualized_volatility(values, periods_per_year),
            sharpe_ratio: sharpe_ratio(values, periods_per_year),
            max_drawdown: max_drawdown(&cumulative),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use keelung_traits::Date;

    #[test]
    fn test_sharpe_finite_for_mixed_series() {
        let returns = [0.01, -0.005, 0.015, 0.002, -0.003];
        assert!(sharpe_ratio(&returns, TRADING_DAYS_PER_YEAR).is_finite());
    }

    #[test]
    fn test_sharpe_skips_nan_entries() {
        let with_nan = [0.01, f64::NAN, 0.02, -0.01];
        let without = [0.01, 0.02, -0.01];
        assert_relative_eq!(
            sharpe_ratio(&with_nan, 252),
            sharpe_ratio(&without, 252),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sharpe_degenerate_is_nan() {
        assert!(sharpe_ratio(&[0.01], 252).is_nan());
        assert!(sharpe_ratio(&[0.01, 0.01, 0.01], 252).is_nan());
    }

    #[test]
    fn test_max_drawdown() {
        let cumulative = [0.0, 0.10, 0.15, 0.05, 0.08, 0.12];
        let dd = max_drawdown(&cumulative);
        assert_relative_eq!(dd, 0.10 / 1.15, epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown_monotone_series_is_zero() {
        assert_eq!(max_drawdown(&[0.0, 0.05, 0.10]), 0.0);
    }

    #[test]
    fn test_annualized_return() {
        // 21% over two years of 252 days annualizes to 10%.
        let ann = annualized_return(0.21, 504, 252);
        assert_relative_eq!(ann, 0.10, epsilon = 1e-12);
        assert!(annualized_return(0.1, 0, 252).is_nan());
    }

    #[test]
    fn test_summary_of_flat_series() {
        let d = |day| Date::from_ymd_opt(2021, 1, day).unwrap();
        let series = ReturnSeries::new(vec![d(4), d(5), d(6)], vec![0.0, 0.0, 0.0]);
        let summary = SeriesSummary::calculate(&series, 252);
        assert_eq!(summary.n_obs, 3);
        assert_eq!(summary.total_return, 0.0);
        assert_eq!(summary.max_drawdown, 0.0);
        assert!(summary.sharpe_ratio.is_nan());
    }
}
