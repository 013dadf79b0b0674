//! Cross-sectional statistics shared by decision rules.

use crate::{KeelungError, Result};

/// Minimum standard deviation below which a cross-section is degenerate.
pub const MIN_STD_THRESHOLD: f64 = 1e-12;

/// Population z-scores for one period's cross-section.
///
/// Uses the population standard deviation (divisor `N`, not `N - 1`): the
/// cross-section at a period is the whole population being ranked, not a
/// sample from one.
///
/// # Errors
///
/// Returns [`KeelungError::DegenerateCrossSection`] when the input is empty
/// or its standard deviation is zero or not finite. Callers recover by
/// yielding no qualifying identifiers for the period.
///
/// # Examples
///
/// ```
/// use keelung_traits::stats::zscore;
///
/// let z = zscore(&[1.0, 2.0, 3.0]).unwrap();
/// assert!(z[1].abs() < 1e-12);
/// assert!(zscore(&[5.0, 5.0, 5.0]).is_err());
/// ```
pub fn zscore(values: &[f64]) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(KeelungError::DegenerateCrossSection(
            "empty score vector".to_string(),
        ));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    if !std.is_finite() || std <= MIN_STD_THRESHOLD {
        return Err(KeelungError::DegenerateCrossSection(format!(
            "standard deviation {std} over {} values",
            values.len()
        )));
    }

    Ok(values.iter().map(|v| (v - mean) / std).collect())
}

/// Arithmetic mean, `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
