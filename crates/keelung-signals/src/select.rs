//! Cross-sectional selection primitives shared by the decision rules.
//!
//! All rankings are deterministic: scores order first, ties break by symbol
//! ascending, so identical inputs always select identical sets.

use std::collections::BTreeMap;

use keelung_traits::stats;
use keelung_traits::Symbol;

/// Number of names a fractional selection takes: `max(1, ceil(n * fraction))`.
#[must_use]
pub fn fraction_count(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).ceil() as usize).max(1)
}

/// The top `fraction` of the cross-section by score, largest first.
#[must_use]
pub fn top_fraction(scores: &BTreeMap<Symbol, f64>, fraction: f64) -> Vec<Symbol> {
    let k = fraction_count(scores.len(), fraction);
    largest_n(scores, k)
}

/// The bottom `fraction` of the cross-section by score, smallest first.
#[must_use]
pub fn bottom_fraction(scores: &BTreeMap<Symbol, f64>, fraction: f64) -> Vec<Symbol> {
    let k = fraction_count(scores.len(), fraction);
    smallest_n(scores, k)
}

/// The `n` largest-scoring symbols.
#[must_use]
pub fn largest_n(scores: &BTreeMap<Symbol, f64>, n: usize) -> Vec<Symbol> {
    let mut ranked: Vec<(&Symbol, f64)> = scores.iter().map(|(s, &v)| (s, v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(s, _)| s.clone()).collect()
}

/// The `n` smallest-scoring symbols.
#[must_use]
pub fn smallest_n(scores: &BTreeMap<Symbol, f64>, n: usize) -> Vec<Symbol> {
    let mut ranked: Vec<(&Symbol, f64)> = scores.iter().map(|(s, &v)| (s, v)).collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(s, _)| s.clone()).collect()
}

/// Population z-scores of a keyed cross-section.
///
/// `None` when the cross-section is degenerate (empty or zero variance):
/// the period then yields no qualifying identifiers, never a division
/// error.
#[must_use]
pub fn zscore_map(scores: &BTreeMap<Symbol, f64>) -> Option<BTreeMap<Symbol, f64>> {
    let values: Vec<f64> = scores.values().copied().collect();
    let z = stats::zscore(&values).ok()?;
    Some(scores.keys().cloned().zip(z).collect())
}
