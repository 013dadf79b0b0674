//! High year-over-year earnings growth rule.

use std::collections::BTreeMap;

use keelung_panel::HoldingMatrix;
use keelung_traits::{Result, Symbol};
use serde::{Deserialize, Serialize};

use crate::rule::{panel_keys, HoldingRule, PanelSet, Rebalance};
use crate::select;

/// Configuration for the high-YoY-growth rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoyHighConfig {
    /// Key of the monthly YoY growth panel.
    pub panel_key: String,

    /// Fraction of the filtered cross-section to keep (default: 0.30).
    pub top_fraction: f64,

    /// Upper cap on the growth ratio; values above it are treated as data
    /// artifacts and dropped (default: 200, in the panel's units).
    pub cap: f64,

    /// Whether the panel stores percentages (248.84 meaning 248.84%); both
    /// the values and the cap are rescaled by 1/100 (default: true).
    pub percent_units: bool,

    /// Drop non-positive growth before ranking (default: false).
    pub require_positive: bool,
}

impl Default for YoyHighConfig {
    fn default() -> Self {
        Self {
            panel_key: panel_keys::EARNINGS_YOY.to_string(),
            top_fraction: 0.30,
            cap: 200.0,
            percent_units: true,
            require_positive: false,
        }
    }
}

/// High-YoY-growth rule.
///
/// The growth figure for a month is published with delay, so the decision
/// cross-section for holding month m is the panel row at m - 2, while the
/// universe is the pool at m itself. Filters (positivity, cap) run before
/// the fractional cut.
#[derive(Debug, Clone)]
pub struct YoyHigh {
    config: YoyHighConfig,
}

impl YoyHigh {
    /// Creates a YoY-growth rule with the given configuration.
    #[must_use]
    pub const fn new(config: YoyHighConfig) -> Self {
        Self { config }
    }
}

impl Default for YoyHigh {
    fn default() -> Self {
        Self::new(YoyHighConfig::default())
    }
}

impl HoldingRule for YoyHigh {
    fn name(&self) -> &str {
        "yoy_high"
    }

    fn cadence(&self) -> Rebalance {
        Rebalance::Monthly
    }

    fn holdings(&self, inputs: &PanelSet) -> Result<HoldingMatrix> {
        let panel = inputs.monthly(&self.config.panel_key)?;
        let returns = inputs.returns();
        let cal = returns.calendar();
        let mut matrix = HoldingMatrix::empty(cal.clone());

        let scale = if self.config.percent_units { 0.01 } else { 1.0 };
        let cap = self.config.cap * scale;

        for holding in cal.months() {
            let decision = holding - 2;
            let universe = inputs.universe(holding);
            if universe.is_empty() {
                continue;
            }
            let Some(row) = panel.row(decision) else {
                continue;
            };

            let mut scores: BTreeMap<Symbol, f64> = BTreeMap::new();
            for symbol in &universe {
                if let Some(&raw) = row.get(symbol) {
                    let v = raw * scale;
                    if self.config.require_positive && v <= 0.0 {
                        continue;
                    }
                    if v > cap {
                        continue;
                    }
                    scores.insert(symbol.clone(), v);
                }
            }
            if scores.is_empty() {
                continue;
            }

            let picks = select::top_fraction(&scores, self.config.top_fraction);
            matrix.mark_days(cal.days_in_month(holding), &picks);
        }
        Ok(matrix)
    }
}
