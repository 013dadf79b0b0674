//! Price momentum over a configurable month window.

use std::collections::BTreeMap;

use keelung_panel::HoldingMatrix;
use keelung_traits::{Month, Result, Symbol};
use serde::{Deserialize, Serialize};

use crate::rule::{HoldingRule, PanelSet, Rebalance};
use crate::select;

/// Configuration for the momentum rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Number of months in the lookback window, including the decision
    /// month itself (default: 1).
    pub lookback_months: u32,

    /// Fraction of the scored cross-section to rank into (default: 0.30).
    pub top_fraction: f64,

    /// Keep only names with a positive compounded return, applied **after**
    /// the fractional cut (default: true).
    pub require_positive: bool,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback_months: 1,
            top_fraction: 0.30,
            require_positive: true,
        }
    }
}

/// Momentum rule: geometric compounded daily returns over the months
/// `[m - L + 1, m]` decide the holdings for month m + 1.
///
/// The selection order matters and is deliberate: the top fraction is taken
/// over the full scored cross-section first, and the positive-score filter
/// runs afterwards. A negative-momentum name can therefore occupy a top-k
/// slot that is then discarded, shrinking the final selection below k.
#[derive(Debug, Clone)]
pub struct Momentum {
    name: String,
    config: MomentumConfig,
}

impl Momentum {
    /// Creates a momentum rule; the factor name encodes the lookback.
    #[must_use]
    pub fn new(config: MomentumConfig) -> Self {
        Self {
            name: format!("momentum_{}m", config.lookback_months),
            config,
        }
    }

    /// One-month momentum (the decision month's own return).
    #[must_use]
    pub fn one_month() -> Self {
        Self::new(MomentumConfig::default())
    }

    /// Three-month momentum.
    #[must_use]
    pub fn three_month() -> Self {
        Self::new(MomentumConfig {
            lookback_months: 3,
            ..MomentumConfig::default()
        })
    }

    /// Six-month momentum.
    #[must_use]
    pub fn six_month() -> Self {
        Self::new(MomentumConfig {
            lookback_months: 6,
            ..MomentumConfig::default()
        })
    }

    /// The lookback window length in months.
    #[must_use]
    pub const fn lookback_months(&self) -> u32 {
        self.config.lookback_months
    }
}

impl HoldingRule for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn cadence(&self) -> Rebalance {
        Rebalance::Monthly
    }

    fn holdings(&self, inputs: &PanelSet) -> Result<HoldingMatrix> {
        let returns = inputs.returns();
        let cal = returns.calendar();
        let mut matrix = HoldingMatrix::empty(cal.clone());

        for decision in cal.months() {
            let universe = inputs.universe(decision);
            if universe.is_empty() {
                continue;
            }

            // Lookback window [decision - L + 1, decision], oldest first.
            let window: Vec<Month> = (0..self.config.lookback_months)
                .rev()
                .map(|k| decision - k as i32)
                .collect();

            let mut scores: BTreeMap<Symbol, f64> = BTreeMap::new();
            for symbol in &universe {
                if let Some(score) = returns.compound_return(&window, symbol) {
                    scores.insert(symbol.clone(), score);
                }
            }
            if scores.is_empty() {
                continue;
            }

            // Rank first, filter sign second.
            let ranked = select::top_fraction(&scores, self.config.top_fraction);
            let winners: Vec<Symbol> = ranked
                .into_iter()
                .filter(|s| !self.config.require_positive || scores[s] > 0.0)
                .collect();
            if winners.is_empty() {
                continue;
            }

            matrix.mark_days(cal.days_in_month(decision + 1), &winners);
        }
        Ok(matrix)
    }
}
