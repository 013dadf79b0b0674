//! Estimated-EPS rules: month-over-month growth and the direction state
//! machine consumed by the trend composite.

use std::collections::BTreeMap;

use keelung_panel::{HoldingMatrix, MonthlyPanel};
use keelung_traits::{Month, Result, Symbol};
use serde::{Deserialize, Serialize};

use crate::rule::{panel_keys, HoldingRule, PanelSet, Rebalance};

/// Per-identifier EPS trend state at a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpsDirection {
    /// Latest comparable reading increased (or held flat during an
    /// uptrend).
    Up,
    /// Latest comparable reading decreased (or held flat during a
    /// downtrend).
    Down,
    /// No usable comparison: first observation, a missing side, or a flat
    /// reading with no prior direction to carry.
    Unresolved,
}

/// Folds each identifier's EPS estimates into a direction state per month.
///
/// Walking the panel's months in ascending order: an increase versus the
/// previous row sets `Up`, a decrease sets `Down`, an exactly flat reading
/// carries the previous state forward (a flat reading after an uptrend
/// still qualifies as `Up`), and a missing value on either side breaks the
/// chain with `Unresolved`.
#[must_use]
pub fn eps_directions(panel: &MonthlyPanel) -> BTreeMap<Month, BTreeMap<Symbol, EpsDirection>> {
    let months = panel.months();
    let mut out: BTreeMap<Month, BTreeMap<Symbol, EpsDirection>> =
        months.iter().map(|&m| (m, BTreeMap::new())).collect();

    for symbol in panel.symbols() {
        let mut prev_value: Option<f64> = None;
        let mut prev_dir = EpsDirection::Unresolved;
        for &month in &months {
            let value = panel.value(month, &symbol);
            let dir = match (prev_value, value) {
                (Some(p), Some(v)) => {
                    if v > p {
                        EpsDirection::Up
                    } else if v < p {
                        EpsDirection::Down
                    } else {
                        prev_dir
                    }
                }
                _ => EpsDirection::Unresolved,
            };
            if let Some(row) = out.get_mut(&month) {
                row.insert(symbol.clone(), dir);
            }
            prev_value = value;
            prev_dir = dir;
        }
    }
    out
}

/// Configuration for the EPS-growth rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpsGrowthConfig {
    /// Key of the monthly estimated-EPS panel.
    pub panel_key: String,

    /// Require a strict increase (`>`); otherwise `>=` qualifies
    /// (default: true).
    pub strict: bool,

    /// Require both compared readings to be positive (default: true).
    pub require_positive: bool,
}

impl Default for EpsGrowthConfig {
    fn default() -> Self {
        Self {
            panel_key: panel_keys::EPS_ESTIMATE.to_string(),
            strict: true,
            require_positive: true,
        }
    }
}

/// EPS-growth rule: estimated EPS at m - 1 compared against m - 2 decides
/// the holdings for month m (universe: pool at m). Every name passing the
/// comparison is held; there is no top-k cut.
#[derive(Debug, Clone)]
pub struct EpsGrowth {
    config: EpsGrowthConfig,
}

impl EpsGrowth {
    /// Creates an EPS-growth rule with the given configuration.
    #[must_use]
    pub const fn new(config: EpsGrowthConfig) -> Self {
        Self { config }
    }
}

impl Default for EpsGrowth {
    fn default() -> Self {
        Self::new(EpsGrowthConfig::default())
    }
}

impl HoldingRule for EpsGrowth {
    fn name(&self) -> &str {
        "eps_growth"
    }

    fn cadence(&self) -> Rebalance {
        Rebalance::Monthly
    }

    fn holdings(&self, inputs: &PanelSet) -> Result<HoldingMatrix> {
        let panel = inputs.monthly(&self.config.panel_key)?;
        let returns = inputs.returns();
        let cal = returns.calendar();
        let mut matrix = HoldingMatrix::empty(cal.clone());

        for holding in cal.months() {
            let observed = holding - 1;
            let prior = holding - 2;
            let universe = inputs.universe(holding);
            if universe.is_empty() {
                continue;
            }
            let (Some(row_t), Some(row_p)) = (panel.row(observed), panel.row(prior)) else {
                continue;
            };

            let mut passers: Vec<Symbol> = Vec::new();
            for symbol in &universe {
                let (Some(&e_t), Some(&e_p)) = (row_t.get(symbol), row_p.get(symbol)) else {
                    continue;
                };
                if self.config.require_positive && (e_t <= 0.0 || e_p <= 0.0) {
                    continue;
                }
                let grew = if self.config.strict {
                    e_t > e_p
                } else {
                    e_t >= e_p
                };
                if grew {
                    passers.push(symbol.clone());
                }
            }
            if passers.is_empty() {
                continue;
            }

            matrix.mark_days(cal.days_in_month(holding), &passers);
        }
        Ok(matrix)
    }
}
