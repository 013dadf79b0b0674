//! Two-quarter margin growth rule and the quarter-to-daily expansion
//! shared by quarterly factors.

use std::collections::{BTreeMap, BTreeSet};

use keelung_panel::{DailyPanel, HoldingMatrix, QuarterlyPanel, TradingCalendar};
use keelung_traits::{Date, Month, Quarter, Result, Symbol};
use serde::{Deserialize, Serialize};

use crate::rule::{panel_keys, HoldingRule, PanelSet, Rebalance};
use crate::universe::Pool;

/// One resolved quarterly decision: the verdict quarter, the first trading
/// day of its holding window, and the selected names.
#[derive(Debug, Clone)]
pub(crate) struct QuarterDecision {
    pub(crate) start: Date,
    pub(crate) picks: BTreeSet<Symbol>,
}

/// Expands chronologically ordered quarterly decisions into daily holdings.
///
/// Each window runs from the decision's start date to one trading day
/// before the next decision's start (the calendar's last date for the final
/// decision). Inside a window, holdings are recomputed monthly as the
/// decision's picks intersected with the pool of that month: a name can
/// exit mid-window purely by losing universe eligibility even though the
/// quarterly verdict has not changed. Decisions with empty picks still
/// bound the previous window.
pub(crate) fn expand_quarter_decisions(
    decisions: &[QuarterDecision],
    calendar: &TradingCalendar,
    pool: &Pool,
    matrix: &mut HoldingMatrix,
) {
    for (i, decision) in decisions.iter().enumerate() {
        if decision.picks.is_empty() {
            continue;
        }

        let end = if let Some(next) = decisions.get(i + 1) {
            let Some(pos) = calendar.position(next.start) else {
                continue;
            };
            let Some(prev_pos) = pos.checked_sub(1) else {
                continue;
            };
            let Some(end) = calendar.date_at(prev_pos) else {
                continue;
            };
            end
        } else {
            let Some(end) = calendar.last() else {
                continue;
            };
            end
        };
        if end < decision.start {
            continue;
        }

        let mut current: Option<(Month, Vec<&Symbol>)> = None;
        for &day in calendar.range(decision.start, end) {
            let month = Month::from_date(day);
            if current.as_ref().map(|(m, _)| *m) != Some(month) {
                let allowed = pool.members(month).map_or_else(Vec::new, |eligible| {
                    decision.picks.intersection(eligible).collect()
                });
                current = Some((month, allowed));
            }
            if let Some((_, allowed)) = &current {
                for symbol in allowed {
                    matrix.mark(day, symbol);
                }
            }
        }
    }
}

/// Per-quarter growth flags: true at q when the series rose across both
/// q - 2 -> q - 1 and q - 1 -> q (weakly, with `allow_equal`). Flags are only
/// computed for symbols present in the returns panel.
fn growth_flags(
    panel: &QuarterlyPanel,
    returns: &DailyPanel,
    allow_equal: bool,
) -> BTreeMap<Quarter, BTreeSet<Symbol>> {
    let mut flags: BTreeMap<Quarter, BTreeSet<Symbol>> = BTreeMap::new();
    for quarter in panel.quarters() {
        let Some(row) = panel.row(quarter) else {
            continue;
        };
        let mut passers = BTreeSet::new();
        for (symbol, &v0) in row {
            if !returns.has_symbol(symbol) {
                continue;
            }
            let (Some(v1), Some(v2)) = (
                panel.value(quarter - 1, symbol),
                panel.value(quarter - 2, symbol),
            ) else {
                continue;
            };
            let grew = if allow_equal {
                v0 >= v1 && v1 >= v2
            } else {
                v0 > v1 && v1 > v2
            };
            if grew {
                passers.insert(symbol.clone());
            }
        }
        flags.insert(quarter, passers);
    }
    flags
}

/// Configuration for the margin-growth rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginGrowthConfig {
    /// Key of the monthly gross margin announcement panel.
    pub gross_key: String,

    /// Key of the monthly operating margin announcement panel.
    pub operating_key: String,

    /// Accept flat readings inside the growth streak (default: false).
    pub allow_equal: bool,
}

impl Default for MarginGrowthConfig {
    fn default() -> Self {
        Self {
            gross_key: panel_keys::GROSS_MARGIN.to_string(),
            operating_key: panel_keys::OPERATING_MARGIN.to_string(),
            allow_equal: false,
        }
    }
}

/// Margin-growth rule: names whose gross **and** operating margins rose for
/// two consecutive quarters.
///
/// Both announcement panels are aligned to reporting quarters first. The
/// combined verdict is shifted one quarter forward, so the window entered
/// at quarter q's entry month trades on the streak that ended at q - 1,
/// a verdict that is fully published by then. Windows start at the last
/// trading day of the entry month and run to the eve of the next entry;
/// monthly pool intersection applies throughout.
#[derive(Debug, Clone)]
pub struct MarginGrowth {
    config: MarginGrowthConfig,
}

impl MarginGrowth {
    /// Creates a margin-growth rule with the given configuration.
    #[must_use]
    pub const fn new(config: MarginGrowthConfig) -> Self {
        Self { config }
    }
}

impl Default for MarginGrowth {
    fn default() -> Self {
        Self::new(MarginGrowthConfig::default())
    }
}

impl HoldingRule for MarginGrowth {
    fn name(&self) -> &str {
        "margin_growth"
    }

    fn cadence(&self) -> Rebalance {
        Rebalance::Quarterly
    }

    fn holdings(&self, inputs: &PanelSet) -> Result<HoldingMatrix> {
        let gross = QuarterlyPanel::from_monthly_announcements(inputs.monthly(&self.config.gross_key)?);
        let operating =
            QuarterlyPanel::from_monthly_announcements(inputs.monthly(&self.config.operating_key)?);
        let returns = inputs.returns();
        let cal = returns.calendar();
        let mut matrix = HoldingMatrix::empty(cal.clone());

        let gross_flags = growth_flags(&gross, returns, self.config.allow_equal);
        let operating_flags = growth_flags(&operating, returns, self.config.allow_equal);

        let mut quarters: BTreeSet<Quarter> = gross.quarters().into_iter().collect();
        quarters.extend(operating.quarters());

        let mut decisions: Vec<QuarterDecision> = Vec::new();
        for &quarter in &quarters {
            let Some(start) = cal.last_trading_day(quarter.entry_month()) else {
                continue;
            };
            // The verdict entered at this quarter is the streak resolved one
            // quarter earlier.
            let verdict = quarter - 1;
            let picks = match (gross_flags.get(&verdict), operating_flags.get(&verdict)) {
                (Some(g), Some(o)) => g.intersection(o).cloned().collect(),
                _ => BTreeSet::new(),
            };
            decisions.push(QuarterDecision { start, picks });
        }
        decisions.sort_by_key(|d| d.start);

        expand_quarter_decisions(&decisions, cal, inputs.pool(), &mut matrix);
        Ok(matrix)
    }
}
