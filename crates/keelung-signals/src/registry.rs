//! Factor metadata registry.
//!
//! Metadata is authored, never derived: the registry is the single place
//! that names the standard factors, their categories, cadences and
//! parameters, and it can construct the matching rule set.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dividend_yield::YieldHigh;
use crate::eps::EpsGrowth;
use crate::growth::YoyHigh;
use crate::margin::MarginGrowth;
use crate::momentum::Momentum;
use crate::quantrend::QuanTrend;
use crate::rule::{panel_keys, HoldingRule, Rebalance};
use crate::surprise::MarginSurprise;
use crate::universe::TopPool;
use crate::value::ValueLow;

/// Factor category classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum FactorCategory {
    /// The eligibility pool itself as a baseline.
    #[display("universe")]
    Universe,
    /// Price momentum.
    #[display("momentum")]
    Momentum,
    /// Valuation ratios.
    #[display("value")]
    Value,
    /// Defensive (low-risk) tilts.
    #[display("defensive")]
    Defensive,
    /// Earnings growth.
    #[display("growth")]
    Growth,
    /// Profitability quality.
    #[display("quality")]
    Quality,
    /// Composites combining several dimensions.
    #[display("multi_factor")]
    MultiFactor,
}

impl FactorCategory {
    /// A human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &str {
        match self {
            Self::Universe => "Eligible-universe baselines",
            Self::Momentum => "Price momentum and trend following",
            Self::Value => "Valuation ratios relative to price",
            Self::Defensive => "Low-risk defensive tilts",
            Self::Growth => "Earnings growth",
            Self::Quality => "Profitability and margin quality",
            Self::MultiFactor => "Composites across several dimensions",
        }
    }
}

/// Static, authored metadata for one factor.
#[derive(Debug, Clone, Serialize)]
pub struct FactorMetadata {
    /// Unique factor name; matches the rule's `name()`.
    pub name: &'static str,

    /// Human-readable display name.
    pub display_name: &'static str,

    /// Category classification.
    pub category: FactorCategory,

    /// Rebalance cadence.
    pub rebalance: Rebalance,

    /// Panel keys the factor's default configuration reads.
    pub required_panels: &'static [&'static str],

    /// Whether the factor needs the daily price panel.
    pub requires_prices: bool,

    /// Rule parameters as authored.
    pub params: Value,
}

/// Metadata for every factor in the standard set.
#[must_use]
pub fn registered_factors() -> Vec<FactorMetadata> {
    vec![
        FactorMetadata {
            name: "top_pool",
            display_name: "Top market-cap pool",
            category: FactorCategory::Universe,
            rebalance: Rebalance::Monthly,
            required_panels: &[],
            requires_prices: false,
            params: json!({}),
        },
        FactorMetadata {
            name: "momentum_1m",
            display_name: "Momentum (1-month lookback)",
            category: FactorCategory::Momentum,
            rebalance: Rebalance::Monthly,
            required_panels: &[],
            requires_prices: false,
            params: json!({
                "lookback_months": 1,
                "top_fraction": 0.30,
                "require_positive": true,
            }),
        },
        FactorMetadata {
            name: "momentum_3m",
            display_name: "Momentum (3-month lookback)",
            category: FactorCategory::Momentum,
            rebalance: Rebalance::Monthly,
            required_panels: &[],
            requires_prices: false,
            params: json!({
                "lookback_months": 3,
                "top_fraction": 0.30,
                "require_positive": true,
            }),
        },
        FactorMetadata {
            name: "momentum_6m",
            display_name: "Momentum (6-month lookback)",
            category: FactorCategory::Momentum,
            rebalance: Rebalance::Monthly,
            required_panels: &[],
            requires_prices: false,
            params: json!({
                "lookback_months": 6,
                "top_fraction": 0.30,
                "require_positive": true,
            }),
        },
        FactorMetadata {
            name: "pe_low",
            display_name: "Low price/earnings",
            category: FactorCategory::Value,
            rebalance: Rebalance::Monthly,
            required_panels: &[panel_keys::PE_RATIO],
            requires_prices: false,
            params: json!({
                "bottom_fraction": 0.30,
                "require_positive": true,
            }),
        },
        FactorMetadata {
            name: "pb_low",
            display_name: "Low price/book",
            category: FactorCategory::Value,
            rebalance: Rebalance::Monthly,
            required_panels: &[panel_keys::PB_RATIO],
            requires_prices: false,
            params: json!({
                "bottom_fraction": 0.30,
                "require_positive": true,
            }),
        },
        FactorMetadata {
            name: "beta_low",
            display_name: "Low beta",
            category: FactorCategory::Defensive,
            rebalance: Rebalance::Monthly,
            required_panels: &[panel_keys::BETA],
            requires_prices: false,
            params: json!({
                "bottom_fraction": 0.30,
                "require_positive": true,
            }),
        },
        FactorMetadata {
            name: "yield_high",
            display_name: "High dividend yield",
            category: FactorCategory::Value,
            rebalance: Rebalance::Monthly,
            required_panels: &[panel_keys::DIVIDEND_YIELD],
            requires_prices: false,
            params: json!({
                "top_fraction": 0.30,
                "require_positive": false,
            }),
        },
        FactorMetadata {
            name: "yoy_high",
            display_name: "High earnings growth (YoY)",
            category: FactorCategory::Growth,
            rebalance: Rebalance::Monthly,
            required_panels: &[panel_keys::EARNINGS_YOY],
            requires_prices: false,
            params: json!({
                "top_fraction": 0.30,
                "cap": 200.0,
                "percent_units": true,
                "require_positive": false,
            }),
        },
        FactorMetadata {
            name: "eps_growth",
            display_name: "Estimated EPS growth",
            category: FactorCategory::Growth,
            rebalance: Rebalance::Monthly,
            required_panels: &[panel_keys::EPS_ESTIMATE],
            requires_prices: false,
            params: json!({
                "strict": true,
                "require_positive": true,
            }),
        },
        FactorMetadata {
            name: "quantrend",
            display_name: "Trend composite (price trend, EPS trend, valuation)",
            category: FactorCategory::MultiFactor,
            rebalance: Rebalance::Monthly,
            required_panels: &[panel_keys::EPS_ESTIMATE, panel_keys::PE_RATIO],
            requires_prices: true,
            params: json!({
                "ma_window": 60,
                "n_select": 20,
                "require_positive_pe": true,
            }),
        },
        FactorMetadata {
            name: "margin_growth",
            display_name: "Margin growth (two consecutive quarters)",
            category: FactorCategory::Quality,
            rebalance: Rebalance::Quarterly,
            required_panels: &[panel_keys::GROSS_MARGIN, panel_keys::OPERATING_MARGIN],
            requires_prices: false,
            params: json!({
                "allow_equal": false,
            }),
        },
        FactorMetadata {
            name: "margin_surprise",
            display_name: "Margin surprise index",
            category: FactorCategory::Quality,
            rebalance: Rebalance::Quarterly,
            required_panels: &[panel_keys::OPERATING_MARGIN_Q],
            requires_prices: true,
            params: json!({
                "top_fraction": 0.20,
                "require_positive_margin": false,
            }),
        },
    ]
}

/// Metadata for a specific factor by name.
#[must_use]
pub fn factor_metadata(name: &str) -> Option<FactorMetadata> {
    registered_factors().into_iter().find(|f| f.name == name)
}

/// All factors in a category.
#[must_use]
pub fn factors_by_category(category: FactorCategory) -> Vec<FactorMetadata> {
    registered_factors()
        .into_iter()
        .filter(|f| f.category == category)
        .collect()
}

/// The standard rule set with default configurations, in registry order.
#[must_use]
pub fn standard_rules() -> Vec<Box<dyn HoldingRule>> {
    vec![
        Box::new(TopPool),
        Box::new(Momentum::one_month()),
        Box::new(Momentum::three_month()),
        Box::new(Momentum::six_month()),
        Box::new(ValueLow::pe_low()),
        Box::new(ValueLow::pb_low()),
        Box::new(ValueLow::beta_low()),
        Box::new(YieldHigh::default()),
        Box::new(YoyHigh::default()),
        Box::new(EpsGrowth::default()),
        Box::new(QuanTrend::default()),
        Box::new(MarginGrowth::default()),
        Box::new(MarginSurprise::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thirteen_factors() {
        assert_eq!(registered_factors().len(), 13);
        assert_eq!(standard_rules().len(), 13);
    }

    #[test]
    fn test_rules_match_metadata_names() {
        let names: Vec<&'static str> = registered_factors().iter().map(|f| f.name).collect();
        for (rule, name) in standard_rules().iter().zip(names) {
            assert_eq!(rule.name(), name);
        }
    }

    #[test]
    fn test_cadence_matches_metadata() {
        let metadata = registered_factors();
        for (rule, meta) in standard_rules().iter().zip(&metadata) {
            assert_eq!(rule.cadence(), meta.rebalance, "{}", meta.name);
        }
    }

    #[test]
    fn test_lookup() {
        let info = factor_metadata("margin_surprise").unwrap();
        assert_eq!(info.category, FactorCategory::Quality);
        assert_eq!(info.rebalance, Rebalance::Quarterly);
        assert!(info.requires_prices);
        assert!(factor_metadata("nonexistent").is_none());
    }

    #[test]
    fn test_categories_populated() {
        assert_eq!(factors_by_category(FactorCategory::Momentum).len(), 3);
        assert_eq!(factors_by_category(FactorCategory::Value).len(), 3);
        assert_eq!(factors_by_category(FactorCategory::Quality).len(), 2);
        assert_eq!(factors_by_category(FactorCategory::Universe).len(), 1);
    }

    #[test]
    fn test_metadata_serializes() {
        let text = serde_json::to_string(&registered_factors()).unwrap();
        assert!(text.contains("margin_growth"));
    }
}
