//! Synthetic panel generation for demo runs.
//!
//! Produces a fully populated [`PanelSet`] from a seeded random walk so the
//! whole factor batch can run end-to-end without any external data.

use std::collections::BTreeSet;

use chrono::Datelike;
use keelung::prelude::*;
use keelung::signals::build_pool;
use keelung::{QuarterlyPanel, Symbol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Parameters for the synthetic market.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticConfig {
    /// Number of calendar months, starting January 2018.
    pub months: u32,
    /// Number of symbols.
    pub symbols: usize,
    /// Universe size for the market-cap pool.
    pub top_n: usize,
    /// RNG seed; equal seeds produce equal panels.
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            months: 36,
            symbols: 40,
            top_n: 20,
            seed: 42,
        }
    }
}

fn weekdays(start: Date, months: u32) -> Vec<Date> {
    let first = Month::from_date(start);
    let mut out = Vec::new();
    let mut date = start;
    loop {
        let month = Month::from_date(date);
        if month >= first + months as i32 {
            break;
        }
        if !matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            out.push(date);
        }
        date = match date.succ_opt() {
            Some(d) => d,
            None => break,
        };
    }
    out
}

/// Generates the complete input bundle for a demo batch run.
pub fn generate(config: &SyntheticConfig) -> PanelSet {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let start = Date::from_ymd_opt(2018, 1, 1).expect("valid start date");
    let days = weekdays(start, config.months);
    let symbols: Vec<Symbol> = (0..config.symbols).map(|i| format!("{:04}", 1101 + i)).collect();

    // Per-symbol random walk parameters.
    let drifts: Vec<f64> = (0..config.symbols)
        .map(|_| rng.gen_range(-0.0005..0.0010))
        .collect();
    let vols: Vec<f64> = (0..config.symbols)
        .map(|_| rng.gen_range(0.005..0.02))
        .collect();
    let shares: Vec<f64> = (0..config.symbols)
        .map(|_| 10f64.powf(rng.gen_range(6.0..9.0)))
        .collect();

    // Daily prices and returns.
    let mut price_obs = Vec::new();
    let mut return_obs = Vec::new();
    let mut levels: Vec<f64> = (0..config.symbols)
        .map(|_| rng.gen_range(20.0..300.0))
        .collect();
    for &day in &days {
        for (i, symbol) in symbols.iter().enumerate() {
            let shock: f64 = rng.gen_range(-1.0..1.0);
            let ret = drifts[i] + vols[i] * shock;
            levels[i] *= 1.0 + ret;
            price_obs.push((day, symbol.clone(), levels[i]));
            return_obs.push((day, symbol.clone(), ret));
        }
    }
    let prices = DailyPanel::from_observations(price_obs);
    let returns = DailyPanel::from_observations(return_obs);

    // Monthly fundamentals keyed off month-end prices.
    let months: Vec<Month> = returns.calendar().months();
    let mut mktcap_obs = Vec::new();
    let mut pe_obs = Vec::new();
    let mut pb_obs = Vec::new();
    let mut beta_obs = Vec::new();
    let mut dy_obs = Vec::new();
    let mut yoy_obs = Vec::new();
    let mut eps_obs = Vec::new();

    let earnings: Vec<f64> = (0..config.symbols)
        .map(|_| rng.gen_range(2.0..12.0))
        .collect();
    let books: Vec<f64> = (0..config.symbols)
        .map(|_| rng.gen_range(10.0..120.0))
        .collect();
    let betas: Vec<f64> = (0..config.symbols)
        .map(|_| rng.gen_range(0.3..1.8))
        .collect();
    let mut eps_levels: Vec<f64> = (0..config.symbols)
        .map(|_| rng.gen_range(1.0..8.0))
        .collect();

    for &month in &months {
        let Some(month_end) = returns.calendar().last_trading_day(month) else {
            continue;
        };
        for (i, symbol) in symbols.iter().enumerate() {
            let Some(price) = prices.value(month_end, symbol) else {
                continue;
            };
            mktcap_obs.push((month, symbol.clone(), price * shares[i]));
            pe_obs.push((month, symbol.clone(), price / earnings[i]));
            pb_obs.push((month, symbol.clone(), price / books[i]));
            beta_obs.push((month, symbol.clone(), betas[i] + rng.gen_range(-0.1..0.1)));
            dy_obs.push((month, symbol.clone(), rng.gen_range(0.0..0.08)));
            yoy_obs.push((month, symbol.clone(), rng.gen_range(-50.0..250.0)));
            eps_levels[i] += rng.gen_range(-0.2..0.3);
            eps_obs.push((month, symbol.clone(), eps_levels[i]));
        }
    }
    let market_cap = MonthlyPanel::from_observations(mktcap_obs);

    // Quarterly margins: announcement rows for the growth rule, a
    // quarter-keyed panel for the surprise rule. Cover one extra year of
    // history so year-over-year deltas resolve.
    let first_year = 2017;
    let last_year = months.last().map_or(first_year, Month::year);
    let margin_bases: Vec<(f64, f64)> = (0..config.symbols)
        .map(|_| (rng.gen_range(0.10..0.45), rng.gen_range(0.02..0.25)))
        .collect();
    let margin_trends: Vec<f64> = (0..config.symbols)
        .map(|_| rng.gen_range(-0.004..0.008))
        .collect();

    let mut gross_obs = Vec::new();
    let mut operating_obs = Vec::new();
    let mut margin_q_obs = Vec::new();
    let mut step = 0;
    for year in first_year..=last_year {
        for qn in 1..=4 {
            let Some(quarter) = Quarter::new(year, qn) else {
                continue;
            };
            for (i, symbol) in symbols.iter().enumerate() {
                let (gross_base, op_base) = margin_bases[i];
                let wobble: f64 = rng.gen_range(-0.01..0.01);
                let gross = gross_base + margin_trends[i] * step as f64 + wobble;
                let operating = op_base + margin_trends[i] * step as f64 + wobble * 0.5;
                let announce = quarter.announce_month();
                gross_obs.push((announce, symbol.clone(), gross));
                operating_obs.push((announce, symbol.clone(), operating));
                margin_q_obs.push((quarter, symbol.clone(), operating));
            }
            step += 1;
        }
    }

    let pool = build_pool(&market_cap, config.top_n, &BTreeSet::new());

    PanelSet::new(returns, pool)
        .with_prices(prices)
        .with_monthly(panel_keys::PE_RATIO, MonthlyPanel::from_observations(pe_obs))
        .with_monthly(panel_keys::PB_RATIO, MonthlyPanel::from_observations(pb_obs))
        .with_monthly(panel_keys::BETA, MonthlyPanel::from_observations(beta_obs))
        .with_monthly(
            panel_keys::DIVIDEND_YIELD,
            MonthlyPanel::from_observations(dy_obs),
        )
        .with_monthly(
            panel_keys::EARNINGS_YOY,
            MonthlyPanel::from_observations(yoy_obs),
        )
        .with_monthly(
            panel_keys::EPS_ESTIMATE,
            MonthlyPanel::from_observations(eps_obs),
        )
        .with_monthly(
            panel_keys::GROSS_MARGIN,
            MonthlyPanel::from_observations(gross_obs),
        )
        .with_monthly(
            panel_keys::OPERATING_MARGIN,
            MonthlyPanel::from_observations(operating_obs),
        )
        .with_quarterly(
            panel_keys::OPERATING_MARGIN_Q,
            QuarterlyPanel::from_observations(margin_q_obs),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_seed_deterministic() {
        let config = SyntheticConfig {
            months: 6,
            symbols: 5,
            top_n: 3,
            seed: 7,
        };
        let a = generate(&config);
        let b = generate(&config);
        assert_eq!(a.returns(), b.returns());
        assert_eq!(
            a.monthly(panel_keys::PE_RATIO).unwrap(),
            b.monthly(panel_keys::PE_RATIO).unwrap()
        );
    }

    #[test]
    fn test_all_standard_panels_present() {
        let inputs = generate(&SyntheticConfig {
            months: 3,
            symbols: 4,
            top_n: 2,
            seed: 1,
        });
        assert!(inputs.prices().is_ok());
        for key in [
            panel_keys::PE_RATIO,
            panel_keys::PB_RATIO,
            panel_keys::BETA,
            panel_keys::DIVIDEND_YIELD,
            panel_keys::EARNINGS_YOY,
            panel_keys::EPS_ESTIMATE,
            panel_keys::GROSS_MARGIN,
            panel_keys::OPERATING_MARGIN,
        ] {
            assert!(inputs.monthly(key).is_ok(), "{key} missing");
        }
        assert!(inputs.quarterly(panel_keys::OPERATING_MARGIN_Q).is_ok());
        assert!(!inputs.pool().is_empty());
    }
}
