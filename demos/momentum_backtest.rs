//! Momentum factor backtest over a synthetic trending market.
//!
//! This example demonstrates:
//! - Building daily return and monthly market-cap panels in memory
//! - Constructing the point-in-time eligibility pool
//! - Running the 6-month momentum rule into a daily holding matrix
//! - Aggregating holdings into an equal-weight portfolio return series

use std::collections::BTreeSet;

use chrono::Datelike;
use keelung::eval::metrics::{SeriesSummary, TRADING_DAYS_PER_YEAR};
use keelung::prelude::*;
use keelung::signals::momentum::Momentum;

/// Stock universe: per-name daily drift in basis points. Positive drifts
/// trend up, negative drifts trend down, so momentum has something to find.
const UNIVERSE: &[(&str, f64)] = &[
    ("1101", 8.0),
    ("1216", 5.0),
    ("2002", 3.0),
    ("2303", 1.0),
    ("2330", -1.0),
    ("2412", -3.0),
    ("2603", -5.0),
    ("2882", -8.0),
];

/// Backtest period.
const START: (i32, u32, u32) = (2020, 1, 1);
const MONTHS: u32 = 24;

/// Universe size for the market-cap pool.
const TOP_N: usize = 6;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let days = weekdays();

    // Daily returns: constant per-name drift plus a deterministic wobble.
    let mut return_obs = Vec::new();
    for (t, &day) in days.iter().enumerate() {
        for (i, &(symbol, drift_bp)) in UNIVERSE.iter().enumerate() {
            let wobble = (0.37 * t as f64 + 1.3 * i as f64).sin() * 0.004;
            let ret = drift_bp / 10_000.0 + wobble;
            return_obs.push((day, symbol.to_string(), ret));
        }
    }
    let returns = DailyPanel::from_observations(return_obs);

    // Monthly market caps: static ranking, largest cap first in the list.
    let mut cap_obs = Vec::new();
    for month in returns.calendar().months() {
        for (i, &(symbol, _)) in UNIVERSE.iter().enumerate() {
            let cap = 1.0e9 * (UNIVERSE.len() - i) as f64;
            cap_obs.push((month, symbol.to_string(), cap));
        }
    }
    let market_cap = MonthlyPanel::from_observations(cap_obs);

    let pool = build_pool(&market_cap, TOP_N, &BTreeSet::new());
    let inputs = PanelSet::new(returns, pool);

    let rule = Momentum::six_month();
    let holdings = rule.holdings(&inputs)?;
    let series = keelung::eval::portfolio_returns(&holdings, inputs.returns(), EmptyPolicy::Zero);
    let stats = SeriesSummary::calculate(&series, TRADING_DAYS_PER_YEAR);

    print_results(&inputs, &holdings, &stats);
    Ok(())
}

/// Weekday trading dates covering the backtest period.
fn weekdays() -> Vec<Date> {
    let start = Date::from_ymd_opt(START.0, START.1, START.2).expect("valid start date");
    let first = Month::from_date(start);
    let mut out = Vec::new();
    let mut date = start;
    while Month::from_date(date) < first + MONTHS as i32 {
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

fn print_results(inputs: &PanelSet, holdings: &HoldingMatrix, stats: &SeriesSummary) {
    let calendar = inputs.returns().calendar();

    println!("\nMomentum Factor (6M)");
    println!("════════════════════");
    println!(
        "Period:     {} to {}",
        calendar.first().map_or_else(String::new, |d| d.to_string()),
        calendar.last().map_or_else(String::new, |d| d.to_string()),
    );
    println!("Universe:   {} names, pool top {}", UNIVERSE.len(), TOP_N);
    println!();

    println!("Performance:");
    println!("  Total Return:    {:+.1}%", stats.total_return * 100.0);
    println!("  Annualized:      {:+.1}%", stats.annualized_return * 100.0);
    println!("  Sharpe Ratio:    {:.2}", stats.sharpe_ratio);
    println!("  Max Drawdown:    {:.1}%", stats.max_drawdown * 100.0);
    println!();

    println!("Month-end holdings:");
    for (month, held) in holdings.monthly_snapshot() {
        let names: Vec<&str> = held.iter().map(String::as_str).collect();
        println!("  {}  {}", month, names.join(" "));
    }
}
