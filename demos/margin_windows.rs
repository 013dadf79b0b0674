//! Quarterly margin-growth windows over a two-year statement history.
//!
//! This example demonstrates:
//! - Building monthly margin announcement panels in memory
//! - Running the margin-growth rule: two consecutive rising quarters on
//!   both the gross and operating series
//! - How the quarterly verdict expands into bounded daily holding windows
//!   (entry at the quarter's entry-month close, exit at the eve of the
//!   next entry)

use std::collections::BTreeSet;

use chrono::Datelike;
use keelung::prelude::*;
use keelung::signals::margin::MarginGrowth;
use keelung::Quarter;

/// Universe: (symbol, per-quarter margin step, peak step index). Margins
/// move by the step each quarter until the peak, then reverse. 1301 rises
/// through the whole history, 2317 peaks at 2020Q4 so its streak breaks
/// mid-history, 2609 falls from the start and never streaks.
const UNIVERSE: &[(&str, f64, i32)] = &[
    ("1301", 0.010, i32::MAX),
    ("2317", 0.004, 7),
    ("2609", -0.006, i32::MAX),
];

/// Backtest period.
const START: (i32, u32, u32) = (2020, 1, 1);
const END: (i32, u32, u32) = (2021, 12, 31);

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let days = weekdays();

    let mut return_obs = Vec::new();
    for &day in &days {
        for &(symbol, _, _) in UNIVERSE {
            return_obs.push((day, symbol.to_string(), 0.0005));
        }
    }
    let returns = DailyPanel::from_observations(return_obs);

    // Statement announcements: each quarter's margins land in its announce
    // month (Q1 in May, Q2 in August, Q3 in November, Q4 next March).
    let mut gross_obs = Vec::new();
    let mut operating_obs = Vec::new();
    for year in 2019..=2021 {
        for qn in 1..=4 {
            let quarter = Quarter::new(year, qn).expect("valid quarter");
            let step = (year - 2019) * 4 + qn as i32 - 1;
            for &(symbol, trend, peak) in UNIVERSE {
                let level = trend * (peak.min(step) - (step - peak.min(step))) as f64;
                let announce = quarter.announce_month();
                gross_obs.push((announce, symbol.to_string(), 0.30 + level));
                operating_obs.push((announce, symbol.to_string(), 0.15 + level));
            }
        }
    }

    // Every name eligible every month: exits below come from the verdict
    // alone, not from universe churn.
    let months = returns.calendar().months();
    let all: BTreeSet<Symbol> = UNIVERSE.iter().map(|&(s, _, _)| s.to_string()).collect();
    let pool = Pool::from_members(months.iter().map(|&m| (m, all.clone())));

    let inputs = PanelSet::new(returns, pool)
        .with_monthly(panel_keys::GROSS_MARGIN, MonthlyPanel::from_observations(gross_obs))
        .with_monthly(
            panel_keys::OPERATING_MARGIN,
            MonthlyPanel::from_observations(operating_obs),
        );

    let holdings = MarginGrowth::default().holdings(&inputs)?;
    print_windows(&inputs, &holdings);
    Ok(())
}

/// Weekday trading dates covering the backtest period.
fn weekdays() -> Vec<Date> {
    let start = Date::from_ymd_opt(START.0, START.1, START.2).expect("valid start date");
    let end = Date::from_ymd_opt(END.0, END.1, END.2).expect("valid end date");
    let mut out = Vec::new();
    let mut date = start;
    while date <= end {
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

fn print_windows(inputs: &PanelSet, holdings: &HoldingMatrix) {
    println!("\nMargin Growth Windows");
    println!("═════════════════════");
    println!("Universe:   {} names, all months eligible", UNIVERSE.len());
    println!();

    for &(symbol, _, _) in UNIVERSE {
        let held: Vec<Date> = inputs
            .returns()
            .calendar()
            .dates()
            .iter()
            .copied()
            .filter(|&d| holdings.is_held(d, symbol))
            .collect();

        println!("{symbol}:");
        if held.is_empty() {
            println!("  never held (no two-quarter streak on both series)");
            continue;
        }
        // Contiguous runs on the trading calendar are distinct windows.
        let calendar = inputs.returns().calendar();
        let mut run_start = held[0];
        let mut prev = held[0];
        for &day in &held[1..] {
            let adjacent = calendar
                .position(prev)
                .and_then(|p| calendar.date_at(p + 1))
                == Some(day);
            if !adjacent {
                println!("  {} to {}", run_start, prev);
                run_start = day;
            }
            prev = day;
        }
        println!("  {} to {}", run_start, prev);
    }
}
