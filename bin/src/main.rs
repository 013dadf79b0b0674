//! Keelung CLI binary.
//!
//! Provides a command-line interface for the Keelung factor engine: list
//! the factor registry, run the full batch over synthetic panels, and
//! inspect monthly holding snapshots.

mod synthetic;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use keelung::eval::metrics::{SeriesSummary, TRADING_DAYS_PER_YEAR};
use keelung::prelude::*;
use keelung::signals::{factors_by_category, FactorCategory, FactorMetadata};
use keelung::BatchOutput;
use std::process;

use synthetic::SyntheticConfig;

#[derive(Parser)]
#[command(name = "keelung")]
#[command(about = "Point-in-time factor signal engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available factors
    Signals {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run the factor batch over synthetic panels
    Run {
        /// Only run the named factor(s)
        #[arg(short, long, value_delimiter = ',')]
        factors: Vec<String>,

        /// Number of calendar months of synthetic history
        #[arg(short, long, default_value = "36")]
        months: u32,

        /// Number of synthetic symbols
        #[arg(short, long, default_value = "40")]
        symbols: usize,

        /// Universe size for the market-cap pool
        #[arg(short = 'n', long, default_value = "20")]
        top_n: usize,

        /// RNG seed for panel generation
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Empty-date policy (zero or undefined)
        #[arg(long, default_value = "zero")]
        policy: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show monthly holding snapshots for one factor
    Holdings {
        /// Factor name
        factor: String,

        /// Number of calendar months of synthetic history
        #[arg(short, long, default_value = "36")]
        months: u32,

        /// Number of synthetic symbols
        #[arg(short, long, default_value = "40")]
        symbols: usize,

        /// Universe size for the market-cap pool
        #[arg(short = 'n', long, default_value = "20")]
        top_n: usize,

        /// RNG seed for panel generation
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Show only the last N months
        #[arg(short, long, default_value = "6")]
        last: usize,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Signals { category, verbose } => {
            list_signals(category, verbose);
        }
        Commands::Run {
            factors,
            months,
            symbols,
            top_n,
            seed,
            policy,
            format,
        } => {
            let config = SyntheticConfig {
                months,
                symbols,
                top_n,
                seed,
            };
            run_factors(&factors, &config, &policy, &format)?;
        }
        Commands::Holdings {
            factor,
            months,
            symbols,
            top_n,
            seed,
            last,
        } => {
            let config = SyntheticConfig {
                months,
                symbols,
                top_n,
                seed,
            };
            show_holdings(&factor, &config, last)?;
        }
    }

    Ok(())
}

fn list_signals(category: Option<String>, verbose: bool) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Available Factors                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let categories = [
        FactorCategory::Universe,
        FactorCategory::Momentum,
        FactorCategory::Value,
        FactorCategory::Defensive,
        FactorCategory::Growth,
        FactorCategory::Quality,
        FactorCategory::MultiFactor,
    ];

    for cat in categories {
        let cat_name = cat.to_string();
        if let Some(ref filter) = category
            && !cat_name.to_lowercase().contains(&filter.to_lowercase())
        {
            continue;
        }

        let cat_factors = factors_by_category(cat);
        if cat_factors.is_empty() {
            continue;
        }

        println!("{} ({}):", cat_name, cat.description());
        println!("{}", "-".repeat(60));

        for factor in cat_factors {
            if verbose {
                println!(
                    "  {:16} - {} [{}]",
                    factor.name, factor.display_name, factor.rebalance
                );
                if !factor.required_panels.is_empty() {
                    println!("  {:16}   panels: {}", "", factor.required_panels.join(", "));
                }
                if factor.requires_prices {
                    println!("  {:16}   needs daily prices", "");
                }
            } else {
                println!("  {}", factor.name);
            }
        }
        println!();
    }

    if !verbose {
        println!("Use --verbose for panel requirements and cadences.\n");
    }
}

fn parse_policy(policy: &str) -> Result<EmptyPolicy> {
    match policy {
        "zero" => Ok(EmptyPolicy::Zero),
        "undefined" => Ok(EmptyPolicy::Undefined),
        other => bail!("unknown empty-date policy '{}' (zero or undefined)", other),
    }
}

fn select_rules(names: &[String]) -> Result<Vec<Box<dyn HoldingRule>>> {
    let all = standard_rules();
    if names.is_empty() {
        return Ok(all);
    }
    let mut picked = Vec::new();
    for name in names {
        let Some(rule) = standard_rules().into_iter().find(|r| r.name() == name) else {
            bail!("unknown factor '{}' (see `keelung signals`)", name);
        };
        picked.push(rule);
    }
    Ok(picked)
}

fn run_factors(
    factors: &[String],
    config: &SyntheticConfig,
    policy: &str,
    format: &str,
) -> Result<()> {
    let policy = parse_policy(policy)?;
    let rules = select_rules(factors)?;

    if format == "text" {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Factor Batch Run                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Panels:   synthetic, seed {}", config.seed);
        println!(
            "History:  {} months, {} symbols, pool top {}",
            config.months, config.symbols, config.top_n
        );
        println!("Factors:  {}", rules.len());
        println!();
    }

    let inputs = synthetic::generate(config);
    let output = run_batch(&inputs, &rules, &BatchConfig { empty_policy: policy });

    match format {
        "json" => print_json(&output)?,
        "text" => print_table(&output),
        other => bail!("unknown output format '{}' (text or json)", other),
    }
    Ok(())
}

fn print_table(output: &BatchOutput) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "{:16} {:>9} {:>9} {:>9} {:>8} {:>8}",
        "Factor", "Total", "Ann.Ret", "Ann.Vol", "Sharpe", "MaxDD"
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for (name, artifact) in &output.factors {
        let summary = SeriesSummary::calculate(&artifact.daily_returns, TRADING_DAYS_PER_YEAR);
        println!(
            "{:16} {:>8.1}% {:>8.1}% {:>8.1}% {:>8.2} {:>7.1}%",
            name,
            summary.total_return * 100.0,
            summary.annualized_return * 100.0,
            summary.annualized_volatility * 100.0,
            summary.sharpe_ratio,
            summary.max_drawdown * 100.0,
        );
    }

    for (name, err) in &output.failures {
        println!("{:16} failed: {}", name, err);
    }
    println!();
}

fn print_json(output: &BatchOutput) -> Result<()> {
    let mut factors = serde_json::Map::new();
    for (name, artifact) in &output.factors {
        let summary = SeriesSummary::calculate(&artifact.daily_returns, TRADING_DAYS_PER_YEAR);
        let metadata = artifact
            .metadata
            .as_ref()
            .map(|meta| serde_json::to_value(meta))
            .transpose()?;
        factors.insert(
            name.clone(),
            serde_json::json!({
                "metadata": metadata,
                "summary": summary,
                "active_days": artifact.holdings.active_dates().len(),
            }),
        );
    }
    let failures: serde_json::Map<String, serde_json::Value> = output
        .failures
        .iter()
        .map(|(name, err)| (name.clone(), serde_json::Value::String(err.to_string())))
        .collect();

    let doc = serde_json::json!({
        "factors": factors,
        "failures": failures,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn show_holdings(factor: &str, config: &SyntheticConfig, last: usize) -> Result<()> {
    let rules = select_rules(&[factor.to_string()])?;
    let meta: Option<FactorMetadata> = keelung::signals::factor_metadata(factor);

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Monthly Holdings                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    if let Some(meta) = meta {
        println!("Factor:   {} ({})", meta.name, meta.display_name);
        println!("Cadence:  {}", meta.rebalance);
    } else {
        println!("Factor:   {}", factor);
    }
    println!();

    let inputs = synthetic::generate(config);
    let output = run_batch(&inputs, &rules, &BatchConfig::default());
    if let Some(err) = output.failures.get(factor) {
        bail!("{}", err);
    }
    let Some(artifact) = output.artifact(factor) else {
        bail!("factor '{}' produced no artifact", factor);
    };

    if artifact.monthly_holdings.is_empty() {
        println!("No month-end holdings over the generated history.");
        return Ok(());
    }

    let skip = artifact.monthly_holdings.len().saturating_sub(last);
    for (month, held) in artifact.monthly_holdings.iter().skip(skip) {
        let names: Vec<&str> = held.iter().map(String::as_str).collect();
        println!("{}  ({:>3} names)  {}", month, held.len(), names.join(" "));
    }
    println!();
    Ok(())
}
