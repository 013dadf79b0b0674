//! Batch evaluation: every factor computed independently over one shared
//! input set, with per-factor failure isolation.

use std::collections::{BTreeMap, BTreeSet};

use keelung_panel::HoldingMatrix;
use keelung_signals::{factor_metadata, FactorMetadata, HoldingRule, PanelSet};
use keelung_traits::{KeelungError, Month, Symbol};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::portfolio::{portfolio_returns, EmptyPolicy, ReturnSeries};

/// Configuration for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// How dates with no holdings enter the return series.
    pub empty_policy: EmptyPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            empty_policy: EmptyPolicy::Zero,
        }
    }
}

/// Everything the batch produces for one factor.
#[derive(Debug, Clone)]
pub struct FactorArtifact {
    /// Registry metadata, when the factor name is registered.
    pub metadata: Option<FactorMetadata>,

    /// The daily 0/1 holding matrix.
    pub holdings: HoldingMatrix,

    /// The daily equal-weight portfolio return series.
    pub daily_returns: ReturnSeries,

    /// Holding set at the last trading day of each month, for reporting.
    pub monthly_holdings: BTreeMap<Month, BTreeSet<Symbol>>,
}

/// The read-only result map of a batch run.
#[derive(Debug)]
pub struct BatchOutput {
    /// Successful factors, keyed by factor name.
    pub factors: BTreeMap<String, FactorArtifact>,

    /// Factors whose computation failed, keyed by factor name. A failure
    /// here never prevented the other factors from completing.
    pub failures: BTreeMap<String, KeelungError>,
}

impl BatchOutput {
    /// The artifact for `name`, if its computation succeeded.
    #[must_use]
    pub fn artifact(&self, name: &str) -> Option<&FactorArtifact> {
        self.factors.get(name)
    }

    /// Names of all successfully computed factors, ascending.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factors.keys().map(String::as_str).collect()
    }
}

/// Runs every rule over the shared inputs and aggregates the outputs.
///
/// Rules are pure and the inputs immutable, so the fan-out runs in
/// parallel with read-only sharing. Each factor is an independent unit of
/// failure: a missing panel aborts only that factor and lands in
/// [`BatchOutput::failures`]. A factor with no viable decision period
/// yields an all-zero matrix and a flat series, not a failure.
#[must_use]
pub fn run_batch(
    inputs: &PanelSet,
    rules: &[Box<dyn HoldingRule>],
    config: &BatchConfig,
) -> BatchOutput {
    let computed: Vec<(String, keelung_traits::Result<HoldingMatrix>)> = rules
        .par_iter()
        .map(|rule| (rule.name().to_string(), rule.holdings(inputs)))
        .collect();

    let mut factors = BTreeMap::new();
    let mut failures = BTreeMap::new();
    for (name, result) in computed {
        match result {
            Ok(holdings) => {
                let daily_returns =
                    portfolio_returns(&holdings, inputs.returns(), config.empty_policy);
                let monthly_holdings = holdings.monthly_snapshot();
                factors.insert(
                    name.clone(),
                    FactorArtifact {
                        metadata: factor_metadata(&name),
                        holdings,
                        daily_returns,
                        monthly_holdings,
                    },
                );
            }
            Err(err) => {
                failures.insert(name, err);
            }
        }
    }
    BatchOutput { factors, failures }
}
