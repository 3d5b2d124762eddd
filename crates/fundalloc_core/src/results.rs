//! Value records produced by curve evaluation and allocation runs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Epidemiological outcome at a given spend level
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultDatum {
    pub cases: f64,
    pub deaths: f64,
    pub cost: f64,
}

impl ResultDatum {
    pub fn new(cases: f64, deaths: f64, cost: f64) -> Self {
        Self {
            cases,
            deaths,
            cost,
        }
    }

    /// Component-wise sum over a set of country results
    pub fn total<'a>(results: impl IntoIterator<Item = &'a ResultDatum>) -> Self {
        results.into_iter().fold(Self::default(), |acc, r| Self {
            cases: acc.cases + r.cases,
            deaths: acc.deaths + r.deaths,
            cost: acc.cost + r.cost,
        })
    }
}

/// One fully-evaluated allocation: per-country budget split and outcomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Optimized (fungible) spend per country
    pub fungible_by_country: BTreeMap<String, f64>,
    /// Non-fungible baseline spend per country
    pub baseline_by_country: BTreeMap<String, f64>,
    /// Total spend per country (fungible + baseline)
    pub total_by_country: BTreeMap<String, f64>,
    /// Outcome per country at its total spend
    pub results_by_country: BTreeMap<String, ResultDatum>,
    /// Portfolio-wide totals
    pub total: ResultDatum,
    /// Objective score of this allocation (lower is better)
    pub objective: f64,
}

impl AllocationOutcome {
    /// Fraction of `budget` spent by the fungible allocation
    #[must_use]
    pub fn spent_share(&self, budget: f64) -> f64 {
        if budget <= 0.0 {
            return 0.0;
        }
        self.fungible_by_country.values().sum::<f64>() / budget
    }
}

/// Result of an orchestrated multi-method allocation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRun {
    /// Label of the winning method
    pub best: String,
    /// Every candidate that produced a valid allocation, keyed by method label
    pub outcomes: BTreeMap<String, AllocationOutcome>,
    /// Objective score per candidate (lower is better)
    pub scores: BTreeMap<String, f64>,
}

impl AllocationRun {
    /// The winning candidate's outcome.
    ///
    /// The orchestrator guarantees `best` is a key of `outcomes`.
    #[must_use]
    pub fn best_outcome(&self) -> &AllocationOutcome {
        &self.outcomes[&self.best]
    }
}

/// One row of a cost-fraction vs impact-fraction diagnostic table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledCurvePoint {
    /// Cost as a fraction of the fully-funded cost
    pub cost_fraction: f64,
    /// Cases as a fraction of the fully-funded cases
    pub cases_fraction: f64,
    /// Deaths as a fraction of the fully-funded deaths
    pub deaths_fraction: f64,
}
