//! Objective functions
//!
//! An [`Objective`] scores a set of per-country outcomes; lower is
//! better. Objectives are plain strategy objects so callers can swap in
//! their own weighting without touching the allocators.

use serde::{Deserialize, Serialize};

use crate::results::ResultDatum;

/// Scores a candidate allocation's per-country outcomes. Lower is better.
pub trait Objective: Send + Sync {
    fn evaluate(&self, results: &[ResultDatum]) -> f64;

    /// Short label for logs and reports
    fn name(&self) -> &str;
}

/// Default objective: total cases and total deaths, each expressed as a
/// multiple of the fully-funded portfolio totals, summed.
///
/// The rescaling keeps the two terms comparable when raw case counts dwarf
/// raw death counts.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceRatioObjective {
    reference: ResultDatum,
}

impl ReferenceRatioObjective {
    /// `reference` is the fully-funded portfolio total the terms are
    /// scaled by.
    pub fn new(reference: ResultDatum) -> Self {
        Self { reference }
    }
}

impl Objective for ReferenceRatioObjective {
    fn evaluate(&self, results: &[ResultDatum]) -> f64 {
        let total = ResultDatum::total(results);
        total.cases / self.reference.cases + total.deaths / self.reference.deaths
    }

    fn name(&self) -> &str {
        "cases+deaths vs fully-funded"
    }
}

/// Alternative objective: total deaths only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeathsObjective;

impl Objective for DeathsObjective {
    fn evaluate(&self, results: &[ResultDatum]) -> f64 {
        ResultDatum::total(results).deaths
    }

    fn name(&self) -> &str {
        "total deaths"
    }
}

/// Alternative objective: total cases only.
#[derive(Debug, Clone, Copy, Default)]
pub struct CasesObjective;

impl Objective for CasesObjective {
    fn evaluate(&self, results: &[ResultDatum]) -> f64 {
        ResultDatum::total(results).cases
    }

    fn name(&self) -> &str {
        "total cases"
    }
}

/// Serializable choice between the built-in objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// [`ReferenceRatioObjective`]
    #[default]
    ReferenceRatio,
    /// [`DeathsObjective`]
    Deaths,
    /// [`CasesObjective`]
    Cases,
}

impl ObjectiveKind {
    /// Build the chosen objective. `reference` is the fully-funded
    /// portfolio total, used by the ratio objective.
    pub fn build(self, reference: ResultDatum) -> Box<dyn Objective> {
        match self {
            ObjectiveKind::ReferenceRatio => Box::new(ReferenceRatioObjective::new(reference)),
            ObjectiveKind::Deaths => Box::new(DeathsObjective),
            ObjectiveKind::Cases => Box::new(CasesObjective),
        }
    }
}
