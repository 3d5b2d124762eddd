//! Analysis boundary
//!
//! An [`Analysis`] binds a dataset, the two budget layers, the fungible
//! budget, and an objective, then answers the two headline questions:
//! what do the planned budgets buy as-is (approach A), and what is the
//! best reallocation of the fungible budget (approach B).

use std::collections::BTreeMap;

use tracing::warn;

use crate::config::AllocationConfig;
use crate::dataset::PortfolioDataset;
use crate::error::{AllocationError, DatasetError};
use crate::objective::{Objective, ReferenceRatioObjective};
use crate::orchestrator;
use crate::problem::AllocationProblem;
use crate::results::{AllocationOutcome, AllocationRun};

pub struct Analysis {
    dataset: PortfolioDataset,
    baselines: Vec<f64>,
    planned: Vec<f64>,
    fungible_budget: f64,
    objective: Box<dyn Objective>,
}

impl Analysis {
    /// Bind the inputs together. Budget maps must cover exactly the
    /// dataset's countries. Baselines outside a country's observed cost
    /// range are kept but warned about, since every query then depends on
    /// the out-of-bounds policy.
    pub fn new(
        dataset: PortfolioDataset,
        baselines: &BTreeMap<String, f64>,
        planned: &BTreeMap<String, f64>,
        fungible_budget: f64,
        objective: Box<dyn Objective>,
    ) -> Result<Self, DatasetError> {
        let baselines = dataset.aligned(baselines)?;
        let planned = dataset.aligned(planned)?;

        for (i, country) in dataset.countries().iter().enumerate() {
            let model = dataset.model_at(i);
            if baselines[i] < model.min_cost() || baselines[i] > model.max_cost() {
                warn!(
                    %country,
                    baseline = baselines[i],
                    min_cost = model.min_cost(),
                    max_cost = model.max_cost(),
                    "non-fungible baseline outside the observed cost range"
                );
            }
        }

        Ok(Self {
            dataset,
            baselines,
            planned,
            fungible_budget,
            objective,
        })
    }

    /// [`Analysis::new`] with the standard cases-plus-deaths objective,
    /// scaled by the dataset's fully-funded totals.
    pub fn with_default_objective(
        dataset: PortfolioDataset,
        baselines: &BTreeMap<String, f64>,
        planned: &BTreeMap<String, f64>,
        fungible_budget: f64,
    ) -> Result<Self, DatasetError> {
        let objective = Box::new(ReferenceRatioObjective::new(dataset.reference_totals()));
        Self::new(dataset, baselines, planned, fungible_budget, objective)
    }

    #[must_use]
    pub fn dataset(&self) -> &PortfolioDataset {
        &self.dataset
    }

    #[must_use]
    pub fn fungible_budget(&self) -> f64 {
        self.fungible_budget
    }

    fn problem(&self) -> AllocationProblem<'_> {
        AllocationProblem {
            dataset: &self.dataset,
            objective: self.objective.as_ref(),
            baselines: self.baselines.clone(),
            planned: self.planned.clone(),
            fungible_budget: self.fungible_budget,
        }
    }

    /// Evaluate the externally planned fungible budgets without any
    /// optimization.
    pub fn approach_a(&self) -> Result<AllocationOutcome, AllocationError> {
        let problem = self.problem();
        let score = problem.objective_for(&self.planned);
        orchestrator::assemble_outcome(&problem, &self.planned, score)
    }

    /// Optimize the fungible budget with the configured methods and
    /// return every valid candidate plus the best.
    pub fn approach_b(&self, config: &AllocationConfig) -> Result<AllocationRun, AllocationError> {
        orchestrator::run(&self.problem(), config)
    }
}
