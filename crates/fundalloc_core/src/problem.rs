//! The shared allocation problem the optimizers work on
//!
//! An [`AllocationProblem`] bundles the dataset, the objective, the
//! aligned baseline and planned budgets, and the fungible budget. Every
//! allocator sees the same problem and returns an aligned allocation
//! vector of fungible spend per country.

use rand::Rng;

use crate::dataset::PortfolioDataset;
use crate::objective::Objective;

/// Slack allowed on the budget-sum constraint
pub(crate) const BUDGET_TOL: f64 = 1e-5;
/// Penalty added to the objective when an allocation overspends
pub(crate) const OVERSPEND_PENALTY: f64 = 10_000.0;
/// Minimum width of an optimizer bound, so zero-need countries still get
/// a non-degenerate search interval
const MIN_BOUND_WIDTH: f64 = 1e-5;

pub struct AllocationProblem<'a> {
    pub dataset: &'a PortfolioDataset,
    pub objective: &'a dyn Objective,
    /// Non-fungible spend per country, aligned with the dataset order
    pub baselines: Vec<f64>,
    /// Externally planned fungible spend per country, aligned
    pub planned: Vec<f64>,
    /// Total fungible budget to distribute
    pub fungible_budget: f64,
}

impl<'a> AllocationProblem<'a> {
    /// Spend still needed to fully fund country `i` on top of its baseline.
    #[must_use]
    pub fn unmet_need(&self, i: usize) -> f64 {
        (self.dataset.model_at(i).max_cost() - self.baselines[i]).max(0.0)
    }

    /// Total unmet need across the portfolio.
    #[must_use]
    pub fn total_unmet_need(&self) -> f64 {
        (0..self.dataset.len()).map(|i| self.unmet_need(i)).sum()
    }

    /// Per-country search bounds for the continuous optimizers.
    #[must_use]
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        (0..self.dataset.len())
            .map(|i| (0.0, self.unmet_need(i).max(MIN_BOUND_WIDTH)))
            .collect()
    }

    /// Objective score of a fungible allocation, or infinity when a curve
    /// query fails (keeps the optimizers away from invalid regions).
    #[must_use]
    pub fn objective_for(&self, allocation: &[f64]) -> f64 {
        let costs: Vec<f64> = allocation
            .iter()
            .zip(&self.baselines)
            .map(|(x, b)| x + b)
            .collect();
        match self.dataset.results_for_costs(&costs) {
            Ok(results) => self.objective.evaluate(&results),
            Err(_) => f64::INFINITY,
        }
    }

    /// Objective with the budget-sum constraint folded in as a penalty.
    #[must_use]
    pub fn penalized_objective(&self, allocation: &[f64]) -> f64 {
        let mut score = self.objective_for(allocation);
        if allocation.iter().sum::<f64>() > self.fungible_budget + BUDGET_TOL {
            score += OVERSPEND_PENALTY;
        }
        score
    }

    /// Whether an allocation respects the budget and non-negativity.
    #[must_use]
    pub fn is_valid(&self, allocation: &[f64]) -> bool {
        allocation.iter().all(|&x| x >= 0.0)
            && allocation.iter().sum::<f64>() <= self.fungible_budget + BUDGET_TOL
    }

    /// The planned budgets as an optimizer starting point.
    #[must_use]
    pub fn planned_start(&self) -> Vec<f64> {
        self.planned.clone()
    }

    /// A random valid starting point: draw a fraction of each country's
    /// unmet need, then redistribute the surplus or deficit equally so the
    /// draw sums to the budget. Retries until the shifted draw stays within
    /// every country's bounds; returns `None` if no valid draw is found.
    pub fn random_start<R: Rng>(&self, rng: &mut R, max_tries: usize) -> Option<Vec<f64>> {
        let n = self.dataset.len();
        let unmet: Vec<f64> = (0..n).map(|i| self.unmet_need(i)).collect();
        for _ in 0..max_tries {
            let putative: Vec<f64> = unmet.iter().map(|u| u * rng.r#gen::<f64>()).collect();
            let shift = (self.fungible_budget - putative.iter().sum::<f64>()) / n as f64;
            let candidate: Vec<f64> = putative.iter().map(|p| p + shift).collect();
            let in_bounds = candidate
                .iter()
                .zip(&unmet)
                .all(|(&x, &u)| x >= 0.0 && x <= u);
            if in_bounds {
                return Some(candidate);
            }
        }
        None
    }
}
