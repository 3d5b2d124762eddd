//! Global stochastic search over the allocation vector
//!
//! Simulated annealing on the penalized objective: single-coordinate
//! Gaussian proposals clamped to the per-country bounds, Metropolis
//! acceptance, geometric cooling. The budget constraint rides along as a
//! penalty rather than a hard wall, so the walk can cross slightly
//! infeasible territory; only the best feasible point ever seen is
//! returned.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::config::AnnealingOptions;
use crate::problem::AllocationProblem;

/// Anneal from `start`. Returns the best valid allocation found, or
/// `None` when the walk never visited a valid point (the caller treats
/// this as a failed method, not an error).
pub fn anneal<R: Rng>(
    problem: &AllocationProblem<'_>,
    start: Vec<f64>,
    options: &AnnealingOptions,
    rng: &mut R,
) -> Option<Vec<f64>> {
    let bounds = problem.bounds();
    let n = bounds.len();
    if n == 0 {
        return None;
    }

    let mut current = start;
    let mut current_score = problem.penalized_objective(&current);
    let mut best: Option<(Vec<f64>, f64)> = if problem.is_valid(&current) {
        Some((current.clone(), current_score))
    } else {
        None
    };

    let mut temperature = options.initial_temp;
    for iteration in 0..options.max_iterations {
        let i = rng.gen_range(0..n);
        let sigma = options.step_scale * (bounds[i].1 - bounds[i].0);
        let Ok(step) = Normal::new(0.0, sigma.max(f64::MIN_POSITIVE)) else {
            return best.map(|(x, _)| x);
        };

        let mut candidate = current.clone();
        candidate[i] = (candidate[i] + step.sample(rng)).clamp(bounds[i].0, bounds[i].1);
        let candidate_score = problem.penalized_objective(&candidate);

        let delta = candidate_score - current_score;
        if delta <= 0.0 || rng.r#gen::<f64>() < (-delta / temperature).exp() {
            current = candidate;
            current_score = candidate_score;
            let improves = best.as_ref().is_none_or(|(_, b)| current_score < *b);
            if improves && problem.is_valid(&current) {
                best = Some((current.clone(), current_score));
            }
        }

        temperature *= options.cooling_rate;
        if iteration % 5_000 == 0 {
            debug!(iteration, temperature, current_score, "annealing progress");
        }
    }

    best.map(|(x, _)| x)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::dataset::{DatasetOptions, Observation, PortfolioDataset};
    use crate::objective::ReferenceRatioObjective;

    fn dataset() -> PortfolioDataset {
        let mut rows = Vec::new();
        for (country, slope) in [("hivKEN", 2.0), ("tbZMB", 1.0)] {
            for cost in [0.0, 100.0] {
                rows.push(Observation {
                    country: country.to_string(),
                    cost,
                    cases: 300.0 - slope * cost,
                    deaths: 30.0 - slope * cost / 10.0,
                });
            }
        }
        PortfolioDataset::from_observations(rows, DatasetOptions::default()).unwrap()
    }

    #[test]
    fn annealed_solution_is_valid_and_beats_the_start() {
        let ds = dataset();
        let objective = ReferenceRatioObjective::new(ds.reference_totals());
        let problem = AllocationProblem {
            dataset: &ds,
            objective: &objective,
            baselines: vec![0.0, 0.0],
            planned: vec![50.0, 50.0],
            fungible_budget: 100.0,
        };
        let mut rng = StdRng::seed_from_u64(42);
        let start = problem.planned_start();
        let start_score = problem.objective_for(&start);
        let solution = anneal(&problem, start, &AnnealingOptions::default(), &mut rng).unwrap();
        assert!(problem.is_valid(&solution));
        assert!(problem.objective_for(&solution) <= start_score);
    }

    #[test]
    fn annealing_shifts_spend_toward_the_steeper_country() {
        let ds = dataset();
        let objective = ReferenceRatioObjective::new(ds.reference_totals());
        let problem = AllocationProblem {
            dataset: &ds,
            objective: &objective,
            baselines: vec![0.0, 0.0],
            planned: vec![50.0, 50.0],
            fungible_budget: 100.0,
        };
        let mut rng = StdRng::seed_from_u64(7);
        let solution = anneal(
            &problem,
            problem.planned_start(),
            &AnnealingOptions::default(),
            &mut rng,
        )
        .unwrap();
        assert!(solution[0] > solution[1], "{solution:?}");
    }
}
