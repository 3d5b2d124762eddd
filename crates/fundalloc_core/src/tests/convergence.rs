//! Agreement between independent search methods

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::AllocationCaps;
use crate::dataset::{DatasetOptions, PortfolioDataset};
use crate::greedy;
use crate::objective::ReferenceRatioObjective;
use crate::problem::AllocationProblem;
use crate::synthetic::synthetic_portfolio;

#[test]
fn forward_and_backward_agree_under_a_saturating_budget() {
    let mut rng = StdRng::seed_from_u64(23);
    let rows = synthetic_portfolio(5, &mut rng);
    let ds = PortfolioDataset::from_observations(rows, DatasetOptions::default()).unwrap();
    let objective = ReferenceRatioObjective::new(ds.reference_totals());

    let n = ds.len();
    let total_need: f64 = (0..n).map(|i| ds.model_at(i).max_cost()).sum();
    let budget = 0.8 * total_need;
    let problem = AllocationProblem {
        dataset: &ds,
        objective: &objective,
        baselines: vec![0.0; n],
        planned: vec![budget / n as f64; n],
        fungible_budget: budget,
    };

    let forward = greedy::forward(&problem, 2_000, AllocationCaps::default()).unwrap();
    let backward = greedy::backward(&problem, 2_000).unwrap();
    let forward_score = problem.objective_for(&forward);
    let backward_score = problem.objective_for(&backward);
    assert!(
        (forward_score - backward_score).abs() / backward_score < 0.02,
        "forward={forward_score} backward={backward_score}"
    );
}

#[test]
fn greedy_search_beats_an_even_split() {
    let mut rng = StdRng::seed_from_u64(31);
    let rows = synthetic_portfolio(5, &mut rng);
    let ds = PortfolioDataset::from_observations(rows, DatasetOptions::default()).unwrap();
    let objective = ReferenceRatioObjective::new(ds.reference_totals());

    let n = ds.len();
    let total_need: f64 = (0..n).map(|i| ds.model_at(i).max_cost()).sum();
    let budget = 0.4 * total_need;
    let even = vec![budget / n as f64; n];
    let problem = AllocationProblem {
        dataset: &ds,
        objective: &objective,
        baselines: vec![0.0; n],
        planned: even.clone(),
        fungible_budget: budget,
    };

    let forward = greedy::forward(&problem, 2_000, AllocationCaps::default()).unwrap();
    assert!(problem.objective_for(&forward) <= problem.objective_for(&even) + 1e-9);
}
