//! End-to-end orchestrated allocation runs

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::analysis::Analysis;
use crate::config::{AllocationCaps, AllocationConfig, AllocationMethod, AnnealingOptions};
use crate::dataset::{DatasetOptions, Observation, PortfolioDataset};
use crate::objective::ReferenceRatioObjective;
use crate::problem::AllocationProblem;
use crate::synthetic::synthetic_portfolio;

fn linear_observations(countries: &[&str], slope: f64) -> Vec<Observation> {
    countries
        .iter()
        .flat_map(|country| {
            [0.0, 50.0, 100.0].into_iter().map(|cost| Observation {
                country: country.to_string(),
                cost,
                cases: 300.0 - slope * cost,
                deaths: 30.0 - slope * cost / 10.0,
            })
        })
        .collect()
}

fn zero_budgets(countries: &[&str]) -> BTreeMap<String, f64> {
    countries.iter().map(|c| (c.to_string(), 0.0)).collect()
}

#[test]
fn identical_linear_countries_make_every_split_equivalent() {
    let countries = ["hivKEN", "malariaUGA", "tbZMB"];
    let ds = PortfolioDataset::from_observations(
        linear_observations(&countries, 1.0),
        DatasetOptions::default(),
    )
    .unwrap();
    let objective = ReferenceRatioObjective::new(ds.reference_totals());
    let problem = AllocationProblem {
        dataset: &ds,
        objective: &objective,
        baselines: vec![0.0; 3],
        planned: vec![30.0; 3],
        fungible_budget: 90.0,
    };

    let splits: [[f64; 3]; 3] = [[30.0, 30.0, 30.0], [90.0, 0.0, 0.0], [10.0, 35.0, 45.0]];
    let reference = problem.objective_for(&splits[0]);
    for split in &splits[1..] {
        assert!((problem.objective_for(split) - reference).abs() < 1e-12);
    }
}

#[test]
fn every_surviving_method_returns_a_valid_allocation() {
    let mut rng = StdRng::seed_from_u64(11);
    let rows = synthetic_portfolio(6, &mut rng);
    let ds = PortfolioDataset::from_observations(rows, DatasetOptions::default()).unwrap();

    let countries: Vec<String> = ds.countries().to_vec();
    let baselines: BTreeMap<String, f64> = countries.iter().map(|c| (c.clone(), 0.0)).collect();
    let total_need: f64 = countries
        .iter()
        .map(|c| ds.model(c).unwrap().max_cost())
        .sum();
    let budget = total_need * 0.5;
    let planned: BTreeMap<String, f64> = countries
        .iter()
        .map(|c| (c.clone(), budget / countries.len() as f64))
        .collect();

    let analysis =
        Analysis::with_default_objective(ds, &baselines, &planned, budget).unwrap();
    let config = AllocationConfig {
        greedy_steps: 400,
        annealing: AnnealingOptions {
            max_iterations: 4_000,
            ..Default::default()
        },
        seed: 99,
        ..Default::default()
    };

    let run = analysis.approach_b(&config).unwrap();
    assert!(!run.outcomes.is_empty());
    for (label, outcome) in &run.outcomes {
        let spent: f64 = outcome.fungible_by_country.values().sum();
        assert!(spent <= budget * (1.0 + 1e-6), "{label} overspent: {spent}");
        assert!(
            outcome.fungible_by_country.values().all(|&x| x >= 0.0),
            "{label} allocated a negative amount"
        );
    }
    let best_score = run.scores[&run.best];
    assert!(run.scores.values().all(|s| best_score <= *s));
}

#[test]
fn country_cap_holds_through_the_orchestrator() {
    let countries = ["hivKEN", "tbZMB"];
    let ds = PortfolioDataset::from_observations(
        linear_observations(&countries, 1.0),
        DatasetOptions::default(),
    )
    .unwrap();
    let analysis = Analysis::with_default_objective(
        ds,
        &zero_budgets(&countries),
        &[("hivKEN", 50.0), ("tbZMB", 50.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        100.0,
    )
    .unwrap();

    let config = AllocationConfig {
        methods: vec![AllocationMethod::GreedyForward],
        greedy_steps: 100,
        caps: AllocationCaps {
            max_share_per_country: 0.6,
            ..Default::default()
        },
        ..Default::default()
    };
    let run = analysis.approach_b(&config).unwrap();
    let outcome = run.best_outcome();
    let total: f64 = outcome.fungible_by_country.values().sum();
    let increment = 100.0 / 100.0;
    for (country, spend) in &outcome.fungible_by_country {
        assert!(
            spend / total <= 0.6 + increment / total + 1e-9,
            "{country} holds {spend} of {total}"
        );
    }
}
