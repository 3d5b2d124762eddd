//! Multi-method allocation orchestration
//!
//! Runs the configured multiset of allocation methods against one shared
//! problem, discards methods that fail or return an invalid allocation
//! (with a warning), scores the survivors, and picks the best. Methods
//! are independent reads of the shared dataset, so with the `parallel`
//! feature they are evaluated concurrently and joined before the
//! pick-best reduction.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::annealing;
use crate::config::{AllocationConfig, AllocationMethod};
use crate::error::AllocationError;
use crate::greedy;
use crate::nelder_mead;
use crate::problem::AllocationProblem;
use crate::results::{AllocationOutcome, AllocationRun, ResultDatum};

/// Attempts at drawing a valid random starting point before giving up
const MAX_START_TRIES: usize = 1_000;

struct MethodJob {
    label: String,
    method: AllocationMethod,
    seed: u64,
}

/// Run every configured method and return all valid candidates plus the
/// best one. Errors only when the run cannot even start or when every
/// method fails.
pub fn run(
    problem: &AllocationProblem<'_>,
    config: &AllocationConfig,
) -> Result<AllocationRun, AllocationError> {
    if !problem.fungible_budget.is_finite() || problem.fungible_budget < 0.0 {
        return Err(AllocationError::InvalidBudget(problem.fungible_budget));
    }
    if config.methods.is_empty() {
        return Err(AllocationError::NoMethodsRequested);
    }

    let jobs = label_jobs(config);
    debug!(methods = jobs.len(), budget = problem.fungible_budget, "starting allocation run");

    #[cfg(feature = "parallel")]
    let solutions: Vec<Option<Vec<f64>>> = jobs
        .par_iter()
        .map(|job| execute_method(problem, config, job))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let solutions: Vec<Option<Vec<f64>>> = jobs
        .iter()
        .map(|job| execute_method(problem, config, job))
        .collect();

    let mut outcomes = BTreeMap::new();
    let mut scores = BTreeMap::new();
    let mut best: Option<(String, f64)> = None;
    for (job, solution) in jobs.iter().zip(solutions) {
        let Some(allocation) = solution else {
            warn!(method = %job.label, "method produced no valid allocation, discarding");
            continue;
        };
        if !problem.is_valid(&allocation) {
            warn!(method = %job.label, "method result violates the constraints, discarding");
            continue;
        }
        let score = problem.objective_for(&allocation);
        debug!(method = %job.label, score, "method finished");
        let outcome = assemble_outcome(problem, &allocation, score)?;
        if best.as_ref().is_none_or(|(_, b)| score < *b) {
            best = Some((job.label.clone(), score));
        }
        scores.insert(job.label.clone(), score);
        outcomes.insert(job.label.clone(), outcome);
    }

    let Some((best, best_score)) = best else {
        return Err(AllocationError::AllMethodsFailed {
            attempted: jobs.len(),
        });
    };
    let spent_share = outcomes[&best].spent_share(problem.fungible_budget);
    info!(
        method = %best,
        score = best_score,
        spent_share,
        "allocation run finished"
    );

    Ok(AllocationRun {
        best,
        outcomes,
        scores,
    })
}

/// Label each requested method, numbering repeats, and derive a
/// per-method seed so parallel execution stays reproducible.
fn label_jobs(config: &AllocationConfig) -> Vec<MethodJob> {
    let mut totals: FxHashMap<&str, usize> = FxHashMap::default();
    for method in &config.methods {
        *totals.entry(method.label()).or_default() += 1;
    }
    let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
    config
        .methods
        .iter()
        .enumerate()
        .map(|(index, &method)| {
            let base = method.label();
            let count = seen.entry(base).or_default();
            *count += 1;
            let label = if totals[base] > 1 {
                format!("{base} #{count}")
            } else {
                base.to_string()
            };
            MethodJob {
                label,
                method,
                seed: config.seed.wrapping_add(index as u64),
            }
        })
        .collect()
}

fn execute_method(
    problem: &AllocationProblem<'_>,
    config: &AllocationConfig,
    job: &MethodJob,
) -> Option<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(job.seed);
    match job.method {
        AllocationMethod::GreedyForward => {
            greedy::forward(problem, config.greedy_steps, config.caps)
                .map_err(|e| warn!(method = %job.label, error = %e, "greedy search failed"))
                .ok()
        }
        AllocationMethod::GreedyBackward => greedy::backward(problem, config.greedy_steps)
            .map_err(|e| warn!(method = %job.label, error = %e, "greedy search failed"))
            .ok(),
        AllocationMethod::GlobalFromPlanned => annealing::anneal(
            problem,
            problem.planned_start(),
            &config.annealing,
            &mut rng,
        ),
        AllocationMethod::GlobalFromRandom => {
            let start = problem.random_start(&mut rng, MAX_START_TRIES)?;
            annealing::anneal(problem, start, &config.annealing, &mut rng)
        }
        AllocationMethod::LocalFromPlanned => {
            nelder_mead::minimize(problem, problem.planned_start(), &config.nelder_mead)
        }
        AllocationMethod::LocalFromRandom => {
            let start = problem.random_start(&mut rng, MAX_START_TRIES)?;
            nelder_mead::minimize(problem, start, &config.nelder_mead)
        }
    }
}

/// Expand an allocation vector into the full per-country outcome record.
pub(crate) fn assemble_outcome(
    problem: &AllocationProblem<'_>,
    allocation: &[f64],
    score: f64,
) -> Result<AllocationOutcome, AllocationError> {
    let totals: Vec<f64> = allocation
        .iter()
        .zip(&problem.baselines)
        .map(|(x, b)| x + b)
        .collect();
    let results = problem.dataset.results_for_costs(&totals)?;
    let results_by_country: BTreeMap<String, ResultDatum> = problem
        .dataset
        .countries()
        .iter()
        .cloned()
        .zip(results.iter().copied())
        .collect();
    Ok(AllocationOutcome {
        fungible_by_country: problem.dataset.keyed(allocation),
        baseline_by_country: problem.dataset.keyed(&problem.baselines),
        total_by_country: problem.dataset.keyed(&totals),
        results_by_country,
        total: ResultDatum::total(&results),
        objective: score,
    })
}
