//! Greedy allocation search
//!
//! Both directions walk pre-materialized per-country ladders of equally
//! spaced spend levels. The forward search starts at the baseline spend
//! and repeatedly gives one increment to whichever country improves the
//! objective most; the backward search starts fully funded and repeatedly
//! withdraws one increment from whichever country worsens the objective
//! least. Ties break toward the first country in sorted order.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::config::{AllocationCaps, split_country_key};
use crate::error::AllocationError;
use crate::problem::AllocationProblem;
use crate::results::ResultDatum;

/// Build the allocation up from nothing, one increment at a time.
pub fn forward(
    problem: &AllocationProblem<'_>,
    steps: usize,
    caps: AllocationCaps,
) -> Result<Vec<f64>, AllocationError> {
    let n = problem.dataset.len();
    let budget = problem.fungible_budget;
    if budget <= 0.0 {
        return Ok(vec![0.0; n]);
    }
    let increment = budget / steps.max(1) as f64;

    let ladders = build_ladders(problem, increment, LadderDirection::Up)?;
    let mut cursors = vec![0usize; n];
    let mut allocation = vec![0.0; n];
    let mut spent = 0.0;

    // The half-increment margin keeps float noise in the running total
    // from buying one increment too many.
    while spent < budget - 0.5 * increment {
        let excluded = if caps.is_active() {
            capped_countries(&allocation, problem.dataset.countries(), caps)
        } else {
            vec![false; n]
        };
        let Some(i) = best_step(problem, &ladders, &cursors, &excluded) else {
            debug!("forward search exhausted all ladders before spending the budget");
            break;
        };
        allocation[i] += increment;
        spent += increment;
        cursors[i] += 1;
    }

    Ok(allocation)
}

/// Start from full funding and withdraw spend until the budget is met.
///
/// When the budget already covers every country's unmet need there is
/// nothing to withdraw; the full-funding allocation is returned as-is,
/// under-spending the budget.
pub fn backward(
    problem: &AllocationProblem<'_>,
    steps: usize,
) -> Result<Vec<f64>, AllocationError> {
    let n = problem.dataset.len();
    let mut allocation: Vec<f64> = (0..n).map(|i| problem.unmet_need(i)).collect();

    let surplus = allocation.iter().sum::<f64>() - problem.fungible_budget;
    if surplus <= 0.0 {
        warn!(
            budget = problem.fungible_budget,
            unmet_need = allocation.iter().sum::<f64>(),
            "budget covers all unmet need, returning full funding (budget under-spent)"
        );
        return Ok(allocation);
    }
    let decrement = surplus / steps.max(1) as f64;

    let ladders = build_ladders(problem, -decrement, LadderDirection::Down)?;
    let mut cursors = vec![0usize; n];

    while allocation.iter().sum::<f64>() > problem.fungible_budget {
        let excluded = vec![false; n];
        let Some(i) = best_step(problem, &ladders, &cursors, &excluded) else {
            debug!("backward search exhausted all ladders before reaching the budget");
            break;
        };
        allocation[i] -= decrement;
        cursors[i] += 1;
    }

    Ok(allocation)
}

enum LadderDirection {
    /// From the baseline spend up toward full funding
    Up,
    /// From full funding down toward the baseline spend
    Down,
}

/// Pre-evaluate each country's outcome at every spend level the search can
/// visit. The far end of each ladder is exclusive, exactly like the spend
/// levels an increment-at-a-time walk can actually reach.
fn build_ladders(
    problem: &AllocationProblem<'_>,
    step: f64,
    direction: LadderDirection,
) -> Result<Vec<Vec<ResultDatum>>, AllocationError> {
    let n = problem.dataset.len();
    let mut ladders = Vec::with_capacity(n);
    for i in 0..n {
        let model = problem.dataset.model_at(i);
        let baseline = problem.baselines[i];
        let (start, stop) = match direction {
            LadderDirection::Up => (baseline, model.max_cost()),
            LadderDirection::Down => (model.max_cost().max(baseline), baseline),
        };
        let mut costs = vec![start];
        let mut cost = start + step;
        while (step > 0.0 && cost < stop) || (step < 0.0 && cost > stop) {
            costs.push(cost);
            cost += step;
        }
        let ladder: Result<Vec<ResultDatum>, _> =
            costs.into_iter().map(|c| model.evaluate(c)).collect();
        ladders.push(ladder?);
    }
    Ok(ladders)
}

/// The country whose next ladder step improves the objective most.
///
/// Works for both directions: a withdrawal step usually worsens the
/// objective, so the largest (least negative) improvement is the cheapest
/// withdrawal. Returns `None` when no country can move.
fn best_step(
    problem: &AllocationProblem<'_>,
    ladders: &[Vec<ResultDatum>],
    cursors: &[usize],
    excluded: &[bool],
) -> Option<usize> {
    let current: Vec<ResultDatum> = ladders
        .iter()
        .zip(cursors)
        .map(|(ladder, &c)| ladder[c])
        .collect();
    let base = problem.objective.evaluate(&current);

    let mut best: Option<(usize, f64)> = None;
    let mut candidate = current;
    for i in 0..ladders.len() {
        if excluded[i] || cursors[i] + 1 >= ladders[i].len() {
            continue;
        }
        let previous = candidate[i];
        candidate[i] = ladders[i][cursors[i] + 1];
        let improvement = base - problem.objective.evaluate(&candidate);
        candidate[i] = previous;
        if best.is_none_or(|(_, b)| improvement > b) {
            best = Some((i, improvement));
        }
    }
    best.map(|(i, _)| i)
}

/// Countries currently over either concentration cap.
///
/// Shares are measured against the spend allocated so far, not the final
/// budget, and re-derived from scratch every step.
fn capped_countries(allocation: &[f64], countries: &[String], caps: AllocationCaps) -> Vec<bool> {
    let n = allocation.len();
    let mut excluded = vec![false; n];
    let total: f64 = allocation.iter().sum();
    if total <= 0.0 {
        return excluded;
    }

    let mut by_code: FxHashMap<&str, f64> = FxHashMap::default();
    let mut by_disease: FxHashMap<&str, f64> = FxHashMap::default();
    for (i, key) in countries.iter().enumerate() {
        let (disease, code) = split_country_key(key);
        *by_code.entry(code).or_default() += allocation[i];
        *by_disease.entry(disease).or_default() += allocation[i];
    }

    for (i, key) in countries.iter().enumerate() {
        let (disease, code) = split_country_key(key);
        if by_code[code] / total > caps.max_share_per_country {
            excluded[i] = true;
        }
        let disease_total = by_disease[disease];
        if disease_total > 0.0 && allocation[i] / disease_total > caps.max_share_within_disease {
            excluded[i] = true;
        }
    }
    excluded
}
