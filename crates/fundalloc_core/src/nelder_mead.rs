//! Bounded Nelder-Mead simplex search
//!
//! Derivative-free local minimization of the penalized objective over the
//! allocation vector. The simplex is seeded around a caller-supplied
//! starting point and every transformed vertex is clamped back into the
//! per-country bounds. The budget constraint is enforced through the
//! penalty, so the final vertex is only accepted if it is actually valid.

use tracing::debug;

use crate::config::NelderMeadOptions;
use crate::problem::AllocationProblem;

/// Standard Nelder-Mead coefficients
const REFLECTION_COEF: f64 = 1.0;
const EXPANSION_COEF: f64 = 2.0;
const CONTRACTION_COEF: f64 = 0.5;
const SHRINK_COEF: f64 = 0.5;

#[derive(Clone)]
struct SimplexVertex {
    values: Vec<f64>,
    objective: f64,
}

/// Seed the simplex around `start`: the start itself plus one vertex per
/// dimension perturbed by 10% of that dimension's range.
fn initialize_simplex(
    problem: &AllocationProblem<'_>,
    start: &[f64],
    bounds: &[(f64, f64)],
) -> Vec<SimplexVertex> {
    let n = bounds.len();
    let mut simplex = Vec::with_capacity(n + 1);

    let mut base = start.to_vec();
    clamp_to_bounds(&mut base, bounds);
    simplex.push(SimplexVertex {
        objective: problem.penalized_objective(&base),
        values: base.clone(),
    });

    for i in 0..n {
        let mut point = base.clone();
        let (min, max) = bounds[i];
        let range = max - min;
        if point[i] + 0.1 * range <= max {
            point[i] += 0.1 * range;
        } else {
            point[i] -= 0.1 * range;
        }
        simplex.push(SimplexVertex {
            objective: problem.penalized_objective(&point),
            values: point,
        });
    }

    simplex
}

/// Centroid of all vertices except the worst (last)
fn centroid(simplex: &[SimplexVertex]) -> Vec<f64> {
    let n = simplex[0].values.len();
    let mut center = vec![0.0; n];
    for vertex in simplex.iter().take(simplex.len() - 1) {
        for (i, val) in vertex.values.iter().enumerate() {
            center[i] += val;
        }
    }
    let count = (simplex.len() - 1) as f64;
    for val in &mut center {
        *val /= count;
    }
    center
}

/// Reflect a point through the centroid
fn reflect(point: &[f64], centroid: &[f64], coef: f64) -> Vec<f64> {
    point
        .iter()
        .zip(centroid.iter())
        .map(|(p, c)| c + coef * (c - p))
        .collect()
}

fn clamp_to_bounds(values: &mut [f64], bounds: &[(f64, f64)]) {
    for (val, (min, max)) in values.iter_mut().zip(bounds.iter()) {
        *val = val.clamp(*min, *max);
    }
}

/// Max distance of any vertex from the centroid
fn simplex_size(simplex: &[SimplexVertex], centroid: &[f64]) -> f64 {
    simplex
        .iter()
        .map(|v| {
            v.values
                .iter()
                .zip(centroid.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .fold(0.0_f64, |a, b| a.max(b))
}

/// Minimize from `start`. Returns the best vertex found if it respects the
/// budget and non-negativity, otherwise `None` (failed method, not an
/// error).
pub fn minimize(
    problem: &AllocationProblem<'_>,
    start: Vec<f64>,
    options: &NelderMeadOptions,
) -> Option<Vec<f64>> {
    let bounds = problem.bounds();
    if bounds.is_empty() {
        return None;
    }

    let mut simplex = initialize_simplex(problem, &start, &bounds);
    let mut iteration = 0;

    while iteration < options.max_iterations {
        iteration += 1;

        // Best first, worst last
        simplex.sort_by(|a, b| {
            a.objective
                .partial_cmp(&b.objective)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let cent = centroid(&simplex);
        let size = simplex_size(&simplex, &cent);
        if size < options.tolerance {
            debug!(iteration, size, "simplex converged");
            break;
        }

        let best_objective = simplex[0].objective;
        let second_worst_objective = simplex[simplex.len() - 2].objective;
        let worst_objective = simplex[simplex.len() - 1].objective;
        let worst_values = simplex[simplex.len() - 1].values.clone();
        let worst_idx = simplex.len() - 1;

        // Try reflection
        let mut reflected = reflect(&worst_values, &cent, REFLECTION_COEF);
        clamp_to_bounds(&mut reflected, &bounds);
        let reflected_obj = problem.penalized_objective(&reflected);

        if reflected_obj < best_objective {
            // Reflected is best so far, try expansion
            let mut expanded = reflect(&worst_values, &cent, EXPANSION_COEF);
            clamp_to_bounds(&mut expanded, &bounds);
            let expanded_obj = problem.penalized_objective(&expanded);

            if expanded_obj < reflected_obj {
                simplex[worst_idx] = SimplexVertex {
                    values: expanded,
                    objective: expanded_obj,
                };
            } else {
                simplex[worst_idx] = SimplexVertex {
                    values: reflected,
                    objective: reflected_obj,
                };
            }
        } else if reflected_obj < second_worst_objective {
            simplex[worst_idx] = SimplexVertex {
                values: reflected,
                objective: reflected_obj,
            };
        } else {
            // Try contraction
            let contract_point = if reflected_obj < worst_objective {
                &reflected
            } else {
                &worst_values
            };
            let mut contracted: Vec<f64> = cent
                .iter()
                .zip(contract_point.iter())
                .map(|(c, p)| c + CONTRACTION_COEF * (p - c))
                .collect();
            clamp_to_bounds(&mut contracted, &bounds);
            let contracted_obj = problem.penalized_objective(&contracted);

            if contracted_obj < worst_objective {
                simplex[worst_idx] = SimplexVertex {
                    values: contracted,
                    objective: contracted_obj,
                };
            } else {
                // Shrink toward the best vertex
                let best_values = simplex[0].values.clone();
                for vertex in simplex.iter_mut().skip(1) {
                    let mut shrunk: Vec<f64> = best_values
                        .iter()
                        .zip(vertex.values.iter())
                        .map(|(b, v)| b + SHRINK_COEF * (v - b))
                        .collect();
                    clamp_to_bounds(&mut shrunk, &bounds);
                    *vertex = SimplexVertex {
                        objective: problem.penalized_objective(&shrunk),
                        values: shrunk,
                    };
                }
            }
        }
    }

    simplex.sort_by(|a, b| {
        a.objective
            .partial_cmp(&b.objective)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let best = simplex.into_iter().next()?;
    if problem.is_valid(&best.values) {
        Some(best.values)
    } else {
        debug!("best simplex vertex violates the budget constraint");
        None
    }
}
