//! Cost-response curves
//!
//! A [`ResponseCurve`] holds a country's modeled (cost, cases, deaths)
//! samples and answers piecewise-linear interpolation queries between
//! them. A [`CountryCostModel`] wraps a curve with the country's name,
//! its out-of-bounds policy, and its fully-funded reference outcome.

use serde::{Deserialize, Serialize};

use crate::error::CurveError;
use crate::results::{ResultDatum, ScaledCurvePoint};

/// What to do with query costs below the cheapest observed sample.
///
/// Costs above the most expensive sample always clamp: spending more than
/// the fully-funded amount buys nothing further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutOfBoundsPolicy {
    /// Reject the query with a domain error
    #[default]
    Strict,
    /// Answer with the cheapest sample's outcome
    Clamp,
}

/// A country's modeled outcomes over a range of spend levels,
/// sorted by ascending cost with no duplicate cost values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCurve {
    samples: Vec<ResultDatum>,
}

impl ResponseCurve {
    /// Build a curve from unordered samples.
    ///
    /// Samples are sorted by cost; duplicate cost values are rejected.
    pub fn new(mut samples: Vec<ResultDatum>) -> Result<Self, CurveError> {
        if samples.is_empty() {
            return Err(CurveError::Empty);
        }
        samples.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        for pair in samples.windows(2) {
            if pair[0].cost == pair[1].cost {
                return Err(CurveError::DuplicateCost(pair[0].cost));
            }
        }
        Ok(Self { samples })
    }

    #[must_use]
    pub fn samples(&self) -> &[ResultDatum] {
        &self.samples
    }

    #[must_use]
    pub fn min_cost(&self) -> f64 {
        self.samples[0].cost
    }

    #[must_use]
    pub fn max_cost(&self) -> f64 {
        self.samples[self.samples.len() - 1].cost
    }

    /// The outcome at the most expensive sample (fully funded).
    #[must_use]
    pub fn reference(&self) -> ResultDatum {
        self.samples[self.samples.len() - 1]
    }

    /// Whether cases and deaths both never increase as cost increases.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.samples
            .windows(2)
            .all(|p| p[1].cases <= p[0].cases && p[1].deaths <= p[0].deaths)
    }

    /// Replace cases and deaths with their running minimum over ascending
    /// cost, so that spending more never looks worse than spending less.
    /// Idempotent.
    pub fn force_monotonic(&mut self) {
        let mut min_cases = f64::INFINITY;
        let mut min_deaths = f64::INFINITY;
        for sample in &mut self.samples {
            min_cases = min_cases.min(sample.cases);
            min_deaths = min_deaths.min(sample.deaths);
            sample.cases = min_cases;
            sample.deaths = min_deaths;
        }
    }

    /// Interpolated outcome at `cost`.
    ///
    /// Costs above the maximum sample clamp to the fully-funded outcome.
    /// Costs below the minimum either clamp or error per `policy`. The
    /// returned datum always carries the requested cost, so spend
    /// diagnostics reflect what was actually asked for.
    pub fn evaluate(&self, cost: f64, policy: OutOfBoundsPolicy) -> Result<ResultDatum, CurveError> {
        if !cost.is_finite() {
            return Err(CurveError::NonFiniteCost(cost));
        }
        let effective = if cost < self.min_cost() {
            match policy {
                OutOfBoundsPolicy::Clamp => self.min_cost(),
                OutOfBoundsPolicy::Strict => {
                    return Err(CurveError::CostBelowDomain {
                        cost,
                        min_cost: self.min_cost(),
                    });
                }
            }
        } else {
            cost.min(self.max_cost())
        };

        // First sample with cost >= the query; the effective cost is
        // in-domain so the partition point is a valid index.
        let hi = self.samples.partition_point(|s| s.cost < effective);
        let upper = self.samples[hi];
        if upper.cost == effective || hi == 0 {
            return Ok(ResultDatum::new(upper.cases, upper.deaths, cost));
        }
        let lower = self.samples[hi - 1];
        let t = (effective - lower.cost) / (upper.cost - lower.cost);
        Ok(ResultDatum::new(
            lower.cases + t * (upper.cases - lower.cases),
            lower.deaths + t * (upper.deaths - lower.deaths),
            cost,
        ))
    }

    /// Every sample rescaled to the fully-funded outcome, for cost-fraction
    /// vs impact-fraction diagnostics.
    #[must_use]
    pub fn scaled_to_reference(&self) -> Vec<ScaledCurvePoint> {
        let gp = self.reference();
        self.samples
            .iter()
            .map(|s| ScaledCurvePoint {
                cost_fraction: s.cost / gp.cost,
                cases_fraction: s.cases / gp.cases,
                deaths_fraction: s.deaths / gp.deaths,
            })
            .collect()
    }
}

/// A named country's response curve plus its query policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryCostModel {
    name: String,
    curve: ResponseCurve,
    policy: OutOfBoundsPolicy,
}

impl CountryCostModel {
    pub fn new(
        name: impl Into<String>,
        curve: ResponseCurve,
        policy: OutOfBoundsPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            curve,
            policy,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn curve(&self) -> &ResponseCurve {
        &self.curve
    }

    #[must_use]
    pub fn min_cost(&self) -> f64 {
        self.curve.min_cost()
    }

    #[must_use]
    pub fn max_cost(&self) -> f64 {
        self.curve.max_cost()
    }

    /// Fully-funded outcome for this country.
    #[must_use]
    pub fn reference(&self) -> ResultDatum {
        self.curve.reference()
    }

    /// Interpolated outcome at `cost` under the model's policy.
    pub fn evaluate(&self, cost: f64) -> Result<ResultDatum, CurveError> {
        self.curve.evaluate(cost, self.policy)
    }

    /// Data-integrity problems a caller should be warned about.
    #[must_use]
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.curve.is_monotonic() {
            problems.push(format!(
                "{}: cases or deaths increase with higher spend",
                self.name
            ));
        }
        if self.curve.samples().len() < 2 {
            problems.push(format!(
                "{}: only one spend level observed, interpolation is degenerate",
                self.name
            ));
        }
        problems
    }
}
