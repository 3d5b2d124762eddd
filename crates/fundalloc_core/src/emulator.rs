//! Scenario emulator
//!
//! Answers "what would the model project at this funding level" without
//! re-running the epi model: stored scenarios at discrete funding
//! fractions are blended linearly between the two fractions bracketing
//! the query. Dollar queries are converted to funding fractions through
//! the cost indicator's central projection summed over the funding
//! window.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::curve::OutOfBoundsPolicy;
use crate::error::EmulatorError;

/// Indicator name the dollar conversion is built from
const COST_INDICATOR: &str = "cost";

/// One projected (indicator, year) row of a stored scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmulatorObservation {
    pub funding_fraction: f64,
    pub indicator: String,
    pub year: i32,
    pub low: f64,
    pub central: f64,
    pub high: f64,
}

/// A blended projection for one indicator, renamed with the `model_`
/// prefix for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedSeries {
    pub years: Vec<i32>,
    pub model_low: Vec<f64>,
    pub model_central: Vec<f64>,
    pub model_high: Vec<f64>,
}

/// How much money the query represents: exactly one of a funding
/// fraction or a dollar amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingLevel {
    Fraction(f64),
    Dollars(f64),
}

#[derive(Debug, Clone, Default)]
struct IndicatorSeries {
    years: Vec<i32>,
    low: Vec<f64>,
    central: Vec<f64>,
    high: Vec<f64>,
}

/// Stored scenarios for one country, queryable at any funding level
/// between the smallest and largest stored fraction.
#[derive(Debug, Clone)]
pub struct Emulator {
    country: String,
    fractions: Vec<f64>,
    tables: Vec<FxHashMap<String, IndicatorSeries>>,
    /// Cost of each stored fraction over the funding window, where the
    /// cost indicator exists
    costs: Vec<Option<f64>>,
    policy: OutOfBoundsPolicy,
}

impl Emulator {
    /// Index the observations by funding fraction and pre-compute the
    /// dollar-conversion lookup. Warns when the cost lookup is not
    /// monotonically increasing in the funding fraction.
    pub fn new(
        country: impl Into<String>,
        observations: Vec<EmulatorObservation>,
        funding_years: RangeInclusive<i32>,
        policy: OutOfBoundsPolicy,
    ) -> Result<Self, EmulatorError> {
        if observations.is_empty() {
            return Err(EmulatorError::NoData);
        }
        let country = country.into();

        let mut fractions: Vec<f64> = observations.iter().map(|o| o.funding_fraction).collect();
        fractions.sort_by(f64::total_cmp);
        fractions.dedup();

        let mut tables: Vec<FxHashMap<String, IndicatorSeries>> =
            vec![FxHashMap::default(); fractions.len()];
        let mut sorted = observations;
        sorted.sort_by(|a, b| {
            a.funding_fraction
                .total_cmp(&b.funding_fraction)
                .then(a.indicator.cmp(&b.indicator))
                .then(a.year.cmp(&b.year))
        });
        for obs in sorted {
            let i = fractions.partition_point(|&f| f < obs.funding_fraction);
            let series = tables[i].entry(obs.indicator).or_default();
            series.years.push(obs.year);
            series.low.push(obs.low);
            series.central.push(obs.central);
            series.high.push(obs.high);
        }

        // Indicators must span the same years in every scenario they
        // appear in, otherwise blending would misalign them.
        let mut reference_years: FxHashMap<&str, &[i32]> = FxHashMap::default();
        for table in &tables {
            for (indicator, series) in table {
                match reference_years.get(indicator.as_str()) {
                    Some(years) if *years != series.years.as_slice() => {
                        return Err(EmulatorError::MismatchedYears(indicator.clone()));
                    }
                    Some(_) => {}
                    None => {
                        reference_years.insert(indicator, series.years.as_slice());
                    }
                }
            }
        }

        let costs: Vec<Option<f64>> = tables
            .iter()
            .map(|table| {
                table.get(COST_INDICATOR).map(|series| {
                    series
                        .years
                        .iter()
                        .zip(&series.central)
                        .filter(|(year, _)| funding_years.contains(year))
                        .map(|(_, cost)| cost)
                        .sum()
                })
            })
            .collect();

        let known: Vec<f64> = costs.iter().filter_map(|c| *c).collect();
        if known.windows(2).any(|p| p[1] < p[0]) {
            warn!(%country, "scenario cost is not monotonically increasing in the funding fraction");
        }

        Ok(Self {
            country,
            fractions,
            tables,
            costs,
            policy,
        })
    }

    #[must_use]
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Smallest and largest stored funding fraction.
    #[must_use]
    pub fn fraction_range(&self) -> (f64, f64) {
        (self.fractions[0], self.fractions[self.fractions.len() - 1])
    }

    /// Project every indicator at the requested funding level.
    pub fn get(
        &self,
        level: FundingLevel,
    ) -> Result<BTreeMap<String, ProjectedSeries>, EmulatorError> {
        match level {
            FundingLevel::Fraction(fraction) => self.get_fraction(fraction),
            FundingLevel::Dollars(dollars) => {
                let (_, max_fraction) = self.fraction_range();
                let cost_at_max = self
                    .costs
                    .last()
                    .copied()
                    .flatten()
                    .filter(|&c| c > 0.0)
                    .ok_or(EmulatorError::NoCostLookup)?;
                self.get_fraction(max_fraction * dollars / cost_at_max)
            }
        }
    }

    fn get_fraction(
        &self,
        fraction: f64,
    ) -> Result<BTreeMap<String, ProjectedSeries>, EmulatorError> {
        let (min, max) = self.fraction_range();
        let out_of_range = EmulatorError::FractionOutOfRange {
            requested: fraction,
            min,
            max,
        };

        if fraction > max {
            return match self.policy {
                OutOfBoundsPolicy::Clamp => Ok(self.exact(self.fractions.len() - 1)),
                OutOfBoundsPolicy::Strict => Err(out_of_range),
            };
        }
        if fraction < min {
            // Clamping downward only makes sense for a real funding level;
            // zero or negative funding is always rejected.
            return match self.policy {
                OutOfBoundsPolicy::Clamp if fraction > 0.0 => Ok(self.exact(0)),
                _ => Err(out_of_range),
            };
        }
        if fraction.is_nan() {
            return Err(out_of_range);
        }

        let hi = self.fractions.partition_point(|&f| f < fraction);
        if self.fractions[hi] == fraction {
            return Ok(self.exact(hi));
        }
        let lo = hi - 1;
        let weight_to_below =
            1.0 - (fraction - self.fractions[lo]) / (self.fractions[hi] - self.fractions[lo]);
        Ok(self.blend(lo, hi, weight_to_below))
    }

    fn exact(&self, i: usize) -> BTreeMap<String, ProjectedSeries> {
        self.tables[i]
            .iter()
            .map(|(indicator, series)| {
                (
                    indicator.clone(),
                    ProjectedSeries {
                        years: series.years.clone(),
                        model_low: series.low.clone(),
                        model_central: series.central.clone(),
                        model_high: series.high.clone(),
                    },
                )
            })
            .collect()
    }

    fn blend(&self, lo: usize, hi: usize, weight_to_below: f64) -> BTreeMap<String, ProjectedSeries> {
        let mix = |a: &[f64], b: &[f64]| -> Vec<f64> {
            a.iter()
                .zip(b)
                .map(|(x, y)| weight_to_below * x + (1.0 - weight_to_below) * y)
                .collect()
        };
        self.tables[lo]
            .iter()
            .filter_map(|(indicator, below)| {
                let above = self.tables[hi].get(indicator)?;
                Some((
                    indicator.clone(),
                    ProjectedSeries {
                        years: below.years.clone(),
                        model_low: mix(&below.low, &above.low),
                        model_central: mix(&below.central, &above.central),
                        model_high: mix(&below.high, &above.high),
                    },
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenarios at 50% and 100% funding: cases fall and cost rises
    /// linearly with the fraction.
    fn observations() -> Vec<EmulatorObservation> {
        let mut rows = Vec::new();
        for fraction in [0.5, 1.0] {
            for year in 2027..=2029 {
                rows.push(EmulatorObservation {
                    funding_fraction: fraction,
                    indicator: "cases".to_string(),
                    year,
                    low: 90.0 - 40.0 * fraction,
                    central: 100.0 - 40.0 * fraction,
                    high: 110.0 - 40.0 * fraction,
                });
                rows.push(EmulatorObservation {
                    funding_fraction: fraction,
                    indicator: "cost".to_string(),
                    year,
                    low: 100.0 * fraction,
                    central: 100.0 * fraction,
                    high: 100.0 * fraction,
                });
            }
        }
        rows
    }

    fn emulator(policy: OutOfBoundsPolicy) -> Emulator {
        Emulator::new("UGA", observations(), 2027..=2029, policy).unwrap()
    }

    #[test]
    fn exact_fraction_reproduces_the_stored_scenario() {
        let em = emulator(OutOfBoundsPolicy::Strict);
        let projection = em.get(FundingLevel::Fraction(1.0)).unwrap();
        let cases = &projection["cases"];
        assert_eq!(cases.years, vec![2027, 2028, 2029]);
        assert_eq!(cases.model_central, vec![60.0, 60.0, 60.0]);
        assert_eq!(cases.model_low, vec![50.0, 50.0, 50.0]);
        assert_eq!(cases.model_high, vec![70.0, 70.0, 70.0]);
    }

    #[test]
    fn intermediate_fraction_blends_the_brackets() {
        let em = emulator(OutOfBoundsPolicy::Strict);
        let projection = em.get(FundingLevel::Fraction(0.75)).unwrap();
        // Midpoint of 80 (at 0.5) and 60 (at 1.0)
        assert_eq!(projection["cases"].model_central, vec![70.0, 70.0, 70.0]);
    }

    #[test]
    fn fractions_outside_the_range_error_when_strict() {
        let em = emulator(OutOfBoundsPolicy::Strict);
        for fraction in [0.4, 1.1, -0.1, f64::NAN] {
            assert!(matches!(
                em.get(FundingLevel::Fraction(fraction)).unwrap_err(),
                EmulatorError::FractionOutOfRange { .. }
            ));
        }
    }

    #[test]
    fn clamping_answers_out_of_range_fractions() {
        let em = emulator(OutOfBoundsPolicy::Clamp);
        let above = em.get(FundingLevel::Fraction(1.2)).unwrap();
        assert_eq!(above["cases"].model_central, vec![60.0, 60.0, 60.0]);
        let below = em.get(FundingLevel::Fraction(0.1)).unwrap();
        assert_eq!(below["cases"].model_central, vec![80.0, 80.0, 80.0]);
        // Zero funding is rejected even with clamping on
        assert!(em.get(FundingLevel::Fraction(0.0)).is_err());
    }

    #[test]
    fn dollar_queries_convert_through_the_cost_lookup() {
        let em = emulator(OutOfBoundsPolicy::Strict);
        // Full funding costs 300 over the window; 225 dollars = 0.75.
        let projection = em.get(FundingLevel::Dollars(225.0)).unwrap();
        assert_eq!(projection["cases"].model_central, vec![70.0, 70.0, 70.0]);
    }

    #[test]
    fn dollar_queries_need_a_cost_indicator() {
        let rows: Vec<EmulatorObservation> = observations()
            .into_iter()
            .filter(|o| o.indicator != "cost")
            .collect();
        let em = Emulator::new("UGA", rows, 2027..=2029, OutOfBoundsPolicy::Strict).unwrap();
        assert_eq!(
            em.get(FundingLevel::Dollars(100.0)).unwrap_err(),
            EmulatorError::NoCostLookup
        );
    }

    #[test]
    fn mismatched_years_are_rejected() {
        let mut rows = observations();
        rows.retain(|o| !(o.funding_fraction == 0.5 && o.indicator == "cases" && o.year == 2029));
        assert_eq!(
            Emulator::new("UGA", rows, 2027..=2029, OutOfBoundsPolicy::Strict).unwrap_err(),
            EmulatorError::MismatchedYears("cases".to_string())
        );
    }
}
