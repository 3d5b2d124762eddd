//! Portfolio dataset assembly
//!
//! Groups raw (country, cost, cases, deaths) observations into one
//! [`CountryCostModel`] per country and answers portfolio-wide queries
//! in a stable country order.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::curve::{CountryCostModel, OutOfBoundsPolicy, ResponseCurve};
use crate::error::{CurveError, DatasetError};
use crate::results::{ResultDatum, ScaledCurvePoint};

/// One modeled data point for one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Country key, e.g. `malariaUGA` (disease prefix + ISO3 suffix)
    pub country: String,
    pub cost: f64,
    pub cases: f64,
    pub deaths: f64,
}

/// How observations are turned into country models
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DatasetOptions {
    /// Clean up curves where spending more looks worse than spending less
    #[serde(default)]
    pub force_monotonic: bool,
    /// Policy for query costs below a country's cheapest sample
    #[serde(default)]
    pub out_of_bounds: OutOfBoundsPolicy,
}

/// The modeled portfolio: one cost model per country.
///
/// Countries are kept in sorted order; every slice-shaped query and answer
/// is aligned with [`PortfolioDataset::countries`].
#[derive(Debug, Clone)]
pub struct PortfolioDataset {
    countries: Vec<String>,
    models: FxHashMap<String, CountryCostModel>,
}

impl PortfolioDataset {
    /// Group observations by country and build the per-country models.
    ///
    /// Non-monotone curves are either cleaned up (when
    /// `options.force_monotonic` is set) or left as-is with a warning.
    pub fn from_observations(
        observations: impl IntoIterator<Item = Observation>,
        options: DatasetOptions,
    ) -> Result<Self, DatasetError> {
        let mut samples: BTreeMap<String, Vec<ResultDatum>> = BTreeMap::new();
        for obs in observations {
            samples
                .entry(obs.country)
                .or_default()
                .push(ResultDatum::new(obs.cases, obs.deaths, obs.cost));
        }
        if samples.is_empty() {
            return Err(DatasetError::NoObservations);
        }

        let mut countries = Vec::with_capacity(samples.len());
        let mut models = FxHashMap::default();
        for (country, points) in samples {
            let mut curve =
                ResponseCurve::new(points).map_err(|source| DatasetError::Curve {
                    country: country.clone(),
                    source,
                })?;
            if !curve.is_monotonic() {
                if options.force_monotonic {
                    warn!(%country, "response curve not monotonic, applying running minimum");
                    curve.force_monotonic();
                } else {
                    warn!(%country, "response curve not monotonic");
                }
            }
            let model = CountryCostModel::new(country.clone(), curve, options.out_of_bounds);
            for problem in model.check() {
                warn!("{problem}");
            }
            models.insert(country.clone(), model);
            countries.push(country);
        }

        Ok(Self { countries, models })
    }

    /// Country keys in sorted order. Every aligned slice follows this order.
    #[must_use]
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    #[must_use]
    pub fn model(&self, country: &str) -> Option<&CountryCostModel> {
        self.models.get(country)
    }

    /// Model for the `i`-th country in sorted order.
    #[must_use]
    pub fn model_at(&self, i: usize) -> &CountryCostModel {
        &self.models[&self.countries[i]]
    }

    /// Portfolio totals with every country fully funded.
    #[must_use]
    pub fn reference_totals(&self) -> ResultDatum {
        let references: Vec<ResultDatum> = self
            .countries
            .iter()
            .map(|c| self.models[c].reference())
            .collect();
        ResultDatum::total(&references)
    }

    /// Evaluate every country at the aligned total costs.
    pub fn results_for_costs(&self, costs: &[f64]) -> Result<Vec<ResultDatum>, CurveError> {
        debug_assert_eq!(costs.len(), self.countries.len());
        self.countries
            .iter()
            .zip(costs)
            .map(|(country, &cost)| self.models[country].evaluate(cost))
            .collect()
    }

    /// Turn a country-keyed map into a slice aligned with
    /// [`PortfolioDataset::countries`]. Every country must be present and
    /// no extra keys are allowed.
    pub fn aligned(&self, by_country: &BTreeMap<String, f64>) -> Result<Vec<f64>, DatasetError> {
        for key in by_country.keys() {
            if !self.models.contains_key(key) {
                return Err(DatasetError::UnknownCountry(key.clone()));
            }
        }
        self.countries
            .iter()
            .map(|c| {
                by_country
                    .get(c)
                    .copied()
                    .ok_or_else(|| DatasetError::MissingBudget(c.clone()))
            })
            .collect()
    }

    /// Zip an aligned slice back into a country-keyed map.
    #[must_use]
    pub fn keyed(&self, values: &[f64]) -> BTreeMap<String, f64> {
        self.countries
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect()
    }

    /// Data-integrity problems across all country models.
    #[must_use]
    pub fn check(&self) -> Vec<String> {
        self.countries
            .iter()
            .flat_map(|c| self.models[c].check())
            .collect()
    }

    /// Per-country cost-fraction vs impact-fraction diagnostic tables.
    #[must_use]
    pub fn scaled_curves(&self) -> BTreeMap<String, Vec<ScaledCurvePoint>> {
        self.countries
            .iter()
            .map(|c| (c.clone(), self.models[c].curve().scaled_to_reference()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observations() -> Vec<Observation> {
        let mut rows = Vec::new();
        for (country, scale) in [("tbZMB", 1.0), ("malariaUGA", 2.0)] {
            for (cost, cases, deaths) in [(0.0, 100.0, 10.0), (50.0, 60.0, 6.0), (100.0, 40.0, 4.0)]
            {
                rows.push(Observation {
                    country: country.to_string(),
                    cost: cost * scale,
                    cases: cases * scale,
                    deaths: deaths * scale,
                });
            }
        }
        rows
    }

    #[test]
    fn countries_are_sorted() {
        let ds =
            PortfolioDataset::from_observations(observations(), DatasetOptions::default()).unwrap();
        assert_eq!(ds.countries(), ["malariaUGA", "tbZMB"]);
    }

    #[test]
    fn reference_totals_sum_fully_funded_outcomes() {
        let ds =
            PortfolioDataset::from_observations(observations(), DatasetOptions::default()).unwrap();
        let gp = ds.reference_totals();
        assert_eq!(gp.cases, 40.0 * 2.0 + 40.0);
        assert_eq!(gp.deaths, 4.0 * 2.0 + 4.0);
        assert_eq!(gp.cost, 100.0 * 2.0 + 100.0);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = PortfolioDataset::from_observations(Vec::new(), DatasetOptions::default())
            .unwrap_err();
        assert_eq!(err, DatasetError::NoObservations);
    }

    #[test]
    fn aligned_rejects_unknown_and_missing_countries() {
        let ds =
            PortfolioDataset::from_observations(observations(), DatasetOptions::default()).unwrap();
        let mut budgets = BTreeMap::new();
        budgets.insert("malariaUGA".to_string(), 1.0);
        assert!(matches!(
            ds.aligned(&budgets).unwrap_err(),
            DatasetError::MissingBudget(_)
        ));
        budgets.insert("tbZMB".to_string(), 1.0);
        budgets.insert("hivXXX".to_string(), 1.0);
        assert!(matches!(
            ds.aligned(&budgets).unwrap_err(),
            DatasetError::UnknownCountry(_)
        ));
    }

    #[test]
    fn force_monotonic_option_cleans_curves() {
        let rows = vec![
            Observation {
                country: "hivKEN".to_string(),
                cost: 0.0,
                cases: 100.0,
                deaths: 10.0,
            },
            Observation {
                country: "hivKEN".to_string(),
                cost: 50.0,
                cases: 120.0,
                deaths: 6.0,
            },
        ];
        let options = DatasetOptions {
            force_monotonic: true,
            ..Default::default()
        };
        let ds = PortfolioDataset::from_observations(rows, options).unwrap();
        assert!(ds.model("hivKEN").unwrap().curve().is_monotonic());
    }
}
