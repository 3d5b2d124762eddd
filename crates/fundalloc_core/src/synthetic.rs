//! Synthetic portfolio generation for tests and benchmarks
//!
//! Draws plausible diminishing-returns country curves: cases fall along a
//! rescaled logistic from the zero-spend level to the fully-funded level,
//! deaths follow cases through a drawn case-fatality ratio.

use rand::Rng;

use crate::dataset::Observation;

const SAMPLES_PER_COUNTRY: usize = 15;
const LOGISTIC_BETA: f64 = 0.01;
const LOGISTIC_TURN: f64 = 2.0;

/// Observations for one synthetic country.
pub fn synthetic_country<R: Rng>(country: &str, rng: &mut R) -> Vec<Observation> {
    let zero_cases = rng.r#gen::<f64>() * 0.1 * 10_000.0;
    let fatality_ratio = rng.r#gen::<f64>() * 0.25;
    // Floors keep the fully-funded cost away from zero so the curve has a
    // real spend range to interpolate over.
    let reduction = 0.1 + 0.9 * rng.r#gen::<f64>();
    let cost_per_reduction = 0.2 * (0.1 + 0.9 * rng.r#gen::<f64>()) * 10_000.0;

    let full_cost = reduction * cost_per_reduction;
    let full_cases = zero_cases * (1.0 - reduction);

    let logistic = |cost: f64| 1.0 / (1.0 + (-LOGISTIC_BETA * (full_cost / LOGISTIC_TURN - cost)).exp());
    let at_zero = logistic(0.0);
    let at_full = logistic(full_cost);

    (0..SAMPLES_PER_COUNTRY)
        .map(|i| {
            let cost = full_cost * i as f64 / (SAMPLES_PER_COUNTRY - 1) as f64;
            let fraction_remaining = (logistic(cost) - at_full) / (at_zero - at_full);
            let cases = full_cases + (zero_cases - full_cases) * fraction_remaining;
            Observation {
                country: country.to_string(),
                cost,
                cases,
                deaths: fatality_ratio * cases,
            }
        })
        .collect()
}

/// Observations for a whole synthetic portfolio, with keys shaped like
/// real `<disease><ISO3>` country keys.
pub fn synthetic_portfolio<R: Rng>(countries: usize, rng: &mut R) -> Vec<Observation> {
    const DISEASES: [&str; 3] = ["hiv", "tb", "malaria"];
    (0..countries)
        .flat_map(|i| {
            let disease = DISEASES[i % DISEASES.len()];
            let code = format!(
                "{}{}{}",
                (b'A' + (i / 26 % 26) as u8) as char,
                (b'A' + (i % 26) as u8) as char,
                (b'A' + (i / 676 % 26) as u8) as char,
            );
            let key = format!("{disease}{code}");
            synthetic_country(&key, rng)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::dataset::{DatasetOptions, PortfolioDataset};

    #[test]
    fn synthetic_curves_are_monotone_and_well_formed() {
        let mut rng = StdRng::seed_from_u64(3);
        let rows = synthetic_portfolio(9, &mut rng);
        let ds = PortfolioDataset::from_observations(rows, DatasetOptions::default()).unwrap();
        assert_eq!(ds.len(), 9);
        for country in ds.countries() {
            let model = ds.model(country).unwrap();
            assert!(model.curve().is_monotonic(), "{country}");
            assert!(model.max_cost() > 0.0);
            assert_eq!(model.min_cost(), 0.0);
        }
    }

    #[test]
    fn curve_spans_zero_spend_to_full_funding() {
        let mut rng = StdRng::seed_from_u64(5);
        let rows = synthetic_country("hivAAA", &mut rng);
        let first = &rows[0];
        let last = &rows[rows.len() - 1];
        assert!(first.cases > last.cases);
        assert!(first.deaths > last.deaths);
    }
}
