//! Input file format
//!
//! The CLI takes a single JSON file: the modeled cost-response
//! observations, the two budget layers, the fungible budget, and
//! optional dataset/run settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use serde::{Deserialize, Serialize};

use fundalloc_core::config::AllocationConfig;
use fundalloc_core::dataset::{DatasetOptions, Observation};
use fundalloc_core::objective::ObjectiveKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFile {
    /// Modeled (country, cost, cases, deaths) rows
    pub model_results: Vec<Observation>,
    /// Non-fungible spend per country
    pub baseline_budgets: BTreeMap<String, f64>,
    /// Externally planned fungible spend per country
    pub planned_budgets: BTreeMap<String, f64>,
    /// Total fungible budget to distribute
    pub fungible_budget: f64,
    #[serde(default)]
    pub dataset: DatasetOptions,
    #[serde(default)]
    pub objective: ObjectiveKind,
    #[serde(default)]
    pub run: AllocationConfig,
}

pub fn load(path: &Path) -> color_eyre::Result<InputFile> {
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading input file {}", path.display()))?;
    let input: InputFile = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("parsing input file {}", path.display()))?;
    Ok(input)
}
