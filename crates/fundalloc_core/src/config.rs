//! Allocation run configuration
//!
//! Defines the methods, caps, and optimizer parameters for an
//! orchestrated allocation run.

use serde::{Deserialize, Serialize};

/// One allocation method the orchestrator can run.
///
/// The same method may appear several times in a run's method list;
/// random-start methods then explore different starting points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    /// Greedy marginal-impact search, building the allocation up from zero
    GreedyForward,
    /// Greedy search starting from full funding and withdrawing spend
    GreedyBackward,
    /// Simulated annealing seeded with the planned budgets
    GlobalFromPlanned,
    /// Simulated annealing seeded with a random valid allocation
    GlobalFromRandom,
    /// Bounded Nelder-Mead seeded with the planned budgets
    LocalFromPlanned,
    /// Bounded Nelder-Mead seeded with a random valid allocation
    LocalFromRandom,
}

impl AllocationMethod {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AllocationMethod::GreedyForward => "greedy: forwards",
            AllocationMethod::GreedyBackward => "greedy: backwards",
            AllocationMethod::GlobalFromPlanned => "global: planned start",
            AllocationMethod::GlobalFromRandom => "global: random start",
            AllocationMethod::LocalFromPlanned => "local: planned start",
            AllocationMethod::LocalFromRandom => "local: random start",
        }
    }

    /// The default method list: every method once.
    #[must_use]
    pub fn all() -> Vec<AllocationMethod> {
        vec![
            AllocationMethod::GreedyForward,
            AllocationMethod::GreedyBackward,
            AllocationMethod::GlobalFromPlanned,
            AllocationMethod::GlobalFromRandom,
            AllocationMethod::LocalFromPlanned,
            AllocationMethod::LocalFromRandom,
        ]
    }
}

/// Concentration limits applied during the greedy search.
///
/// Shares are fractions of the fungible spend allocated so far, re-checked
/// before every step. Both default to 1.0 (no limit).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationCaps {
    /// Largest share a single country (summed over its disease components)
    /// may hold
    #[serde(default = "default_cap")]
    pub max_share_per_country: f64,
    /// Largest share a single component may hold within its disease group
    #[serde(default = "default_cap")]
    pub max_share_within_disease: f64,
}

fn default_cap() -> f64 {
    1.0
}

impl Default for AllocationCaps {
    fn default() -> Self {
        Self {
            max_share_per_country: default_cap(),
            max_share_within_disease: default_cap(),
        }
    }
}

impl AllocationCaps {
    /// Whether either cap can ever exclude a country.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.max_share_per_country < 1.0 || self.max_share_within_disease < 1.0
    }
}

/// Simulated-annealing parameters for the global methods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnealingOptions {
    #[serde(default = "default_annealing_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_initial_temp")]
    pub initial_temp: f64,
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    /// Proposal step size as a fraction of each country's unmet need
    #[serde(default = "default_step_scale")]
    pub step_scale: f64,
}

fn default_annealing_iterations() -> usize {
    20_000
}

fn default_initial_temp() -> f64 {
    1.0
}

fn default_cooling_rate() -> f64 {
    0.9995
}

fn default_step_scale() -> f64 {
    0.1
}

impl Default for AnnealingOptions {
    fn default() -> Self {
        Self {
            max_iterations: default_annealing_iterations(),
            initial_temp: default_initial_temp(),
            cooling_rate: default_cooling_rate(),
            step_scale: default_step_scale(),
        }
    }
}

/// Nelder-Mead parameters for the local methods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NelderMeadOptions {
    #[serde(default = "default_nelder_mead_iterations")]
    pub max_iterations: usize,
    /// Convergence threshold on the simplex objective spread
    #[serde(default = "default_nelder_mead_tolerance")]
    pub tolerance: f64,
}

fn default_nelder_mead_iterations() -> usize {
    2_000
}

fn default_nelder_mead_tolerance() -> f64 {
    1e-8
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: default_nelder_mead_iterations(),
            tolerance: default_nelder_mead_tolerance(),
        }
    }
}

/// Complete configuration for an orchestrated allocation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// Methods to run, in order; duplicates allowed
    #[serde(default = "AllocationMethod::all")]
    pub methods: Vec<AllocationMethod>,
    /// Number of budget increments for the greedy methods
    #[serde(default = "default_greedy_steps")]
    pub greedy_steps: usize,
    #[serde(default)]
    pub caps: AllocationCaps,
    #[serde(default)]
    pub annealing: AnnealingOptions,
    #[serde(default)]
    pub nelder_mead: NelderMeadOptions,
    /// Seed for the random-start and annealing draws
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_greedy_steps() -> usize {
    10_000
}

fn default_seed() -> u64 {
    0
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            methods: AllocationMethod::all(),
            greedy_steps: default_greedy_steps(),
            caps: AllocationCaps::default(),
            annealing: AnnealingOptions::default(),
            nelder_mead: NelderMeadOptions::default(),
            seed: default_seed(),
        }
    }
}

/// Split a country key into its disease prefix and ISO3 country code.
///
/// Keys are `<disease><ISO3>`; the last three characters are the country
/// code. Keys of three characters or fewer have an empty disease prefix.
#[must_use]
pub fn split_country_key(key: &str) -> (&str, &str) {
    if key.len() <= 3 || !key.is_char_boundary(key.len() - 3) {
        ("", key)
    } else {
        key.split_at(key.len() - 3)
    }
}
