//! Disease-burden funding allocation library
//!
//! This crate decides how a fungible budget should be split across a
//! portfolio of country disease programs. It supports:
//! - Piecewise-linear cost-response curves per country, with optional
//!   monotonic cleanup and out-of-bounds clamping
//! - Pluggable objective functions (cases + deaths vs fully funded,
//!   deaths only, cases only)
//! - Greedy forward/backward searches with concentration caps
//! - Global (simulated annealing) and local (Nelder-Mead) continuous
//!   optimizers under a budget-sum constraint
//! - An orchestrator that races a multiset of methods and keeps the best
//! - A scenario emulator that interpolates stored model projections at
//!   any funding fraction or dollar amount
//!
//! The usual entry point is [`analysis::Analysis`], which binds a
//! [`dataset::PortfolioDataset`] to baseline and planned budgets and
//! answers both the un-optimized (approach A) and optimized (approach B)
//! questions.

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod annealing;
pub mod curve;
pub mod dataset;
pub mod emulator;
pub mod greedy;
pub mod nelder_mead;
pub mod objective;
pub mod orchestrator;
pub mod problem;
pub mod synthetic;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod error;
pub mod results;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use analysis::Analysis;
pub use config::{AllocationCaps, AllocationConfig, AllocationMethod};
pub use curve::{CountryCostModel, OutOfBoundsPolicy, ResponseCurve};
pub use dataset::{DatasetOptions, Observation, PortfolioDataset};
pub use emulator::{Emulator, EmulatorObservation, FundingLevel};
pub use objective::{Objective, ObjectiveKind};
pub use results::{AllocationOutcome, AllocationRun, ResultDatum};
