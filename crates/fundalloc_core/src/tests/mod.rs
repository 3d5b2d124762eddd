//! Integration tests for the allocation engine
//!
//! Tests are organized by topic:
//! - `allocation` - End-to-end orchestrated runs and their invariants
//! - `convergence` - Agreement between independent search methods
//! - `emulator_queries` - Blended projections and dollar conversion

mod allocation;
mod convergence;
