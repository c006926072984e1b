//! Solver strategies
//!
//! - MILP: exact LP/MIP solve through `good_lp`

pub mod milp;

pub use milp::*;
