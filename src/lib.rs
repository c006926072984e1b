//! Linear program workbench: a web form in front of an LP/MIP solver.
//!
//! Form fields are parsed into an [`domain::LpModel`], solved through
//! [`optimizer::MilpSolver`], analysed (slack, shadow prices) and, for two
//! variables, plotted. Results reach the browser through a read-once flash
//! store keyed by a session cookie.

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod optimizer;
pub mod plot;
pub mod telemetry;
