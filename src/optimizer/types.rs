use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{LpModel, ModelLimits, SolveReport};
use crate::plot::PlotSettings;

/// Turns a model into a report: solve, post-solve analysis, chart
#[async_trait]
pub trait LpSolver: Send + Sync {
    async fn solve(&self, model: &LpModel) -> Result<SolveReport>;
}

#[derive(Debug, Clone)]
pub struct SolverSettings {
    /// Wall-clock bound for a single solve, including analysis and plotting
    pub time_limit: Duration,
    pub limits: ModelLimits,
    pub plot: PlotSettings,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            limits: ModelLimits::default(),
            plot: PlotSettings::default(),
        }
    }
}
