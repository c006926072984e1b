//! MILP solver backed by `good_lp`
//!
//! The model is translated one to one: every decision variable becomes a
//! non-negative good_lp variable (integral or binary where requested), the
//! objective and each constraint become affine expressions. The branch and
//! bound itself happens in the `microlp` backend.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel,
};
use std::time::{Duration, Instant};

use crate::domain::{
    LpModel, Operator, Sense, SolveReport, SolveStatus, VarKind, VariableValue,
};
use crate::optimizer::{sensitivity, LpSolver, SolverSettings};
use crate::plot;

/// Primal values snap to the nearest integer for integral kinds when within this distance
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Outcome of the primal solve, before any analysis
#[derive(Debug, Clone, PartialEq)]
pub enum PrimalOutcome {
    /// Values aligned with `LpModel::variables`
    Optimal(Vec<f64>),
    Infeasible,
    Unbounded,
    /// The backend stopped without a verdict
    NotSolved,
}

impl PrimalOutcome {
    fn from_error(error: ResolutionError) -> Self {
        match error {
            ResolutionError::Infeasible => PrimalOutcome::Infeasible,
            ResolutionError::Unbounded => PrimalOutcome::Unbounded,
            other => {
                tracing::warn!(error = %other, "LP backend returned without a solution");
                PrimalOutcome::NotSolved
            }
        }
    }
}

/// Runs blocking `work` on the blocking pool, failing once `limit` has elapsed
pub async fn with_time_limit<T, F>(limit: Duration, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);
    tokio::time::timeout(limit, task)
        .await
        .map_err(|_| anyhow!("solver exceeded the time limit of {:?}", limit))?
        .context("solver task aborted")?
}

#[derive(Debug, Clone, Default)]
pub struct MilpSolver {
    settings: SolverSettings,
}

impl MilpSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Builds and solves the primal problem, blocking
    pub fn solve_primal(model: &LpModel) -> Result<PrimalOutcome> {
        let mut problem = ProblemVariables::new();

        let vars: Vec<good_lp::Variable> = model
            .variables
            .iter()
            .map(|v| {
                let definition = match v.kind {
                    VarKind::Continuous => variable().min(0.0),
                    VarKind::Integer => variable().integer().min(0.0),
                    VarKind::Binary => variable().binary(),
                };
                problem.add(definition.name(v.name.clone()))
            })
            .collect();

        let objective: Expression = model
            .variables
            .iter()
            .zip(&vars)
            .map(|(v, &x)| v.objective_coefficient * x)
            .sum();

        let mut lp = match model.sense {
            Sense::Maximize => problem.maximise(objective),
            Sense::Minimize => problem.minimise(objective),
        }
        .using(default_solver);

        for c in &model.constraints {
            let lhs: Expression = model
                .variables
                .iter()
                .zip(&vars)
                .map(|(v, &x)| c.coefficient(&v.name) * x)
                .sum();
            let rhs = c.rhs;
            lp = lp.with(match c.operator {
                Operator::Le => constraint!(lhs <= rhs),
                Operator::Ge => constraint!(lhs >= rhs),
                Operator::Eq => constraint!(lhs == rhs),
            });
        }

        match lp.solve() {
            Ok(solution) => {
                let values = model
                    .variables
                    .iter()
                    .zip(&vars)
                    .map(|(v, &x)| {
                        let raw = solution.value(x);
                        let rounded = raw.round();
                        if v.kind.is_integral() && (raw - rounded).abs() < INTEGRALITY_TOLERANCE {
                            rounded
                        } else {
                            sensitivity::snap(raw)
                        }
                    })
                    .collect();
                Ok(PrimalOutcome::Optimal(values))
            }
            Err(e) => Ok(PrimalOutcome::from_error(e)),
        }
    }

    /// Full pipeline for one model, blocking
    pub fn solve_blocking(model: &LpModel, settings: &SolverSettings) -> Result<SolveReport> {
        model.validate(&settings.limits)?;

        let values = match Self::solve_primal(model)? {
            PrimalOutcome::Optimal(values) => values,
            PrimalOutcome::Infeasible => {
                return Ok(SolveReport::without_solution(
                    model.name.clone(),
                    model.sense,
                    SolveStatus::Infeasible,
                ))
            }
            PrimalOutcome::Unbounded => {
                return Ok(SolveReport::without_solution(
                    model.name.clone(),
                    model.sense,
                    SolveStatus::Unbounded,
                ))
            }
            PrimalOutcome::NotSolved => {
                return Ok(SolveReport::without_solution(
                    model.name.clone(),
                    model.sense,
                    SolveStatus::NotSolved,
                ))
            }
        };

        let objective_value = model
            .variables
            .iter()
            .zip(&values)
            .map(|(v, x)| v.objective_coefficient * x)
            .sum::<f64>();

        let mut report = SolveReport {
            problem_name: model.name.clone(),
            sense: model.sense,
            status: SolveStatus::Optimal,
            objective_value: Some(sensitivity::snap(objective_value)),
            variables: model
                .variables
                .iter()
                .zip(&values)
                .map(|(v, &x)| VariableValue {
                    name: v.name.clone(),
                    value: Some(x),
                })
                .collect(),
            constraints_analysis: sensitivity::analyze(model, &values),
            plot: None,
        };

        if model.is_two_dimensional() {
            match plot::render_feasible_region(model, &report, &settings.plot) {
                Ok(chart) => report.plot = Some(chart),
                Err(e) => tracing::warn!(problem = %model.name, error = %e, "plot generation failed"),
            }
        }

        Ok(report)
    }
}

#[async_trait]
impl LpSolver for MilpSolver {
    async fn solve(&self, model: &LpModel) -> Result<SolveReport> {
        let start = Instant::now();
        let owned = model.clone();
        let settings = self.settings.clone();

        let report = with_time_limit(self.settings.time_limit, move || {
            Self::solve_blocking(&owned, &settings)
        })
        .await?;

        tracing::info!(
            problem = %report.problem_name,
            variables = model.variables.len(),
            constraints = model.constraints.len(),
            status = %report.status,
            objective = ?report.objective_value,
            duration_ms = start.elapsed().as_millis() as u64,
            "model solved"
        );

        Ok(report)
    }
}
