use serde::{Deserialize, Serialize};
use strum::Display;

use super::{Operator, Sense};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    #[strum(to_string = "Not Solved")]
    NotSolved,
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableValue {
    pub name: String,
    pub value: Option<f64>,
}

/// Post-solve sensitivity figures for one constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintAnalysis {
    pub name: String,
    pub operator: Operator,
    pub rhs: f64,
    /// Left-hand side at the optimum
    pub activity: f64,
    /// Unused capacity, never negative
    pub slack: f64,
    /// Change of the optimal objective per unit increase of `rhs`
    pub shadow_price: Option<f64>,
    pub binding: bool,
}

/// Rendered feasible-region chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub svg: String,
    pub data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub problem_name: String,
    pub sense: Sense,
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    pub variables: Vec<VariableValue>,
    pub constraints_analysis: Vec<ConstraintAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<Plot>,
}

impl SolveReport {
    /// Report for a problem the solver could not bring to optimality
    pub fn without_solution(problem_name: String, sense: Sense, status: SolveStatus) -> Self {
        Self {
            problem_name,
            sense,
            status,
            objective_value: None,
            variables: Vec::new(),
            constraints_analysis: Vec::new(),
            plot: None,
        }
    }

    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .and_then(|v| v.value)
    }
}
