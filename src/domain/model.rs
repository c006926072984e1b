use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use strum::{Display, EnumString};

use super::FormError;

/// Name used when the user leaves the problem name empty
pub const DEFAULT_PROBLEM_NAME: &str = "DynamicProblem";

/// Optimization direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Sense {
    #[strum(to_string = "max", serialize = "maximize")]
    #[serde(alias = "max", alias = "maximise")]
    Maximize,
    #[default]
    #[strum(to_string = "min", serialize = "minimize")]
    #[serde(alias = "min", alias = "minimise")]
    Minimize,
}

impl Sense {
    /// Form semantics: only the literal `max` selects maximization
    pub fn from_form_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("max") => Sense::Maximize,
            _ => Sense::Minimize,
        }
    }
}

/// Domain of a decision variable. Every variable is bounded below by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum VarKind {
    #[default]
    Continuous,
    Integer,
    Binary,
}

impl VarKind {
    pub fn is_integral(&self) -> bool {
        matches!(self, VarKind::Integer | VarKind::Binary)
    }

    /// Missing or blank means continuous, anything else must name a kind
    pub fn parse_field(field: &str, value: Option<&str>) -> Result<Self, FormError> {
        match value.map(str::trim) {
            None | Some("") => Ok(VarKind::Continuous),
            Some(raw) => raw.parse().map_err(|_| FormError::UnknownVariableKind {
                field: field.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}

/// Relation between the left-hand side and the right-hand side of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
pub enum Operator {
    #[strum(to_string = "<=")]
    #[serde(rename = "<=", alias = "le")]
    Le,
    #[strum(to_string = ">=")]
    #[serde(rename = ">=", alias = "ge")]
    Ge,
    #[default]
    #[strum(to_string = "=", serialize = "==")]
    #[serde(rename = "=", alias = "==", alias = "eq")]
    Eq,
}

impl Operator {
    /// Missing or blank means equality
    pub fn parse_field(field: &str, value: Option<&str>) -> Result<Self, FormError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Operator::Eq),
            Some(raw) => raw.parse().map_err(|_| FormError::UnknownOperator {
                field: field.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub objective_coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub name: String,
    /// Coefficients by variable name; absent variables have coefficient 0
    pub coefficients: BTreeMap<String, f64>,
    pub operator: Operator,
    pub rhs: f64,
}

impl Constraint {
    pub fn default_name(id: &str) -> String {
        format!("Constraint_{}", id)
    }

    pub fn coefficient(&self, variable: &str) -> f64 {
        self.coefficients.get(variable).copied().unwrap_or(0.0)
    }

    /// Left-hand side evaluated at `values`
    pub fn activity(&self, value_of: impl Fn(&str) -> Option<f64>) -> f64 {
        self.coefficients
            .iter()
            .map(|(name, coef)| coef * value_of(name).unwrap_or(0.0))
            .sum()
    }
}

/// Upper bounds on accepted problem size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelLimits {
    pub max_variables: usize,
    pub max_constraints: usize,
}

impl Default for ModelLimits {
    fn default() -> Self {
        Self {
            max_variables: 200,
            max_constraints: 500,
        }
    }
}

/// A linear program as entered by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpModel {
    pub name: String,
    pub sense: Sense,
    /// Declaration order
    pub variables: Vec<Variable>,
    /// Declaration order
    pub constraints: Vec<Constraint>,
}

impl LpModel {
    /// Trimmed, spaces replaced by underscores, empty falls back to the default name
    pub fn normalize_name(raw: Option<&str>) -> String {
        let name = raw.map(str::trim).unwrap_or_default().replace(' ', "_");
        if name.is_empty() {
            DEFAULT_PROBLEM_NAME.to_string()
        } else {
            name
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    pub fn is_two_dimensional(&self) -> bool {
        self.variables.len() == 2
    }

    pub fn has_integer_variables(&self) -> bool {
        self.variables.iter().any(|v| v.kind.is_integral())
    }

    /// Checks the structural invariants every solver entry point relies on
    pub fn validate(&self, limits: &ModelLimits) -> Result<(), FormError> {
        if self.variables.is_empty() {
            return Err(FormError::NoVariables);
        }
        if self.variables.len() > limits.max_variables {
            return Err(FormError::TooManyVariables {
                count: self.variables.len(),
                limit: limits.max_variables,
            });
        }
        if self.constraints.len() > limits.max_constraints {
            return Err(FormError::TooManyConstraints {
                count: self.constraints.len(),
                limit: limits.max_constraints,
            });
        }

        let mut seen = HashSet::new();
        for var in &self.variables {
            if var.name.is_empty() {
                return Err(FormError::EmptyVariableName);
            }
            if !seen.insert(var.name.as_str()) {
                return Err(FormError::DuplicateVariable(var.name.clone()));
            }
            if !var.objective_coefficient.is_finite() {
                return Err(FormError::NonFinite(format!("objective coefficient of {}", var.name)));
            }
        }

        for constraint in &self.constraints {
            if !constraint.rhs.is_finite() {
                return Err(FormError::NonFinite(format!("right-hand side of {}", constraint.name)));
            }
            for (name, coef) in &constraint.coefficients {
                if !seen.contains(name.as_str()) {
                    return Err(FormError::UnknownVariable {
                        constraint: constraint.name.clone(),
                        variable: name.clone(),
                    });
                }
                if !coef.is_finite() {
                    return Err(FormError::NonFinite(format!(
                        "coefficient of {} in {}",
                        name, constraint.name
                    )));
                }
            }
        }

        Ok(())
    }
}
