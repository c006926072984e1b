//! Dynamic form-field parsing
//!
//! The input form grows rows on the client side, so variables and constraints
//! arrive as indexed field names (`var_name_3`, `const_2_rhs`, ...). This module
//! turns those flat key/value pairs into an [`LpModel`].

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use super::{Constraint, LpModel, Operator, Sense, VarKind, Variable};

static VAR_NAME_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^var_name_(\d+)").expect("valid variable key pattern"));
static CONST_RHS_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^const_(\d+)_rhs").expect("valid constraint key pattern"));

/// Errors caused by the submitted data, as opposed to solver or server failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("no valid decision variable was defined")]
    NoVariables,

    #[error("variable names must not be empty")]
    EmptyVariableName,

    #[error("variable '{0}' is defined more than once")]
    DuplicateVariable(String),

    #[error("field '{field}' has an unknown variable type '{value}'")]
    UnknownVariableKind { field: String, value: String },

    #[error("field '{field}' has an unknown operator '{value}'")]
    UnknownOperator { field: String, value: String },

    #[error("field '{field}' is not a valid number: '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("{0} must be a finite number")]
    NonFinite(String),

    #[error("{constraint} refers to undeclared variable '{variable}'")]
    UnknownVariable { constraint: String, variable: String },

    #[error("{count} variables exceed the limit of {limit}")]
    TooManyVariables { count: usize, limit: usize },

    #[error("{count} constraints exceed the limit of {limit}")]
    TooManyConstraints { count: usize, limit: usize },
}

/// Ordered view over urlencoded pairs.
///
/// Lookups return the last value of a repeated key; key iteration yields each
/// key once, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
    last: HashMap<String, usize>,
}

impl FormFields {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        let last = pairs
            .iter()
            .enumerate()
            .map(|(idx, (key, _))| (key.clone(), idx))
            .collect();
        Self { pairs, last }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.last.get(key).map(|&idx| self.pairs[idx].1.as_str())
    }

    /// Present and not blank
    pub fn get_filled(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str()).unique()
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl From<Vec<(String, String)>> for FormFields {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for FormFields {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64, FormError> {
    let value: f64 = raw.trim().parse().map_err(|_| FormError::InvalidNumber {
        field: field.to_string(),
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(FormError::NonFinite(format!("field '{}'", field)));
    }
    Ok(value)
}

/// Rows are keyed by their form id: a repeated id replaces the earlier row in place
fn upsert<T>(rows: &mut Vec<(String, T)>, id: &str, row: T) {
    match rows.iter_mut().find(|(existing, _)| existing == id) {
        Some(slot) => slot.1 = row,
        None => rows.push((id.to_string(), row)),
    }
}

fn parse_variables(fields: &FormFields) -> Result<Vec<Variable>, FormError> {
    let mut rows: Vec<(String, Variable)> = Vec::new();

    for key in fields.keys() {
        let Some(caps) = VAR_NAME_KEY.captures(key) else {
            continue;
        };
        let id = &caps[1];
        let name = fields.get(key).unwrap_or_default().trim().replace(' ', "_");
        if name.is_empty() {
            continue;
        }

        let type_field = format!("var_type_{}", id);
        let kind = VarKind::parse_field(&type_field, fields.get(&type_field))?;

        // absent means 0, present but blank is an input error
        let coef_field = format!("obj_coef_{}", name);
        let objective_coefficient = match fields.get(&coef_field) {
            Some(raw) => parse_number(&coef_field, raw)?,
            None => 0.0,
        };

        upsert(
            &mut rows,
            id,
            Variable {
                name,
                kind,
                objective_coefficient,
            },
        );
    }

    if rows.is_empty() {
        return Err(FormError::NoVariables);
    }
    if let Some(name) = rows.iter().map(|(_, v)| v.name.as_str()).duplicates().next() {
        return Err(FormError::DuplicateVariable(name.to_string()));
    }
    Ok(rows.into_iter().map(|(_, v)| v).collect())
}

fn parse_constraints(
    fields: &FormFields,
    variables: &[Variable],
) -> Result<Vec<Constraint>, FormError> {
    let mut rows: Vec<(String, Constraint)> = Vec::new();

    for key in fields.keys() {
        let Some(caps) = CONST_RHS_KEY.captures(key) else {
            continue;
        };
        let id = caps[1].to_string();
        let rhs = parse_number(key, fields.get(key).unwrap_or_default())?;

        let op_field = format!("const_{}_op", id);
        let operator = Operator::parse_field(&op_field, fields.get(&op_field))?;

        let mut coefficients = BTreeMap::new();
        for var in variables {
            let coef_field = format!("const_{}_coef_{}", id, var.name);
            if let Some(raw) = fields.get_filled(&coef_field) {
                coefficients.insert(var.name.clone(), parse_number(&coef_field, raw)?);
            }
        }

        upsert(
            &mut rows,
            &id,
            Constraint {
                name: Constraint::default_name(&id),
                id: id.clone(),
                coefficients,
                operator,
                rhs,
            },
        );
    }

    Ok(rows.into_iter().map(|(_, c)| c).collect())
}

/// Builds a model from the submitted form fields
pub fn parse_form(fields: &FormFields) -> Result<LpModel, FormError> {
    let variables = parse_variables(fields)?;
    let constraints = parse_constraints(fields, &variables)?;

    let model = LpModel {
        name: LpModel::normalize_name(fields.get("problem_name")),
        sense: Sense::from_form_value(fields.get("objective_type")),
        variables,
        constraints,
    };

    tracing::debug!(
        problem = %model.name,
        variables = model.variables.len(),
        constraints = model.constraints.len(),
        "parsed form into model"
    );

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textbook_form() -> FormFields {
        [
            ("problem_name", "Wyndor Glass"),
            ("objective_type", "max"),
            ("var_name_1", "x"),
            ("var_type_1", "Continuous"),
            ("var_name_2", "y"),
            ("var_type_2", "Continuous"),
            ("obj_coef_x", "3"),
            ("obj_coef_y", "5"),
            ("const_1_coef_x", "1"),
            ("const_1_op", "<="),
            ("const_1_rhs", "4"),
            ("const_2_coef_y", "2"),
            ("const_2_op", "<="),
            ("const_2_rhs", "12"),
            ("const_3_coef_x", "3"),
            ("const_3_coef_y", "2"),
            ("const_3_op", "<="),
            ("const_3_rhs", "18"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_parse_textbook_form() {
        let model = parse_form(&textbook_form()).unwrap();

        assert_eq!(model.name, "Wyndor_Glass");
        assert_eq!(model.sense, Sense::Maximize);
        assert_eq!(model.variable_names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(model.variable("x").unwrap().objective_coefficient, 3.0);
        assert_eq!(model.variable("y").unwrap().objective_coefficient, 5.0);

        assert_eq!(model.constraints.len(), 3);
        let c3 = &model.constraints[2];
        assert_eq!(c3.name, "Constraint_3");
        assert_eq!(c3.operator, Operator::Le);
        assert_eq!(c3.rhs, 18.0);
        assert_eq!(c3.coefficient("x"), 3.0);
        assert_eq!(c3.coefficient("y"), 2.0);
        // blank or absent coefficients are not stored
        assert!(!model.constraints[0].coefficients.contains_key("y"));
    }

    #[test]
    fn test_variable_names_are_normalized_and_blank_rows_skipped() {
        let fields: FormFields = [
            ("var_name_1", "  units made "),
            ("var_name_2", "   "),
            ("var_name_3", "z"),
            ("obj_coef_units_made", "2.5"),
        ]
        .into_iter()
        .collect();

        let model = parse_form(&fields).unwrap();
        assert_eq!(model.variable_names().collect::<Vec<_>>(), vec!["units_made", "z"]);
        assert_eq!(model.variables[0].objective_coefficient, 2.5);
        // missing objective coefficient defaults to zero
        assert_eq!(model.variables[1].objective_coefficient, 0.0);
        assert_eq!(model.sense, Sense::Minimize);
        assert_eq!(model.name, crate::domain::DEFAULT_PROBLEM_NAME);
    }

    #[test]
    fn test_no_variables() {
        let fields: FormFields = [("var_name_1", ""), ("const_1_rhs", "3")].into_iter().collect();
        assert_eq!(parse_form(&fields), Err(FormError::NoVariables));
    }

    #[test]
    fn test_duplicate_variable() {
        let fields: FormFields = [("var_name_1", "x"), ("var_name_2", " x ")].into_iter().collect();
        assert_eq!(
            parse_form(&fields),
            Err(FormError::DuplicateVariable("x".to_string()))
        );
    }

    #[test]
    fn test_invalid_numbers_name_the_field() {
        let fields: FormFields = [("var_name_1", "x"), ("obj_coef_x", "abc")].into_iter().collect();
        let err = parse_form(&fields).unwrap_err();
        assert_eq!(
            err,
            FormError::InvalidNumber {
                field: "obj_coef_x".to_string(),
                value: "abc".to_string()
            }
        );

        let fields: FormFields = [("var_name_1", "x"), ("const_1_rhs", "")].into_iter().collect();
        assert!(matches!(
            parse_form(&fields),
            Err(FormError::InvalidNumber { field, .. }) if field == "const_1_rhs"
        ));

        let fields: FormFields = [("var_name_1", "x"), ("const_1_rhs", "inf")].into_iter().collect();
        assert!(matches!(parse_form(&fields), Err(FormError::NonFinite(_))));
    }

    #[test]
    fn test_missing_operator_means_equality() {
        let fields: FormFields = [
            ("var_name_1", "x"),
            ("const_7_coef_x", "1"),
            ("const_7_rhs", "5"),
        ]
        .into_iter()
        .collect();
        let model = parse_form(&fields).unwrap();
        assert_eq!(model.constraints[0].operator, Operator::Eq);
        assert_eq!(model.constraints[0].id, "7");
    }

    #[test]
    fn test_repeated_keys_use_last_value() {
        let fields: FormFields = [
            ("var_name_1", "a"),
            ("var_name_1", "b"),
            ("objective_type", "min"),
            ("objective_type", "max"),
        ]
        .into_iter()
        .collect();
        assert_eq!(fields.len(), 2);
        let model = parse_form(&fields).unwrap();
        assert_eq!(model.variable_names().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(model.sense, Sense::Maximize);
    }

    #[test]
    fn test_key_patterns_are_anchored_at_start_only() {
        let fields: FormFields = [
            ("var_name_1x", "x"),
            ("other_var_name_2", "ignored"),
            ("const_1_rhs_extra", "4"),
            ("const_1_coef_x", "2"),
        ]
        .into_iter()
        .collect();
        let model = parse_form(&fields).unwrap();
        assert_eq!(model.variables.len(), 1);
        assert_eq!(model.constraints.len(), 1);
        assert_eq!(model.constraints[0].rhs, 4.0);
        assert_eq!(model.constraints[0].coefficient("x"), 2.0);
    }

    #[test]
    fn test_repeated_constraint_id_keeps_one_row() {
        let fields: FormFields = [
            ("var_name_1", "x"),
            ("const_1_coef_x", "1"),
            ("const_1_op", "<="),
            ("const_1_rhs", "4"),
            ("const_2_rhs", "7"),
            ("const_1_rhs_old", "9"),
        ]
        .into_iter()
        .collect();
        let model = parse_form(&fields).unwrap();

        let rows: Vec<(&str, f64)> = model
            .constraints
            .iter()
            .map(|c| (c.name.as_str(), c.rhs))
            .collect();
        assert_eq!(rows, vec![("Constraint_1", 9.0), ("Constraint_2", 7.0)]);
        assert_eq!(model.constraints[0].operator, Operator::Le);
    }

    #[test]
    fn test_repeated_variable_id_keeps_last_name() {
        let fields: FormFields = [
            ("var_name_1", "a"),
            ("var_name_2", "b"),
            ("var_name_1x", "c"),
            ("var_name_1y", "  "),
        ]
        .into_iter()
        .collect();
        let model = parse_form(&fields).unwrap();
        assert_eq!(model.variable_names().collect::<Vec<_>>(), vec!["c", "b"]);
    }

    #[test]
    fn test_blank_objective_coefficient_is_rejected() {
        let fields: FormFields = [("var_name_1", "x"), ("obj_coef_x", " ")].into_iter().collect();
        assert_eq!(
            parse_form(&fields),
            Err(FormError::InvalidNumber {
                field: "obj_coef_x".to_string(),
                value: " ".to_string()
            })
        );
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let fields: FormFields = [
            ("var_name_10", "b"),
            ("var_name_2", "a"),
            ("const_5_rhs", "1"),
            ("const_1_rhs", "2"),
        ]
        .into_iter()
        .collect();
        let model = parse_form(&fields).unwrap();
        assert_eq!(model.variable_names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(model.constraints[0].id, "5");
        assert_eq!(model.constraints[1].id, "1");
    }
}
