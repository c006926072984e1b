//! Post-solve constraint analysis
//!
//! Slack comes straight from the primal point. Shadow prices are read off the
//! dual LP, solved with the same backend. Integer and binary columns are fixed
//! at their optimal values first and folded into the right-hand sides, so a
//! MIP reports the duals of its final continuous subproblem.

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel,
};
use std::collections::HashMap;

use crate::domain::{ConstraintAnalysis, LpModel, Operator, Sense};

/// Constraints with at most this much slack are reported as binding
pub const BINDING_TOLERANCE: f64 = 1e-7;

const ZERO_SNAP: f64 = 1e-9;

pub fn snap(value: f64) -> f64 {
    if value.abs() < ZERO_SNAP {
        0.0
    } else {
        value
    }
}

/// Unused capacity, oriented so that it is never negative at a feasible point
pub fn slack(operator: Operator, activity: f64, rhs: f64) -> f64 {
    let raw = match operator {
        Operator::Le => rhs - activity,
        Operator::Ge => activity - rhs,
        Operator::Eq => (rhs - activity).abs(),
    };
    snap(raw)
}

/// Sign domain of the dual variable, chosen so that `y = ∂z*/∂rhs`
fn dual_domain(sense: Sense, operator: Operator) -> good_lp::variable::VariableDefinition {
    match (sense, operator) {
        (_, Operator::Eq) => variable(),
        (Sense::Maximize, Operator::Le) | (Sense::Minimize, Operator::Ge) => variable().min(0.0),
        (Sense::Maximize, Operator::Ge) | (Sense::Minimize, Operator::Le) => variable().max(0.0),
    }
}

fn solve_dual(model: &LpModel, values: &[f64]) -> Result<Vec<f64>, ResolutionError> {
    let mut vars = ProblemVariables::new();
    let duals: Vec<good_lp::Variable> = model
        .constraints
        .iter()
        .map(|c| vars.add(dual_domain(model.sense, c.operator)))
        .collect();

    // integer columns sit at their optimum and move to the right-hand side
    let fixed_rhs: Vec<f64> = if model.has_integer_variables() {
        model
            .constraints
            .iter()
            .map(|c| {
                let fixed: f64 = model
                    .variables
                    .iter()
                    .zip(values)
                    .filter(|(v, _)| v.kind.is_integral())
                    .map(|(v, value)| c.coefficient(&v.name) * value)
                    .sum();
                snap(c.rhs - fixed)
            })
            .collect()
    } else {
        model.constraints.iter().map(|c| c.rhs).collect()
    };

    let objective: Expression = fixed_rhs
        .iter()
        .zip(&duals)
        .map(|(b, &y)| *b * y)
        .sum();

    let mut problem = match model.sense {
        Sense::Maximize => vars.minimise(objective),
        Sense::Minimize => vars.maximise(objective),
    }
    .using(default_solver);

    for var in model.variables.iter().filter(|v| !v.kind.is_integral()) {
        let column: Vec<(f64, good_lp::Variable)> = model
            .constraints
            .iter()
            .zip(&duals)
            .map(|(c, &y)| (c.coefficient(&var.name), y))
            .filter(|(a, _)| *a != 0.0)
            .collect();
        if column.is_empty() {
            continue;
        }
        let lhs: Expression = column.into_iter().map(|(a, y)| a * y).sum();
        let cost = var.objective_coefficient;
        problem = problem.with(match model.sense {
            Sense::Maximize => constraint!(lhs >= cost),
            Sense::Minimize => constraint!(lhs <= cost),
        });
    }

    let solution = problem.solve()?;
    Ok(duals.iter().map(|&y| snap(solution.value(y))).collect())
}

/// Shadow price per constraint, `None` when the dual could not be solved.
///
/// `values` is aligned with `model.variables`.
pub fn shadow_prices(model: &LpModel, values: &[f64]) -> Option<Vec<f64>> {
    if model.constraints.is_empty() {
        return Some(Vec::new());
    }
    if model.variables.iter().all(|v| v.kind.is_integral()) {
        // nothing left to price once every column is fixed
        return Some(vec![0.0; model.constraints.len()]);
    }

    match solve_dual(model, values) {
        Ok(prices) => Some(prices),
        Err(e) => {
            tracing::warn!(problem = %model.name, error = %e, "dual solve failed, shadow prices unavailable");
            None
        }
    }
}

/// Slack, activity and shadow price for every constraint of an optimal solution
pub fn analyze(model: &LpModel, values: &[f64]) -> Vec<ConstraintAnalysis> {
    let by_name: HashMap<&str, f64> = model
        .variables
        .iter()
        .map(|v| v.name.as_str())
        .zip(values.iter().copied())
        .collect();
    let prices = shadow_prices(model, values);

    model
        .constraints
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            let activity = snap(c.activity(|name| by_name.get(name).copied()));
            let slack = slack(c.operator, activity, c.rhs);
            ConstraintAnalysis {
                name: c.name.clone(),
                operator: c.operator,
                rhs: c.rhs,
                activity,
                slack,
                shadow_price: prices.as_ref().map(|p| p[idx]),
                binding: slack <= BINDING_TOLERANCE,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Constraint, VarKind, Variable};
    use std::collections::BTreeMap;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn var(name: &str, kind: VarKind, c: f64) -> Variable {
        Variable {
            name: name.to_string(),
            kind,
            objective_coefficient: c,
        }
    }

    fn constraint(id: &str, coefs: &[(&str, f64)], operator: Operator, rhs: f64) -> Constraint {
        Constraint {
            id: id.to_string(),
            name: Constraint::default_name(id),
            coefficients: coefs
                .iter()
                .map(|(n, c)| (n.to_string(), *c))
                .collect::<BTreeMap<_, _>>(),
            operator,
            rhs,
        }
    }

    fn wyndor() -> LpModel {
        LpModel {
            name: "Wyndor".to_string(),
            sense: Sense::Maximize,
            variables: vec![
                var("x", VarKind::Continuous, 3.0),
                var("y", VarKind::Continuous, 5.0),
            ],
            constraints: vec![
                constraint("1", &[("x", 1.0)], Operator::Le, 4.0),
                constraint("2", &[("y", 2.0)], Operator::Le, 12.0),
                constraint("3", &[("x", 3.0), ("y", 2.0)], Operator::Le, 18.0),
            ],
        }
    }

    #[test]
    fn test_slack_orientation() {
        assert_eq!(slack(Operator::Le, 3.0, 4.0), 1.0);
        assert_eq!(slack(Operator::Ge, 7.0, 4.0), 3.0);
        assert_eq!(slack(Operator::Eq, 4.0, 4.0), 0.0);
        assert_eq!(slack(Operator::Le, 4.0 + 1e-12, 4.0), 0.0);
    }

    #[test]
    fn test_wyndor_analysis() {
        let model = wyndor();
        let analysis = analyze(&model, &[2.0, 6.0]);

        assert_eq!(analysis.len(), 3);
        assert!(approx(analysis[0].slack, 2.0));
        assert!(!analysis[0].binding);
        assert!(analysis[1].binding);
        assert!(analysis[2].binding);
        assert_eq!(analysis[2].activity, 18.0);

        let prices: Vec<f64> = analysis.iter().map(|a| a.shadow_price.unwrap()).collect();
        assert!(approx(prices[0], 0.0));
        assert!(approx(prices[1], 1.5));
        assert!(approx(prices[2], 1.0));
    }

    #[test]
    fn test_minimize_with_ge_constraints() {
        // min 2x + 3y  s.t. x + y >= 4, x + 3y >= 6  ->  x = 3, y = 1, z = 9
        let model = LpModel {
            name: "Diet".to_string(),
            sense: Sense::Minimize,
            variables: vec![
                var("x", VarKind::Continuous, 2.0),
                var("y", VarKind::Continuous, 3.0),
            ],
            constraints: vec![
                constraint("1", &[("x", 1.0), ("y", 1.0)], Operator::Ge, 4.0),
                constraint("2", &[("x", 1.0), ("y", 3.0)], Operator::Ge, 6.0),
            ],
        };
        let prices = shadow_prices(&model, &[3.0, 1.0]).unwrap();
        // dual: y1 + y2 = 2, y1 + 3 y2 = 3 -> y1 = 1.5, y2 = 0.5
        assert!(approx(prices[0], 1.5));
        assert!(approx(prices[1], 0.5));
        // strong duality
        assert!(approx(4.0 * prices[0] + 6.0 * prices[1], 9.0));
    }

    #[test]
    fn test_equality_shadow_price_can_be_negative() {
        // max x - y  s.t. x + y = 5, x <= 3  ->  x = 3, y = 2
        let model = LpModel {
            name: "Eq".to_string(),
            sense: Sense::Maximize,
            variables: vec![
                var("x", VarKind::Continuous, 1.0),
                var("y", VarKind::Continuous, -1.0),
            ],
            constraints: vec![
                constraint("1", &[("x", 1.0), ("y", 1.0)], Operator::Eq, 5.0),
                constraint("2", &[("x", 1.0)], Operator::Le, 3.0),
            ],
        };
        let prices = shadow_prices(&model, &[3.0, 2.0]).unwrap();
        assert!(approx(prices[0], -1.0));
        assert!(approx(prices[1], 2.0));
    }

    #[test]
    fn test_integer_columns_are_fixed() {
        // max 4n + 3x  s.t. n + x <= 5.5, x <= 2, n integer  ->  n = 5, x = 0.5
        let model = LpModel {
            name: "Mixed".to_string(),
            sense: Sense::Maximize,
            variables: vec![
                var("n", VarKind::Integer, 4.0),
                var("x", VarKind::Continuous, 3.0),
            ],
            constraints: vec![
                constraint("1", &[("n", 1.0), ("x", 1.0)], Operator::Le, 5.5),
                constraint("2", &[("x", 1.0)], Operator::Le, 2.0),
            ],
        };
        let prices = shadow_prices(&model, &[5.0, 0.5]).unwrap();
        assert!(approx(prices[0], 3.0));
        assert!(approx(prices[1], 0.0));
    }

    #[test]
    fn test_pure_integer_and_unconstrained() {
        let mut model = wyndor();
        for v in &mut model.variables {
            v.kind = VarKind::Integer;
        }
        assert_eq!(shadow_prices(&model, &[2.0, 6.0]), Some(vec![0.0; 3]));

        model.constraints.clear();
        assert_eq!(shadow_prices(&model, &[0.0, 0.0]), Some(vec![]));
        assert!(analyze(&model, &[0.0, 0.0]).is_empty());
    }
}
