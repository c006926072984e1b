use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use validator::Validate;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    app::AppState,
    domain::{
        parse_form, Constraint, FormFields, LpModel, Operator, Sense, SolveReport, VarKind,
        Variable,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/solve", post(solve))
        .route("/solve/form", post(solve_form))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SolveRequest {
    #[validate(length(max = 200))]
    pub name: Option<String>,
    #[serde(default)]
    pub sense: Sense,
    #[validate(length(min = 1), nested)]
    pub variables: Vec<VariableInput>,
    #[serde(default)]
    #[validate(nested)]
    pub constraints: Vec<ConstraintInput>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct VariableInput {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[serde(default)]
    pub kind: VarKind,
    #[serde(default)]
    pub objective: f64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ConstraintInput {
    #[validate(length(max = 200))]
    pub name: Option<String>,
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
    #[serde(default)]
    pub operator: Operator,
    pub rhs: f64,
}

impl SolveRequest {
    /// Same normalisation as the HTML form; structural checks happen in the solver
    pub fn into_model(self) -> LpModel {
        let constraints = self
            .constraints
            .into_iter()
            .enumerate()
            .map(|(idx, c)| {
                let id = (idx + 1).to_string();
                let name = c
                    .name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| Constraint::default_name(&id));
                Constraint {
                    id,
                    name,
                    coefficients: c
                        .coefficients
                        .into_iter()
                        .map(|(var, coef)| (var.trim().replace(' ', "_"), coef))
                        .collect(),
                    operator: c.operator,
                    rhs: c.rhs,
                }
            })
            .collect();

        LpModel {
            name: LpModel::normalize_name(self.name.as_deref()),
            sense: self.sense,
            variables: self
                .variables
                .into_iter()
                .map(|v| Variable {
                    name: v.name.trim().replace(' ', "_"),
                    kind: v.kind,
                    objective_coefficient: v.objective,
                })
                .collect(),
            constraints,
        }
    }
}

async fn run(state: &AppState, model: LpModel) -> Result<ApiResponse<SolveReport>, ApiError> {
    let start = Instant::now();
    let (variables, constraints) = (model.variables.len(), model.constraints.len());
    let report = state.solver.solve(&model).await?;
    Ok(ApiResponse::success(report)
        .with_model_size(variables, constraints)
        .with_duration(start.elapsed().as_millis() as u64))
}

/// POST /api/v1/solve - Solve a model given as JSON
pub async fn solve(
    State(state): State<AppState>,
    payload: Result<Json<SolveRequest>, JsonRejection>,
) -> Result<ApiResponse<SolveReport>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request.validate()?;
    run(&state, request.into_model()).await
}

/// POST /api/v1/solve/form - Solve a model given as the HTML form fields
pub async fn solve_form(
    State(state): State<AppState>,
    payload: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<ApiResponse<SolveReport>, ApiError> {
    let Form(pairs) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let model = parse_form(&FormFields::new(pairs))?;
    run(&state, model).await
}
