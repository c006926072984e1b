use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::app::AppState;
use crate::domain::{Constraint, LpModel, Operator, Sense, VarKind, Variable};
use crate::optimizer::{MilpSolver, PrimalOutcome};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    version: &'static str,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    solver: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy".to_string(),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            latency_ms: None,
            error: Some(error),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// max x  s.t. x <= 1
fn probe_model() -> LpModel {
    LpModel {
        name: "health_probe".to_string(),
        sense: Sense::Maximize,
        variables: vec![Variable {
            name: "x".to_string(),
            kind: VarKind::Continuous,
            objective_coefficient: 1.0,
        }],
        constraints: vec![Constraint {
            id: "1".to_string(),
            name: Constraint::default_name("1"),
            coefficients: BTreeMap::from([("x".to_string(), 1.0)]),
            operator: Operator::Le,
            rhs: 1.0,
        }],
    }
}

/// Solves a one-variable LP on the blocking pool
async fn check_solver() -> anyhow::Result<u64> {
    let start = Instant::now();
    let outcome = tokio::task::spawn_blocking(|| MilpSolver::solve_primal(&probe_model())).await??;
    match outcome {
        PrimalOutcome::Optimal(values) if (values[0] - 1.0).abs() < 1e-6 => {
            Ok(start.elapsed().as_millis() as u64)
        }
        other => anyhow::bail!("unexpected probe outcome: {:?}", other),
    }
}

/// GET /health - Health check endpoint
pub async fn health_check(State(_state): State<AppState>) -> impl IntoResponse {
    let solver = match check_solver().await {
        Ok(latency) => ComponentHealth::healthy(latency),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    };
    let healthy = solver.is_healthy();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks { solver },
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

/// GET /health/ready - Readiness probe
pub async fn readiness_check() -> impl IntoResponse {
    match check_solver().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "solver readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /health/live - Liveness probe
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
