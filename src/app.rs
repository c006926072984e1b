use std::sync::Arc;
use std::time::Duration;

use crate::api::session::FlashStore;
use crate::config::Config;
use crate::optimizer::{LpSolver, MilpSolver};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub solver: Arc<dyn LpSolver>,
    pub flash: FlashStore,
}

impl AppState {
    pub fn new(cfg: Config) -> Self {
        let solver = Arc::new(MilpSolver::new(cfg.solver_settings()));
        Self::with_solver(cfg, solver)
    }

    /// State around a caller-provided solver
    pub fn with_solver(cfg: Config, solver: Arc<dyn LpSolver>) -> Self {
        let flash = FlashStore::new(Duration::from_secs(cfg.session.ttl_seconds));
        Self { cfg, solver, flash }
    }
}
