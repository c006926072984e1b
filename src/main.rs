use anyhow::{Context, Result};
use lp_web::{api, app::AppState, config::Config, telemetry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::load().context("loading configuration")?;
    telemetry::init_tracing(cfg.logging.format, &cfg.logging.filter);

    let state = AppState::new(cfg.clone());
    let app = api::router(state);

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "Server binding to 0.0.0.0 - the solver will be reachable from the network. \
            Bind to 127.0.0.1 unless behind a reverse proxy."
        );
    }

    info!(
        %addr,
        time_limit_seconds = cfg.solver.time_limit_seconds,
        max_variables = cfg.solver.max_variables,
        max_constraints = cfg.solver.max_constraints,
        "starting lp-web"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}
