pub mod error;
pub mod health;
pub mod pages;
pub mod response;
pub mod session;
pub mod v1;
pub mod web;

use axum::{http::StatusCode, routing::get, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::app::AppState;

pub fn router(state: AppState) -> Router {
    let server = state.cfg.server.clone();

    let mut router = Router::new()
        .route("/", get(web::show_form).post(web::submit_form))
        .route(web::RESULTS_PATH, get(web::show_results))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/api/v1", v1::router())
        .with_state(state);

    if server.enable_cors {
        use tower_http::cors::Any;
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(server.body_limit_bytes))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(server.request_timeout_secs),
                )),
        )
        .layer(TraceLayer::new_for_http())
}
