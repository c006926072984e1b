use axum::{
    extract::State,
    response::{Html, Redirect},
    Form,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    api::{
        error::flash_message,
        pages,
        session::{self, Flash},
    },
    app::AppState,
    domain::{parse_form, FormFields, SolveReport},
};

pub const RESULTS_PATH: &str = "/results/";

/// GET / - Input form
pub async fn show_form() -> Html<&'static str> {
    Html(pages::FORM_PAGE)
}

async fn solve_fields(state: &AppState, fields: FormFields) -> anyhow::Result<SolveReport> {
    let model = parse_form(&fields)?;
    state.solver.solve(&model).await
}

/// POST / - Solve the submitted form and hand the outcome to the results page
pub async fn submit_form(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> (CookieJar, Redirect) {
    let (jar, session_id) = session::ensure_session(jar, &state.cfg.session.cookie_name);

    let flash = match solve_fields(&state, FormFields::new(pairs)).await {
        Ok(report) => Flash::Results(Box::new(report)),
        Err(e) => {
            tracing::info!(session = %session_id, error = %e, "form submission rejected");
            Flash::Error(flash_message(&e))
        }
    };
    state.flash.put(session_id, flash).await;

    (jar, Redirect::to(RESULTS_PATH))
}

/// GET /results/ - Show and clear the pending outcome
pub async fn show_results(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    let flash = match session::session_id(&jar, &state.cfg.session.cookie_name) {
        Some(id) => state.flash.take(id).await,
        None => None,
    };
    Html(pages::results_page(flash.as_ref()))
}
