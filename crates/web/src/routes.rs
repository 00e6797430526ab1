//! Routes

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, pages, resident, secretary, treasurer};
use crate::middleware::{require_resident, require_secretary, require_treasurer};
use crate::session::session_layer;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let au = Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/login-submit", post(auth::login_submit))
        .route("/register-submit", post(auth::register_submit))
        .route("/logout", get(auth::logout));

    let resident = Router::new()
        .route("/dashboard", get(resident::dashboard))
        .route("/request", get(resident::request_page))
        .route("/my-request", get(resident::my_requests))
        .route("/reports", get(resident::reports))
        .route("/updates", get(resident::updates))
        .route("/comments/:update_id", get(resident::comments))
        .route("/account", get(resident::account))
        .route("/request-submit", post(resident::request_submit))
        .route("/delete-request", post(resident::delete_request))
        .route("/report-submit", post(resident::report_submit))
        .route("/report-delete", post(resident::report_delete))
        .route("/vote-update", post(resident::vote_update))
        .route("/comment-update", post(resident::comment_update))
        .route_layer(from_fn_with_state(state.clone(), require_resident));

    let secretary = Router::new()
        .route("/dashboard", get(secretary::dashboard))
        .route("/requests", get(secretary::requests))
        .route("/residents", get(secretary::residents))
        .route("/reports", get(secretary::reports))
        .route("/updates", get(secretary::updates))
        .route("/account", get(secretary::account))
        .route("/update-request", post(secretary::update_request))
        .route("/add_update", post(secretary::add_update))
        .route("/add_sanction", post(secretary::add_sanction))
        .route("/remove_sanction", post(secretary::remove_sanction))
        .route("/resolve_report", post(secretary::resolve_report))
        .route_layer(from_fn_with_state(state.clone(), require_secretary));

    let treasurer = Router::new()
        .route("/dashboard", get(treasurer::dashboard))
        .route("/financial-reports", get(treasurer::financial_reports))
        .route("/receipts", get(treasurer::receipts))
        .route("/account", get(treasurer::account))
        .route("/mark-paid", post(treasurer::mark_paid))
        .route("/mark-released", post(treasurer::mark_released))
        .route_layer(from_fn_with_state(state.clone(), require_treasurer));

    Router::new()
        // Public
        .route("/", get(pages::landing))
        .route("/health", get(pages::health))
        .nest("/au", au)
        // Role-gated
        .nest("/resident", resident)
        .nest("/secretary", secretary)
        .nest("/treasurer", treasurer)
        // Middleware
        .layer(from_fn_with_state(state.clone(), session_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
