//! Public pages

use super::{document_catalog, page};
use crate::session::Session;
use axum::{response::{IntoResponse, Response}, Extension, Json};
use barangay_business::greeting_at;
use barangay_core::time;
use serde_json::json;

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn landing(Extension(session): Extension<Session>) -> Response {
    let actor = session.actor();
    page(
        &session,
        json!({
            "greeting": greeting_at(time::now()),
            "role": actor.map(|actor| actor.role),
            "dashboard": actor.map(|actor| actor.role.dashboard_path()),
            "documents": document_catalog(),
        }),
    )
}
