//! Role gates for the `/resident`, `/secretary` and `/treasurer` groups
//!
//! The gate inserts the session's [`Actor`] into request extensions so
//! handlers can extract it with `Extension<Actor>`.

use crate::error::{self, LOGIN_PATH};
use crate::session::Session;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use barangay_business::EligibilityGate;
use barangay_core::{Actor, Role};

async fn gate(state: &AppState, session: &Session, role: Role, mut req: Request, next: Next) -> Response {
    let Some(actor) = session.actor().filter(|actor| actor.is(role)) else {
        tracing::debug!(required = role.as_str(), path = %req.uri().path(), "Unauthenticated access");
        session.flash("Please log in to continue");
        return Redirect::to(LOGIN_PATH).into_response();
    };

    // Sanctions issued after login take effect on the next request.
    if role == Role::Resident {
        if let Err(err) = EligibilityGate::new(state.ctx()).ensure_eligible(actor.id).await {
            return error::fail(session, err, LOGIN_PATH);
        }
    }

    req.extensions_mut().insert::<Actor>(actor);
    next.run(req).await
}

pub async fn require_resident(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    req: Request,
    next: Next,
) -> Response {
    gate(&state, &session, Role::Resident, req, next).await
}

pub async fn require_secretary(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    req: Request,
    next: Next,
) -> Response {
    gate(&state, &session, Role::Secretary, req, next).await
}

pub async fn require_treasurer(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    req: Request,
    next: Next,
) -> Response {
    gate(&state, &session, Role::Treasurer, req, next).await
}
