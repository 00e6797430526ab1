//! `/au` - login, register, logout

use super::{done, page};
use crate::error::{self, LOGIN_PATH};
use crate::session::Session;
use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use barangay_business::{AuthService, RegisterForm};
use serde::Deserialize;
use serde_json::json;

const REGISTER_PATH: &str = "/au/register";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_page(Extension(session): Extension<Session>) -> Response {
    if let Some(actor) = session.actor() {
        return Redirect::to(&actor.role.dashboard_path()).into_response();
    }
    page(&session, json!({ "form": "login" }))
}

pub async fn register_page(Extension(session): Extension<Session>) -> Response {
    page(&session, json!({ "form": "register" }))
}

pub async fn login_submit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<LoginForm>,
) -> Response {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return error::invalid(&session, "Email and password are required", LOGIN_PATH);
    }

    match AuthService::new(state.ctx()).login(&form.email, &form.password).await {
        Ok(actor) => {
            session.sign_in(actor);
            done(&session, "Login successful", &actor.role.dashboard_path())
        }
        Err(err) => error::fail(&session, err, LOGIN_PATH),
    }
}

pub async fn register_submit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<RegisterForm>,
) -> Response {
    match AuthService::new(state.ctx()).register(&form).await {
        Ok(_) => done(&session, "Registration successful! You can now log in.", LOGIN_PATH),
        Err(err) => error::fail(&session, err, REGISTER_PATH),
    }
}

pub async fn logout(State(state): State<AppState>, Extension(session): Extension<Session>) -> Response {
    if let Some(actor) = session.actor() {
        if let Err(err) = AuthService::new(state.ctx()).logout(actor).await {
            tracing::error!(actor = %actor, error = %format!("{err:#}"), "Failed to mark actor offline");
        }
    }
    session.sign_out();
    done(&session, "You have been logged out", LOGIN_PATH)
}
