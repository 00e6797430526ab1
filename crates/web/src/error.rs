//! Failure → redirect + flash
//!
//! - validation, not found: message của lỗi, redirect về trang trước
//! - authorization, sanctioned: xoá actor khỏi session, redirect về login
//! - store / unexpected: log nguyên nhân, flash generic message

use crate::session::Session;
use axum::response::{IntoResponse, Redirect, Response};
use barangay_business::{classify, BusinessError, ErrorKind};
use barangay_core::CoreError;

pub const LOGIN_PATH: &str = "/au/login";

pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Message safe to show the user. Skips `.context(...)` layers so the
/// domain error's own text is shown.
pub fn user_message(err: &anyhow::Error) -> String {
    if let Some(err) = err.downcast_ref::<BusinessError>() {
        return err.to_string();
    }
    if let Some(err) = err.downcast_ref::<CoreError>() {
        return err.to_string();
    }
    err.to_string()
}

/// Turn a failed operation into a `303` with a flash.
pub fn fail(session: &Session, err: anyhow::Error, back: &str) -> Response {
    match classify(&err) {
        ErrorKind::Validation | ErrorKind::NotFound => {
            let message = user_message(&err);
            tracing::info!(error = %message, "Operation rejected");
            session.flash(message);
            Redirect::to(back).into_response()
        }
        ErrorKind::Authorization => {
            let message = user_message(&err);
            tracing::info!(error = %message, "Access denied");
            session.sign_out();
            session.flash(message);
            Redirect::to(LOGIN_PATH).into_response()
        }
        ErrorKind::Internal => {
            tracing::error!(error = %format!("{err:#}"), "Operation failed");
            session.flash(GENERIC_MESSAGE);
            Redirect::to(back).into_response()
        }
    }
}

/// Validation failure raised in the HTTP layer itself
pub fn invalid(session: &Session, message: impl Into<String>, back: &str) -> Response {
    fail(session, BusinessError::validation(message).into(), back)
}
