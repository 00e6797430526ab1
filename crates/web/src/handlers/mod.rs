//! HTTP handlers, grouped by path prefix

pub mod auth;
pub mod pages;
pub mod resident;
pub mod secretary;
pub mod treasurer;

use crate::error;
use crate::session::Session;
use axum::{
    response::{IntoResponse, Redirect, Response},
    Json,
};
use barangay_core::DocumentType;
use serde::Serialize;
use serde_json::{json, Value};

/// JSON view model for GET pages
#[derive(Serialize)]
pub struct Page<T> {
    pub flashes: Vec<String>,
    pub data: T,
}

pub fn page<T: Serialize>(session: &Session, data: T) -> Response {
    Json(Page {
        flashes: session.take_flashes(),
        data,
    })
    .into_response()
}

/// Render a page, or go back to the landing page with a flash
pub fn render<T: Serialize>(session: &Session, result: anyhow::Result<T>) -> Response {
    match result {
        Ok(data) => page(session, data),
        Err(err) => error::fail(session, err, "/"),
    }
}

/// Successful action: flash and `303`
pub fn done(session: &Session, message: impl Into<String>, to: &str) -> Response {
    session.flash(message);
    Redirect::to(to).into_response()
}

/// Price table shown on the landing and request pages
pub fn document_catalog() -> Vec<Value> {
    DocumentType::ALL
        .iter()
        .map(|doc| {
            json!({
                "document_type": doc.as_str(),
                "label": doc.label(),
                "price": doc.price(),
                "takes_purpose": doc.takes_purpose(),
            })
        })
        .collect()
}

/// Form ids arrive as strings; blanks and garbage are rejected the same way.
pub fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse().ok())
}
