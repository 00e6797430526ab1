//! `/secretary` - request review, residents and sanctions, reports, updates

use super::{done, parse_id, render};
use crate::error;
use crate::session::Session;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::Response,
    Extension, Form,
};
use barangay_business::{
    AuthService, CommunityService, DirectoryService, RequestService, ResidentFilter, SanctionService,
};
use barangay_core::{time, Actor, RequestStatus};
use serde::Deserialize;
use serde_json::json;

const REQUESTS: &str = "/secretary/requests";
const RESIDENTS: &str = "/secretary/residents";
const REPORTS: &str = "/secretary/reports";
const UPDATES: &str = "/secretary/updates";

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub filter: Option<String>,
}

// ============ Pages ============

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
) -> Response {
    let ctx = state.ctx();
    let result = async {
        let profile = AuthService::new(ctx).current_profile(actor).await?;
        let residents = DirectoryService::new(ctx).residents(ResidentFilter::All).await?;
        let requests = RequestService::new(ctx).list_all(None).await?;
        Ok::<_, anyhow::Error>(json!({
            "secretary": profile,
            "residents": residents,
            "requests": requests,
        }))
    }
    .await;
    render(&session, result)
}

pub async fn requests(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let result = async {
        let filter = RequestStatus::parse_filter(query.filter.as_deref())?;
        let requests = RequestService::new(state.ctx()).list_all(filter).await?;
        Ok::<_, anyhow::Error>(json!({
            "filter": filter.map(|status| status.as_str()).unwrap_or("Default"),
            "requests": requests,
        }))
    }
    .await;
    render(&session, result)
}

pub async fn residents(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let ctx = state.ctx();
    let result = async {
        let residents = DirectoryService::new(ctx)
            .residents(ResidentFilter::parse(query.filter.as_deref()))
            .await?;
        let sanctions = SanctionService::new(ctx).list_sanctions().await?;
        Ok::<_, anyhow::Error>(json!({
            "filter": query.filter.as_deref().unwrap_or("Default"),
            "residents": residents,
            "sanctions": sanctions,
        }))
    }
    .await;
    render(&session, result)
}

pub async fn reports(State(state): State<AppState>, Extension(session): Extension<Session>) -> Response {
    let result = CommunityService::new(state.ctx())
        .all_reports()
        .await
        .map(|reports| json!({ "reports": reports }));
    render(&session, result)
}

pub async fn updates(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
) -> Response {
    let result = CommunityService::new(state.ctx())
        .updates_by(actor.id)
        .await
        .map(|updates| json!({ "updates": updates }));
    render(&session, result)
}

pub async fn account(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
) -> Response {
    let result = AuthService::new(state.ctx())
        .current_profile(actor)
        .await
        .map(|profile| json!({ "secretary": profile }));
    render(&session, result)
}

// ============ Actions ============

#[derive(Debug, Deserialize)]
pub struct UpdateRequestForm {
    pub id: Option<String>,
    pub status: Option<String>,
    pub filter: Option<String>,
}

/// Listing URL keeping the page's status filter
fn requests_url(filter: Option<&str>) -> String {
    match RequestStatus::parse_filter(filter) {
        Ok(Some(status)) => format!("{REQUESTS}?filter={}", status.as_str().replace(' ', "+")),
        _ => REQUESTS.to_string(),
    }
}

pub async fn update_request(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<UpdateRequestForm>,
) -> Response {
    let back = requests_url(form.filter.as_deref());
    let (Some(request_id), Some(raw_status)) = (parse_id(form.id.as_deref()), form.status.as_deref()) else {
        return error::invalid(&session, "Invalid request parameters", &back);
    };
    let status = match RequestStatus::from_str(raw_status) {
        Ok(status) => status,
        Err(err) => return error::fail(&session, err.into(), &back),
    };

    match RequestService::new(state.ctx()).set_status(actor, request_id, status).await {
        Ok(_) => done(&session, "Request status updated successfully", &back),
        Err(err) => error::fail(&session, err, &back),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

pub async fn add_update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<UpdateForm>,
) -> Response {
    match CommunityService::new(state.ctx()).add_update(actor, &form.title, &form.content).await {
        Ok(_) => done(&session, "Update posted successfully", UPDATES),
        Err(err) => error::fail(&session, err, UPDATES),
    }
}

#[derive(Debug, Deserialize)]
pub struct SanctionForm {
    pub resident_id: Option<String>,
    /// `datetime-local` value; blank means now
    pub issued_at: Option<String>,
    pub expires_at: Option<String>,
    #[serde(default)]
    pub reason: String,
}

pub async fn add_sanction(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<SanctionForm>,
) -> Response {
    let resident_id = parse_id(form.resident_id.as_deref());
    let expires_raw = form.expires_at.as_deref().map(str::trim).filter(|raw| !raw.is_empty());
    let (Some(resident_id), Some(expires_raw)) = (resident_id, expires_raw) else {
        return error::invalid(&session, "All sanction fields are required", RESIDENTS);
    };

    let issued_at = match form.issued_at.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => time::parse_form_datetime(raw),
        None => Ok(time::now()),
    };
    let window = issued_at.and_then(|issued| Ok((issued, time::parse_form_datetime(expires_raw)?)));
    let (issued_at, expires_at) = match window {
        Ok(window) => window,
        Err(err) => return error::fail(&session, err.into(), RESIDENTS),
    };

    let result = SanctionService::new(state.ctx())
        .apply_sanction(actor, resident_id, issued_at, expires_at, &form.reason)
        .await;
    match result {
        Ok(_) => done(&session, "Sanction added successfully", RESIDENTS),
        Err(err) => error::fail(&session, err, RESIDENTS),
    }
}

#[derive(Debug, Deserialize)]
pub struct ResidentIdForm {
    pub resident_id: Option<String>,
}

pub async fn remove_sanction(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<ResidentIdForm>,
) -> Response {
    let Some(resident_id) = parse_id(form.resident_id.as_deref()) else {
        return error::invalid(&session, "Invalid resident ID", RESIDENTS);
    };
    match SanctionService::new(state.ctx()).remove_sanction(actor, resident_id).await {
        Ok(_) => done(&session, "Sanction removed successfully", RESIDENTS),
        Err(err) => error::fail(&session, err, RESIDENTS),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportIdForm {
    #[serde(rename = "report-id")]
    pub report_id: Option<String>,
}

pub async fn resolve_report(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<ReportIdForm>,
) -> Response {
    let Some(report_id) = parse_id(form.report_id.as_deref()) else {
        return error::invalid(&session, "Invalid report ID", REPORTS);
    };
    match CommunityService::new(state.ctx()).resolve_report(actor, report_id).await {
        Ok(()) => done(&session, "Report resolved successfully", REPORTS),
        Err(err) => error::fail(&session, err, REPORTS),
    }
}
