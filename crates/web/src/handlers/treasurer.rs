//! `/treasurer` - collections, receipts, financial reports

use super::{done, parse_id, render};
use crate::error;
use crate::session::Session;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Form,
};
use barangay_business::{
    AuthService, BusinessError, DirectoryService, FinanceService, ReceiptService, RequestService,
    ResidentFilter,
};
use barangay_core::{time, Actor, ReportType};
use barangay_reports::{ExportFormat, FinancialReportData};
use serde::Deserialize;
use serde_json::json;

const DASHBOARD: &str = "/treasurer/dashboard";
const RECEIPTS: &str = "/treasurer/receipts";

/// Hours of payments shown on the dashboard
const RECENT_PAYMENT_HOURS: i64 = 8;

// ============ Pages ============

pub async fn dashboard(State(state): State<AppState>, Extension(session): Extension<Session>) -> Response {
    let ctx = state.ctx();
    let result = async {
        let receipts = ReceiptService::new(ctx);
        let collections = receipts.collections().await?;
        let recent_payments = receipts.recent_payments(RECENT_PAYMENT_HOURS).await?;
        let active_residents = DirectoryService::new(ctx).residents(ResidentFilter::Online).await?;
        let released = RequestService::new(ctx).release_overview().await?;
        Ok::<_, anyhow::Error>(json!({
            "collections": collections,
            "recent_payments": recent_payments,
            "active_residents": active_residents,
            "release_overview": released,
        }))
    }
    .await;
    render(&session, result)
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub report_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub format: Option<String>,
}

/// JSON view by default; `format=csv|json|markdown` downloads the report.
pub async fn financial_reports(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let report_type = ReportType::parse(query.report_type.as_deref().unwrap_or("monthly"));
    let format = match query.format.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => match ExportFormat::parse(raw) {
            Some(format) => Some(format),
            None => {
                let err = BusinessError::validation(format!("Unsupported export format: {raw}"));
                return error::fail(&session, err.into(), DASHBOARD);
            }
        },
        None => None,
    };

    let report = FinanceService::new(state.ctx())
        .report(report_type, query.start_date.as_deref(), query.end_date.as_deref())
        .await;
    let report = match report {
        Ok(report) => report,
        Err(err) => return error::fail(&session, err, DASHBOARD),
    };

    let Some(format) = format else {
        return render(&session, Ok(report));
    };

    let data = FinancialReportData::new(report).generated_at(time::now());
    let exporter = format.exporter();
    let body = exporter.export(&data);
    let disposition = format!("attachment; filename=\"{}\"", data.file_name(exporter.extension()));

    tracing::info!(report_type = report_type.as_str(), format = exporter.extension(), "Financial report exported");

    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(exporter.mime_type()));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

pub async fn receipts(State(state): State<AppState>, Extension(session): Extension<Session>) -> Response {
    let result = ReceiptService::new(state.ctx())
        .pending_receipts()
        .await
        .map(|receipts| json!({ "receipts": receipts }));
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
        .map(|profile| json!({ "treasurer": profile }));
    render(&session, result)
}

// ============ Actions ============

#[derive(Debug, Deserialize)]
pub struct RequestIdForm {
    pub request_id: Option<String>,
}

pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<RequestIdForm>,
) -> Response {
    let Some(request_id) = parse_id(form.request_id.as_deref()) else {
        return error::invalid(&session, "Invalid request ID", RECEIPTS);
    };
    match ReceiptService::new(state.ctx()).mark_paid(actor, request_id).await {
        Ok(()) => done(&session, "Payment marked as paid successfully", RECEIPTS),
        Err(err) => error::fail(&session, err, RECEIPTS),
    }
}

pub async fn mark_released(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<RequestIdForm>,
) -> Response {
    let Some(request_id) = parse_id(form.request_id.as_deref()) else {
        return error::invalid(&session, "Invalid request ID", RECEIPTS);
    };
    match ReceiptService::new(state.ctx()).mark_released(actor, request_id).await {
        Ok(()) => done(&session, "Document marked as released successfully", RECEIPTS),
        Err(err) => error::fail(&session, err, RECEIPTS),
    }
}
