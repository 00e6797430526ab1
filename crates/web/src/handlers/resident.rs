//! `/resident` - requests, reports, updates, comments, votes

use super::{document_catalog, done, parse_id, render};
use crate::error;
use crate::session::Session;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    Extension, Form,
};
use barangay_business::{
    greeting_at, AuthService, BusinessError, BusinessResult, CommunityService, DirectoryService, RequestService,
    UploadStore, UploadedFile, VoteAction,
};
use barangay_core::{time, Actor, DocumentType, RequestStatus, Requirements};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

const REQUEST_PAGE: &str = "/resident/request";
const MY_REQUESTS: &str = "/resident/my-request";
const REPORTS: &str = "/resident/reports";
const UPDATES: &str = "/resident/updates";

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
        let updates = CommunityService::new(ctx).updates().await?;
        let active_staff = DirectoryService::new(ctx).active_staff().await?;
        Ok::<_, anyhow::Error>(json!({
            "greeting": greeting_at(time::now()),
            "resident": profile,
            "latest_update": updates.first(),
            "active_admins": active_staff,
        }))
    }
    .await;
    render(&session, result)
}

pub async fn request_page(Extension(session): Extension<Session>) -> Response {
    render(&session, Ok(json!({ "documents": document_catalog() })))
}

pub async fn my_requests(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let result = async {
        let filter = RequestStatus::parse_filter(query.filter.as_deref())?;
        let requests = RequestService::new(state.ctx())
            .list_for_resident(actor.id, filter)
            .await?;
        Ok::<_, anyhow::Error>(json!({
            "filter": filter.map(|status| status.as_str()).unwrap_or("Default"),
            "requests": requests,
        }))
    }
    .await;
    render(&session, result)
}

pub async fn reports(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
) -> Response {
    let result = CommunityService::new(state.ctx())
        .reports_for_resident(actor.id)
        .await
        .map(|reports| json!({ "reports": reports }));
    render(&session, result)
}

pub async fn updates(State(state): State<AppState>, Extension(session): Extension<Session>) -> Response {
    let result = CommunityService::new(state.ctx())
        .updates()
        .await
        .map(|updates| json!({ "updates": updates }));
    render(&session, result)
}

pub async fn comments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(update_id): Path<i64>,
) -> Response {
    let result = CommunityService::new(state.ctx()).update_thread(update_id).await;
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
        .map(|profile| json!({ "resident": profile }));
    render(&session, result)
}

// ============ Actions ============

/// Multipart: `document-type`, `purpose` for indigency, any number of file
/// fields otherwise (field name = requirement slot).
pub async fn request_submit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    mut multipart: Multipart,
) -> Response {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut files: Vec<UploadedFile> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return error::invalid(&session, format!("Invalid form data: {err}"), REQUEST_PAGE),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match file_name {
            Some(file_name) if !file_name.is_empty() => match field.bytes().await {
                Ok(bytes) => files.push(UploadedFile {
                    slot: name,
                    file_name,
                    bytes: bytes.to_vec(),
                }),
                Err(err) => return error::invalid(&session, format!("Invalid upload: {err}"), REQUEST_PAGE),
            },
            _ => match field.text().await {
                Ok(text) => {
                    fields.insert(name, text);
                }
                Err(err) => return error::invalid(&session, format!("Invalid form data: {err}"), REQUEST_PAGE),
            },
        }
    }

    let result = file_request(&state, actor, &fields, &files).await;

    match result {
        Ok(_) => done(&session, "Document request submitted successfully!", MY_REQUESTS),
        Err(err) => error::fail(&session, err, REQUEST_PAGE),
    }
}

async fn file_request(
    state: &AppState,
    actor: Actor,
    fields: &HashMap<String, String>,
    files: &[UploadedFile],
) -> BusinessResult<i64> {
    let ctx = state.ctx();
    let raw_type = fields.get("document-type").map(String::as_str).unwrap_or_default();
    let document_type = DocumentType::from_str(raw_type)?;
    let service = RequestService::new(ctx);

    if document_type.takes_purpose() {
        let purpose = fields.get("purpose").map(String::as_str).unwrap_or_default();
        return service
            .create_request(actor.id, document_type, Requirements::purpose(purpose))
            .await;
    }
    let uploads = UploadStore::new(ctx.upload_root());
    service
        .create_with_uploads(actor.id, document_type, &uploads, files)
        .await
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequestForm {
    pub request_id: Option<String>,
}

pub async fn delete_request(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<DeleteRequestForm>,
) -> Response {
    let Some(request_id) = parse_id(form.request_id.as_deref()) else {
        return error::invalid(&session, "Invalid request", MY_REQUESTS);
    };
    match RequestService::new(state.ctx()).delete_request(request_id, actor.id).await {
        Ok(()) => done(&session, "Request deleted successfully", MY_REQUESTS),
        Err(err) => error::fail(&session, err, MY_REQUESTS),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportForm {
    #[serde(rename = "report-title", default)]
    pub title: String,
    #[serde(rename = "report-category", default)]
    pub category: String,
    #[serde(rename = "report-description", default)]
    pub description: String,
}

pub async fn report_submit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<ReportForm>,
) -> Response {
    let result = CommunityService::new(state.ctx())
        .submit_report(actor.id, &form.title, &form.category, &form.description)
        .await;
    match result {
        Ok(_) => done(&session, "Report submitted successfully!", REPORTS),
        Err(err) => error::fail(&session, err, REPORTS),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportIdForm {
    #[serde(rename = "report-id")]
    pub report_id: Option<String>,
}

pub async fn report_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<ReportIdForm>,
) -> Response {
    let Some(report_id) = parse_id(form.report_id.as_deref()) else {
        return error::invalid(&session, "Invalid report", REPORTS);
    };
    match CommunityService::new(state.ctx()).delete_report(actor.id, report_id).await {
        Ok(()) => done(&session, "Report deleted successfully", REPORTS),
        Err(err) => error::fail(&session, err, REPORTS),
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteForm {
    pub update_id: Option<String>,
    pub vote: Option<String>,
    pub source_page: Option<String>,
}

fn back_to(source_page: Option<&str>, update_id: i64) -> String {
    match source_page {
        Some("comments") => format!("/resident/comments/{update_id}"),
        _ => UPDATES.to_string(),
    }
}

pub async fn vote_update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<VoteForm>,
) -> Response {
    let update_id = parse_id(form.update_id.as_deref());
    let action = form.vote.as_deref().and_then(VoteAction::from_str);
    let (Some(update_id), Some(action)) = (update_id, action) else {
        return error::invalid(&session, "Invalid vote parameters", UPDATES);
    };

    let back = back_to(form.source_page.as_deref(), update_id);
    match CommunityService::new(state.ctx()).vote(actor.id, update_id, action).await {
        Ok(()) => done(&session, "Vote recorded successfully", &back),
        Err(err) => error::fail(&session, err, &back),
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub submit_type: Option<String>,
    pub post_id: Option<String>,
    pub comment: Option<String>,
    pub comment_id: Option<String>,
}

pub async fn comment_update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<CommentForm>,
) -> Response {
    let Some(post_id) = parse_id(form.post_id.as_deref()) else {
        return error::invalid(&session, "Invalid comment parameters", UPDATES);
    };
    let back = format!("/resident/comments/{post_id}");
    let community = CommunityService::new(state.ctx());

    let result = match form.submit_type.as_deref() {
        Some("add_comment") => community
            .add_comment(actor.id, post_id, form.comment.as_deref().unwrap_or_default())
            .await
            .map(|_| "Comment added successfully"),
        Some("delete_comment") => match parse_id(form.comment_id.as_deref()) {
            Some(comment_id) => community
                .delete_comment(actor.id, comment_id)
                .await
                .map(|()| "Comment deleted successfully"),
            None => Err(BusinessError::validation("Invalid comment").into()),
        },
        _ => Err(BusinessError::validation("Invalid comment action").into()),
    };

    match result {
        Ok(message) => done(&session, message, &back),
        Err(err) => error::fail(&session, err, &back),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_back_link() {
        assert_eq!(back_to(Some("comments"), 7), "/resident/comments/7");
        assert_eq!(back_to(Some("updates"), 7), UPDATES);
        assert_eq!(back_to(None, 7), UPDATES);
    }
}
