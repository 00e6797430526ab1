//! Community records - reports, updates, comments, votes

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use anyhow::Context;
use barangay_core::{text, time, Actor, Role};
use barangay_persistence::{
    CommentListingRow, CommentRepo, PersistenceError, ReportListingRow, ReportRepo, UpdateListingRow,
    UpdateRepo, VoteDirection, VoteRepo,
};
use serde::Serialize;

/// Vote actions posted by the updates page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    AddUp,
    RemoveUp,
    AddDown,
    RemoveDown,
}

impl VoteAction {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "add_up_vote" => Some(VoteAction::AddUp),
            "remove_up_vote" => Some(VoteAction::RemoveUp),
            "add_down_vote" => Some(VoteAction::AddDown),
            "remove_down_vote" => Some(VoteAction::RemoveDown),
            _ => None,
        }
    }
}

/// An update together with its comments
#[derive(Debug, Clone, Serialize)]
pub struct UpdateThread {
    pub update: UpdateListingRow,
    pub comments: Vec<CommentListingRow>,
}

fn not_found_as(err: PersistenceError, mapped: BusinessError) -> anyhow::Error {
    match err {
        PersistenceError::NotFound { .. } => mapped.into(),
        other => anyhow::Error::new(other),
    }
}

pub struct CommunityService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CommunityService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    // === Reports ===

    pub async fn submit_report(
        &self,
        resident_id: i64,
        title: &str,
        category: &str,
        content: &str,
    ) -> BusinessResult<i64> {
        let (title, category, content) = (title.trim(), category.trim(), content.trim());
        if title.is_empty() || category.is_empty() || content.is_empty() {
            return Err(BusinessError::validation("Title, category and description are required").into());
        }
        let id = ReportRepo::insert(self.ctx.pool(), resident_id, title, content, category, time::now())
            .await
            .context("Failed to insert report")?;
        tracing::info!(report_id = id, resident_id, "Community report submitted");
        Ok(id)
    }

    /// Residents may only delete their own reports
    pub async fn delete_report(&self, resident_id: i64, report_id: i64) -> BusinessResult<()> {
        ReportRepo::delete_owned(self.ctx.pool(), report_id, resident_id)
            .await
            .map_err(|err| not_found_as(err, BusinessError::ReportNotFound(report_id)))?;
        Ok(())
    }

    pub async fn resolve_report(&self, actor: Actor, report_id: i64) -> BusinessResult<()> {
        if !actor.is(Role::Secretary) {
            return Err(BusinessError::not_permitted(actor.role.as_str(), "resolve_report").into());
        }
        ReportRepo::resolve(self.ctx.pool(), report_id, actor.id)
            .await
            .map_err(|err| not_found_as(err, BusinessError::ReportNotFound(report_id)))?;
        tracing::info!(report_id, by = %actor, "Community report resolved");
        Ok(())
    }

    pub async fn reports_for_resident(&self, resident_id: i64) -> BusinessResult<Vec<ReportListingRow>> {
        let rows = ReportRepo::list_for_resident(self.ctx.pool(), resident_id)
            .await
            .context("Failed to list reports")?;
        Ok(rows)
    }

    pub async fn all_reports(&self) -> BusinessResult<Vec<ReportListingRow>> {
        let rows = ReportRepo::list_all(self.ctx.pool())
            .await
            .context("Failed to list reports")?;
        Ok(rows)
    }

    // === Updates ===

    /// Secretary posts an update; title is title-cased, content capitalized
    pub async fn add_update(&self, actor: Actor, title: &str, content: &str) -> BusinessResult<i64> {
        if !actor.is(Role::Secretary) {
            return Err(BusinessError::not_permitted(actor.role.as_str(), "add_update").into());
        }
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(BusinessError::validation("Title and content are required").into());
        }
        let id = UpdateRepo::insert(
            self.ctx.pool(),
            &text::title_case(title),
            &text::capitalize(content.trim()),
            actor.id,
            time::now(),
        )
        .await
        .context("Failed to insert update")?;
        tracing::info!(update_id = id, by = %actor, "Community update posted");
        Ok(id)
    }

    pub async fn updates(&self) -> BusinessResult<Vec<UpdateListingRow>> {
        let rows = UpdateRepo::list(self.ctx.pool())
            .await
            .context("Failed to list updates")?;
        Ok(rows)
    }

    pub async fn updates_by(&self, secretary_id: i64) -> BusinessResult<Vec<UpdateListingRow>> {
        let rows = UpdateRepo::list_by_author(self.ctx.pool(), secretary_id)
            .await
            .context("Failed to list updates")?;
        Ok(rows)
    }

    pub async fn update_thread(&self, update_id: i64) -> BusinessResult<UpdateThread> {
        let update = UpdateRepo::get_listing(self.ctx.pool(), update_id)
            .await
            .map_err(|err| not_found_as(err, BusinessError::UpdateNotFound(update_id)))?;
        let comments = CommentRepo::list_for_update(self.ctx.pool(), update_id)
            .await
            .context("Failed to list comments")?;
        Ok(UpdateThread { update, comments })
    }

    // === Comments ===

    pub async fn add_comment(&self, resident_id: i64, update_id: i64, content: &str) -> BusinessResult<i64> {
        let content = content.trim();
        if content.is_empty() {
            return Err(BusinessError::validation("Comment cannot be empty").into());
        }
        UpdateRepo::get_listing(self.ctx.pool(), update_id)
            .await
            .map_err(|err| not_found_as(err, BusinessError::UpdateNotFound(update_id)))?;
        let id = CommentRepo::insert(self.ctx.pool(), update_id, resident_id, content, time::now())
            .await
            .context("Failed to insert comment")?;
        Ok(id)
    }

    /// Residents may only delete their own comments
    pub async fn delete_comment(&self, resident_id: i64, comment_id: i64) -> BusinessResult<()> {
        CommentRepo::delete_owned(self.ctx.pool(), comment_id, resident_id)
            .await
            .map_err(|err| not_found_as(err, BusinessError::CommentNotFound(comment_id)))?;
        Ok(())
    }

    // === Votes ===

    /// Apply a vote action. Adding one direction replaces the opposite vote.
    pub async fn vote(&self, resident_id: i64, update_id: i64, action: VoteAction) -> BusinessResult<()> {
        UpdateRepo::get_listing(self.ctx.pool(), update_id)
            .await
            .map_err(|err| not_found_as(err, BusinessError::UpdateNotFound(update_id)))?;

        let pool = self.ctx.pool();
        let result = match action {
            VoteAction::AddUp => VoteRepo::cast(pool, update_id, resident_id, VoteDirection::Up).await,
            VoteAction::AddDown => VoteRepo::cast(pool, update_id, resident_id, VoteDirection::Down).await,
            VoteAction::RemoveUp => VoteRepo::retract(pool, update_id, resident_id, VoteDirection::Up)
                .await
                .map(|_| ()),
            VoteAction::RemoveDown => VoteRepo::retract(pool, update_id, resident_id, VoteDirection::Down)
                .await
                .map(|_| ()),
        };
        result.context("Failed to record vote")?;
        tracing::debug!(update_id, resident_id, ?action, "Vote recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;

    #[tokio::test]
    async fn test_reports_lifecycle() {
        let ctx = testing::context().await;
        let owner = testing::resident(&ctx, "juan@example.com").await;
        let other = testing::resident(&ctx, "maria@example.com").await;
        let secretary = Actor::secretary(testing::staff(&ctx, Role::Secretary, "sec").await);
        let service = CommunityService::new(&ctx);

        let id = service
            .submit_report(owner, "Broken streetlight", "Infrastructure", "Near the chapel")
            .await
            .unwrap();
        assert!(service.submit_report(owner, "", "x", "y").await.is_err());

        let err = service.delete_report(other, id).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<BusinessError>(), Some(BusinessError::ReportNotFound(_))));

        service.resolve_report(secretary, id).await.unwrap();
        let all = service.all_reports().await.unwrap();
        assert_eq!(all[0].report.status, "Resolved");
        assert_eq!(all[0].resident_name.as_deref(), Some("Juan Dela Cruz"));

        service.delete_report(owner, id).await.unwrap();
        assert!(service.reports_for_resident(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_updates_comments_votes() {
        let ctx = testing::context().await;
        let resident_id = testing::resident(&ctx, "juan@example.com").await;
        let other = testing::resident(&ctx, "maria@example.com").await;
        let secretary = Actor::secretary(testing::staff(&ctx, Role::Secretary, "sec").await);
        let service = CommunityService::new(&ctx);

        let err = service
            .add_update(Actor::resident(resident_id), "t", "c")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BusinessError>(),
            Some(BusinessError::OperationNotPermitted { .. })
        ));

        let update_id = service
            .add_update(secretary, "clean-up drive", "BRING gloves")
            .await
            .unwrap();

        let err = service.add_comment(resident_id, update_id, "  ").await.unwrap_err();
        assert_eq!(err.to_string(), "Comment cannot be empty");
        let comment_id = service.add_comment(resident_id, update_id, "See you").await.unwrap();
        assert!(service.delete_comment(other, comment_id).await.is_err());

        service.vote(resident_id, update_id, VoteAction::AddUp).await.unwrap();
        service.vote(other, update_id, VoteAction::AddUp).await.unwrap();
        service.vote(other, update_id, VoteAction::AddDown).await.unwrap();

        let thread = service.update_thread(update_id).await.unwrap();
        assert_eq!(thread.update.update.title, "Clean-Up Drive");
        assert_eq!(thread.update.update.content, "Bring gloves");
        assert_eq!(thread.update.comment_count, 1);
        assert_eq!((thread.update.up_votes, thread.update.down_votes), (1, 1));
        assert_eq!(thread.comments.len(), 1);

        service.vote(other, update_id, VoteAction::RemoveDown).await.unwrap();
        service.delete_comment(resident_id, comment_id).await.unwrap();
        let listing = &service.updates().await.unwrap()[0];
        assert_eq!((listing.up_votes, listing.down_votes, listing.comment_count), (1, 0, 0));
        assert_eq!(service.updates_by(secretary.id).await.unwrap().len(), 1);

        let err = service.vote(resident_id, 404, VoteAction::AddUp).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<BusinessError>(), Some(BusinessError::UpdateNotFound(404))));
    }

    #[test]
    fn test_vote_action_codes() {
        assert_eq!(VoteAction::from_str("add_down_vote"), Some(VoteAction::AddDown));
        assert_eq!(VoteAction::from_str("upvote"), None);
    }
}
