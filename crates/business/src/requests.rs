//! Request store - document requests and the status state machine
//!
//! Every status change records `reviewed_by`/`reviewed_at` and writes a
//! receipt row chosen by a [`ReceiptPolicy`], inside one transaction.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use crate::uploads::{UploadStore, UploadedFile};
use anyhow::Context;
use barangay_core::{time, Actor, DocumentType, RequestStatus, Requirements, Role};
use barangay_persistence::{
    NewReceipt, NewRequest, PersistenceError, ReceiptRepo, ReleaseOverviewRow, RequestRepo,
    RequestWithResidentRow, ResidentRepo, ResidentRequestRow,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Decides which receipt row (if any) a status change writes.
pub trait ReceiptPolicy: Send + Sync {
    fn receipt_for(&self, new_status: RequestStatus, now: DateTime<Utc>) -> Option<NewReceipt>;
}

/// One receipt per status change: paid on hand-off (`To Pick Up`), unpaid
/// otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct EveryTransition;

impl ReceiptPolicy for EveryTransition {
    fn receipt_for(&self, new_status: RequestStatus, now: DateTime<Utc>) -> Option<NewReceipt> {
        match new_status {
            RequestStatus::ToPickUp => Some(NewReceipt::paid(now)),
            _ => Some(NewReceipt::unpaid()),
        }
    }
}

/// Only the hand-off writes a receipt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentTransitionsOnly;

impl ReceiptPolicy for PaymentTransitionsOnly {
    fn receipt_for(&self, new_status: RequestStatus, now: DateTime<Utc>) -> Option<NewReceipt> {
        (new_status == RequestStatus::ToPickUp).then(|| NewReceipt::paid(now))
    }
}

/// Result of a status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub request_id: i64,
    pub status: RequestStatus,
    pub receipt_id: Option<i64>,
}

/// Request Service - resident submissions and secretary review
pub struct RequestService<'a, P: ReceiptPolicy = EveryTransition> {
    ctx: &'a ServiceContext,
    policy: P,
}

impl<'a> RequestService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self {
            ctx,
            policy: EveryTransition,
        }
    }
}

impl<'a, P: ReceiptPolicy> RequestService<'a, P> {
    pub fn with_policy(ctx: &'a ServiceContext, policy: P) -> Self {
        Self { ctx, policy }
    }

    /// File a request. Price comes from the document table, status starts
    /// at `To Pay`.
    pub async fn create_request(
        &self,
        resident_id: i64,
        document_type: DocumentType,
        requirements: Requirements,
    ) -> BusinessResult<i64> {
        if let Err(err) = ResidentRepo::get_by_id(self.ctx.pool(), resident_id).await {
            return Err(match err {
                PersistenceError::NotFound { .. } => BusinessError::ResidentNotFound(resident_id).into(),
                other => anyhow::Error::new(other).context("Failed to load resident"),
            });
        }

        let request = NewRequest {
            resident_id,
            document_type,
            price: document_type.price(),
            requirements,
            status: RequestStatus::initial(),
            created_at: time::now(),
        };
        let id = RequestRepo::insert(self.ctx.pool(), &request)
            .await
            .context("Failed to insert request")?;

        tracing::info!(
            request_id = id,
            resident_id,
            document_type = document_type.as_str(),
            price = %request.price,
            "Document request created"
        );
        Ok(id)
    }

    /// Store the requirement files under the resident's upload directory,
    /// then file the request. Files already written are removed again when
    /// the request is not created.
    pub async fn create_with_uploads(
        &self,
        resident_id: i64,
        document_type: DocumentType,
        uploads: &UploadStore,
        files: &[UploadedFile],
    ) -> BusinessResult<i64> {
        let mut slots = BTreeMap::new();
        for file in files {
            match uploads.save(resident_id, &file.file_name, &file.bytes).await {
                Ok(Some(path)) => {
                    slots.insert(file.slot.clone(), path);
                }
                Ok(None) => {}
                Err(err) => {
                    uploads.discard(slots.values()).await;
                    return Err(err);
                }
            }
        }

        let stored: Vec<String> = slots.values().cloned().collect();
        let created = self
            .create_request(resident_id, document_type, Requirements::files(slots))
            .await;
        if created.is_err() {
            uploads.discard(&stored).await;
        }
        created
    }

    /// Secretary sets any status on an existing request.
    pub async fn set_status(
        &self,
        actor: Actor,
        request_id: i64,
        new_status: RequestStatus,
    ) -> BusinessResult<StatusChange> {
        if !actor.is(Role::Secretary) {
            return Err(BusinessError::not_permitted(actor.role.as_str(), "set_status").into());
        }

        let now = time::now();
        let mut tx = self.ctx.pool().begin().await.context("Failed to begin transaction")?;

        match RequestRepo::update_review(&mut *tx, request_id, new_status, actor.id, now).await {
            Ok(()) => {}
            Err(PersistenceError::NotFound { .. }) => {
                return Err(BusinessError::RequestNotFound(request_id).into())
            }
            Err(err) => return Err(anyhow::Error::new(err).context("Failed to update request status")),
        }

        let receipt_id = match self.policy.receipt_for(new_status, now) {
            Some(receipt) => Some(
                ReceiptRepo::insert(&mut *tx, request_id, &receipt)
                    .await
                    .context("Failed to insert receipt")?,
            ),
            None => None,
        };

        tx.commit().await.context("Failed to commit status change")?;

        tracing::info!(
            request_id,
            status = new_status.as_str(),
            reviewer = %actor,
            receipt_id,
            "Request status updated"
        );
        Ok(StatusChange {
            request_id,
            status: new_status,
            receipt_id,
        })
    }

    /// Delete a resident's own request; receipts cascade.
    pub async fn delete_request(&self, request_id: i64, resident_id: i64) -> BusinessResult<()> {
        RequestRepo::delete_owned(self.ctx.pool(), request_id, resident_id)
            .await
            .map_err(|err| match err {
                PersistenceError::NotFound { .. } => BusinessError::RequestNotFound(request_id),
                other => BusinessError::Persistence(other),
            })?;
        tracing::info!(request_id, resident_id, "Request deleted");
        Ok(())
    }

    pub async fn list_for_resident(
        &self,
        resident_id: i64,
        filter: Option<RequestStatus>,
    ) -> BusinessResult<Vec<ResidentRequestRow>> {
        let rows = RequestRepo::list_for_resident(self.ctx.pool(), resident_id, filter)
            .await
            .context("Failed to list resident requests")?;
        Ok(rows)
    }

    pub async fn list_all(
        &self,
        filter: Option<RequestStatus>,
    ) -> BusinessResult<Vec<RequestWithResidentRow>> {
        let rows = RequestRepo::list_all(self.ctx.pool(), filter)
            .await
            .context("Failed to list requests")?;
        Ok(rows)
    }

    pub async fn release_overview(&self) -> BusinessResult<Vec<ReleaseOverviewRow>> {
        let rows = RequestRepo::release_overview(self.ctx.pool())
            .await
            .context("Failed to load release overview")?;
        Ok(rows)
    }
}
