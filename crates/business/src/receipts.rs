//! Receipt ledger - treasurer payment and release actions

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use anyhow::Context;
use barangay_core::{time, Actor, RequestStatus, Role};
use barangay_persistence::{
    PendingReceiptRow, PersistenceError, ReceiptRepo, ReceiptRow, RecentPaymentRow, RequestRepo,
};
use chrono::Duration;
use rust_decimal::Decimal;
use serde::Serialize;

/// Collections shown on the treasurer dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collections {
    /// Σ price of released requests
    pub collected: Decimal,
    /// Σ price of requests still `To Pay`
    pub pending: Decimal,
}

/// Receipt Service - handles payments and releases
pub struct ReceiptService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReceiptService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    fn ensure_treasurer(actor: Actor, operation: &str) -> Result<(), BusinessError> {
        if actor.is(Role::Treasurer) {
            Ok(())
        } else {
            Err(BusinessError::not_permitted(actor.role.as_str(), operation))
        }
    }

    /// Mark the request's receipt(s) paid by this treasurer.
    pub async fn mark_paid(&self, actor: Actor, request_id: i64) -> BusinessResult<()> {
        Self::ensure_treasurer(actor, "mark_paid")?;

        let updated = ReceiptRepo::mark_paid(self.ctx.pool(), request_id, actor.id, time::now())
            .await
            .context("Failed to mark receipt paid")?;
        if updated == 0 {
            tracing::warn!(request_id, "mark_paid matched no receipt");
            return Err(BusinessError::ReceiptNotFound(request_id).into());
        }

        tracing::info!(request_id, issuer = %actor, "Receipt marked paid");
        Ok(())
    }

    /// Release the document: request status and receipt issuer change together
    /// or not at all.
    pub async fn mark_released(&self, actor: Actor, request_id: i64) -> BusinessResult<()> {
        Self::ensure_treasurer(actor, "mark_released")?;

        let mut tx = self.ctx.pool().begin().await.context("Failed to begin transaction")?;

        match RequestRepo::set_status(&mut *tx, request_id, RequestStatus::Released).await {
            Ok(()) => {}
            Err(PersistenceError::NotFound { .. }) => {
                tx.rollback().await.context("Failed to roll back release")?;
                return Err(BusinessError::RequestNotFound(request_id).into());
            }
            Err(err) => return Err(anyhow::Error::new(err).context("Failed to release request")),
        }

        let updated = ReceiptRepo::set_issuer(&mut *tx, request_id, actor.id)
            .await
            .context("Failed to record issuer")?;
        if updated == 0 {
            tx.rollback().await.context("Failed to roll back release")?;
            return Err(BusinessError::ReceiptNotFound(request_id).into());
        }

        tx.commit().await.context("Failed to commit release")?;
        tracing::info!(request_id, issuer = %actor, "Document released");
        Ok(())
    }

    /// Receipts whose request is To Pay, To Pick Up or Released
    pub async fn pending_receipts(&self) -> BusinessResult<Vec<PendingReceiptRow>> {
        let rows = ReceiptRepo::pending(self.ctx.pool())
            .await
            .context("Failed to load receipts")?;
        Ok(rows)
    }

    /// Payments within the last `hours`, newest first
    pub async fn recent_payments(&self, hours: i64) -> BusinessResult<Vec<RecentPaymentRow>> {
        let since = time::now() - Duration::hours(hours);
        let rows = ReceiptRepo::recent_payments(self.ctx.pool(), since)
            .await
            .context("Failed to load recent payments")?;
        Ok(rows)
    }

    pub async fn collections(&self) -> BusinessResult<Collections> {
        let pool = self.ctx.pool();
        let collected = RequestRepo::sum_price_by_status(pool, RequestStatus::Released)
            .await
            .context("Failed to sum released requests")?;
        let pending = RequestRepo::sum_price_by_status(pool, RequestStatus::ToPay)
            .await
            .context("Failed to sum unpaid requests")?;
        Ok(Collections { collected, pending })
    }

    pub async fn receipts_for_request(&self, request_id: i64) -> BusinessResult<Vec<ReceiptRow>> {
        let rows = ReceiptRepo::list_for_request(self.ctx.pool(), request_id)
            .await
            .context("Failed to load receipts")?;
        Ok(rows)
    }
}
