//! Eligibility gate: một resident có sanction còn hiệu lực thì không được
//! login và không được dùng các route của resident.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use anyhow::Context;
use barangay_core::time;
use barangay_persistence::{SanctionRepo, SanctionRow};

pub struct EligibilityGate<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> EligibilityGate<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Most recently issued sanction that has not expired yet
    pub async fn active_sanction(&self, resident_id: i64) -> BusinessResult<Option<SanctionRow>> {
        let sanction = SanctionRepo::latest_active(self.ctx.pool(), resident_id, time::now())
            .await
            .context("Failed to check sanctions")?;
        Ok(sanction)
    }

    pub async fn is_blocked(&self, resident_id: i64) -> BusinessResult<bool> {
        Ok(self.active_sanction(resident_id).await?.is_some())
    }

    /// Err([`BusinessError::Sanctioned`]) while a sanction is active
    pub async fn ensure_eligible(&self, resident_id: i64) -> BusinessResult<()> {
        match self.active_sanction(resident_id).await? {
            Some(sanction) => {
                tracing::info!(resident_id, sanction_id = sanction.id, "Resident is sanctioned");
                Err(BusinessError::Sanctioned {
                    reason: sanction.reason,
                    expires_at: sanction.expires_at,
                }
                .into())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;
    use barangay_core::Role;
    use barangay_persistence::NewSanction;
    use chrono::Duration;

    async fn sanction(ctx: &ServiceContext, resident_id: i64, issued_by: i64, expires_in: Duration, reason: &str) {
        let now = time::now();
        SanctionRepo::insert(
            ctx.pool(),
            &NewSanction {
                resident_id,
                issued_by,
                issued_at: now - Duration::hours(2),
                expires_at: now + expires_in,
                reason: reason.to_string(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_blocked_only_while_unexpired() {
        let ctx = testing::context().await;
        let resident_id = testing::resident(&ctx, "juan@example.com").await;
        let secretary_id = testing::staff(&ctx, Role::Secretary, "sec").await;
        let gate = EligibilityGate::new(&ctx);

        assert!(!gate.is_blocked(resident_id).await.unwrap());

        sanction(&ctx, resident_id, secretary_id, -Duration::hours(1), "Old").await;
        assert!(!gate.is_blocked(resident_id).await.unwrap());

        sanction(&ctx, resident_id, secretary_id, Duration::hours(1), "Littering").await;
        assert!(gate.is_blocked(resident_id).await.unwrap());

        let err = gate.ensure_eligible(resident_id).await.unwrap_err();
        match err.downcast_ref::<BusinessError>() {
            Some(BusinessError::Sanctioned { reason, .. }) => assert_eq!(reason, "Littering"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
