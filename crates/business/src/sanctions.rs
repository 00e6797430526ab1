//! Sanction registry
//!
//! A resident is blocked while any of their sanctions has `expires_at > now`.
//! Applying a sanction forces the resident offline, removing all of them
//! forces the resident online. The periodic sweep only deletes expired rows
//! and leaves `is_active` alone.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use anyhow::Context;
use barangay_core::{text, time, Actor, Role};
use barangay_persistence::{AccountRepo, NewSanction, PersistenceError, ResidentRepo, SanctionRepo, SanctionRow};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Sanction Service - secretary actions on the registry
pub struct SanctionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SanctionService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    fn ensure_secretary(actor: Actor, operation: &str) -> Result<(), BusinessError> {
        if actor.is(Role::Secretary) {
            Ok(())
        } else {
            Err(BusinessError::not_permitted(actor.role.as_str(), operation))
        }
    }

    /// Insert a sanction and mark the resident inactive in one transaction.
    pub async fn apply_sanction(
        &self,
        actor: Actor,
        resident_id: i64,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        reason: &str,
    ) -> BusinessResult<i64> {
        Self::ensure_secretary(actor, "apply_sanction")?;

        let reason = text::capitalize(reason.trim());
        if reason.is_empty() {
            return Err(BusinessError::validation("A sanction reason is required").into());
        }
        let (issued_at, expires_at) = (time::truncate(issued_at), time::truncate(expires_at));
        if expires_at <= issued_at {
            return Err(BusinessError::validation("Sanction must expire after it is issued").into());
        }

        if let Err(err) = ResidentRepo::get_by_id(self.ctx.pool(), resident_id).await {
            return Err(match err {
                PersistenceError::NotFound { .. } => BusinessError::ResidentNotFound(resident_id).into(),
                other => anyhow::Error::new(other).context("Failed to load resident"),
            });
        }

        // First statement is a write, so the transaction takes the write lock
        // up front and waits on busy instead of failing a lock upgrade.
        let mut tx = self.ctx.pool().begin().await.context("Failed to begin transaction")?;

        let sanction = NewSanction {
            resident_id,
            issued_by: actor.id,
            issued_at,
            expires_at,
            reason,
        };
        let id = SanctionRepo::insert(&mut *tx, &sanction)
            .await
            .context("Failed to insert sanction")?;
        AccountRepo::set_active(&mut *tx, Role::Resident, resident_id, false)
            .await
            .context("Failed to deactivate resident")?;

        tx.commit().await.context("Failed to commit sanction")?;

        tracing::info!(
            sanction_id = id,
            resident_id,
            issued_by = %actor,
            expires_at = %expires_at,
            "Sanction applied"
        );
        Ok(id)
    }

    /// Delete every sanction of the resident and mark them active again.
    /// Returns the number of sanctions removed.
    pub async fn remove_sanction(&self, actor: Actor, resident_id: i64) -> BusinessResult<u64> {
        Self::ensure_secretary(actor, "remove_sanction")?;

        let mut tx = self.ctx.pool().begin().await.context("Failed to begin transaction")?;

        let removed = SanctionRepo::delete_for_resident(&mut *tx, resident_id)
            .await
            .context("Failed to delete sanctions")?;
        match AccountRepo::set_active(&mut *tx, Role::Resident, resident_id, true).await {
            Ok(()) => {}
            Err(PersistenceError::NotFound { .. }) => {
                tx.rollback().await.context("Failed to roll back sanction removal")?;
                return Err(BusinessError::ResidentNotFound(resident_id).into());
            }
            Err(err) => return Err(anyhow::Error::new(err).context("Failed to reactivate resident")),
        }

        tx.commit().await.context("Failed to commit sanction removal")?;

        tracing::info!(resident_id, removed, by = %actor, "Sanctions removed");
        Ok(removed)
    }

    /// Delete sanctions that expired before now
    pub async fn expire_sanctions(&self) -> BusinessResult<u64> {
        let deleted = SanctionRepo::delete_expired(self.ctx.pool(), time::now())
            .await
            .context("Failed to delete expired sanctions")?;
        Ok(deleted)
    }

    pub async fn list_sanctions(&self) -> BusinessResult<Vec<SanctionRow>> {
        let rows = SanctionRepo::list_all(self.ctx.pool())
            .await
            .context("Failed to list sanctions")?;
        Ok(rows)
    }
}

// ============================================================================
// Sweeper
// ============================================================================

/// Background task deleting expired sanctions on a fixed interval
pub struct SanctionSweeper {
    ctx: ServiceContext,
    interval: Duration,
}

impl SanctionSweeper {
    pub fn new(ctx: ServiceContext, interval: Duration) -> Self {
        Self { ctx, interval }
    }

    /// One sweep; failures are logged, never propagated.
    pub async fn tick(&self) -> u64 {
        match SanctionService::new(&self.ctx).expire_sanctions().await {
            Ok(deleted) => {
                if deleted > 0 {
                    tracing::debug!(deleted, "Expired sanctions swept");
                }
                deleted
            }
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "Sanction sweep failed");
                0
            }
        }
    }

    /// Spawn the sweep loop. Abort the handle to stop it.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(interval_secs = self.interval.as_secs(), "Sanction sweeper started");
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::EligibilityGate;
    use crate::services::testing;
    use chrono::Duration as ChronoDuration;

    struct Fixture {
        ctx: ServiceContext,
        resident_id: i64,
        secretary: Actor,
    }

    async fn fixture() -> Fixture {
        let ctx = testing::context().await;
        let resident_id = testing::resident(&ctx, "juan@example.com").await;
        let secretary = Actor::secretary(testing::staff(&ctx, Role::Secretary, "sec").await);
        AccountRepo::set_active(ctx.pool(), Role::Resident, resident_id, true)
            .await
            .unwrap();
        Fixture {
            ctx,
            resident_id,
            secretary,
        }
    }

    async fn is_active(f: &Fixture) -> bool {
        ResidentRepo::get_by_id(f.ctx.pool(), f.resident_id)
            .await
            .unwrap()
            .is_active
    }

    #[tokio::test]
    async fn test_apply_and_remove() {
        let f = fixture().await;
        let service = SanctionService::new(&f.ctx);
        let gate = EligibilityGate::new(&f.ctx);
        let now = time::now();

        service
            .apply_sanction(f.secretary, f.resident_id, now, now + ChronoDuration::hours(1), "LOUD karaoke")
            .await
            .unwrap();
        service
            .apply_sanction(f.secretary, f.resident_id, now, now + ChronoDuration::days(2), "unpaid fines")
            .await
            .unwrap();

        assert!(gate.is_blocked(f.resident_id).await.unwrap());
        assert!(!is_active(&f).await);
        let sanctions = service.list_sanctions().await.unwrap();
        assert_eq!(sanctions[0].reason, "Loud karaoke");

        assert_eq!(service.remove_sanction(f.secretary, f.resident_id).await.unwrap(), 2);
        assert!(!gate.is_blocked(f.resident_id).await.unwrap());
        assert!(is_active(&f).await);
    }

    #[tokio::test]
    async fn test_apply_validation() {
        let f = fixture().await;
        let service = SanctionService::new(&f.ctx);
        let now = time::now();

        let err = service
            .apply_sanction(f.secretary, f.resident_id, now, now, "Noise")
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<BusinessError>(), Some(BusinessError::Validation(_))));

        let err = service
            .apply_sanction(f.secretary, 999, now, now + ChronoDuration::hours(1), "Noise")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BusinessError>(),
            Some(BusinessError::ResidentNotFound(999))
        ));

        let err = service
            .apply_sanction(Actor::treasurer(1), f.resident_id, now, now + ChronoDuration::hours(1), "Noise")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BusinessError>(),
            Some(BusinessError::OperationNotPermitted { .. })
        ));
        assert!(is_active(&f).await);
    }

    #[tokio::test]
    async fn test_sweep_keeps_is_active_untouched() {
        let f = fixture().await;
        let service = SanctionService::new(&f.ctx);
        let now = time::now();

        service
            .apply_sanction(
                f.secretary,
                f.resident_id,
                now - ChronoDuration::hours(3),
                now - ChronoDuration::hours(1),
                "Expired",
            )
            .await
            .unwrap();
        service
            .apply_sanction(f.secretary, f.resident_id, now, now + ChronoDuration::hours(1), "Active")
            .await
            .unwrap();

        let sweeper = SanctionSweeper::new(f.ctx.clone(), Duration::from_secs(5));
        assert_eq!(sweeper.tick().await, 1);
        assert_eq!(service.list_sanctions().await.unwrap().len(), 1);
        assert!(EligibilityGate::new(&f.ctx).is_blocked(f.resident_id).await.unwrap());
        assert!(!is_active(&f).await);
    }

    #[tokio::test]
    async fn test_sweeper_task_runs_and_aborts() {
        let f = fixture().await;
        let now = time::now();
        SanctionService::new(&f.ctx)
            .apply_sanction(
                f.secretary,
                f.resident_id,
                now - ChronoDuration::hours(2),
                now - ChronoDuration::hours(1),
                "Expired",
            )
            .await
            .unwrap();

        let handle = SanctionSweeper::new(f.ctx.clone(), Duration::from_millis(20)).spawn();
        let mut remaining = usize::MAX;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            remaining = SanctionService::new(&f.ctx).list_sanctions().await.unwrap().len();
            if remaining == 0 {
                break;
            }
        }
        handle.abort();
        assert_eq!(remaining, 0);
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_concurrent_sanctions_on_shared_file() {
        use barangay_persistence::{Database, PoolSettings};

        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("portal.db").display());
        let settings = PoolSettings {
            max_connections: 4,
            ..PoolSettings::new(url)
        };
        let db = Database::connect(&settings).await.unwrap();
        let ctx = ServiceContext::new(&db);
        let resident_id = testing::resident(&ctx, "juan@example.com").await;
        let secretary = Actor::secretary(testing::staff(&ctx, Role::Secretary, "sec").await);

        let service = SanctionService::new(&ctx);
        let now = time::now();
        let (a, b, c, d) = tokio::join!(
            service.apply_sanction(secretary, resident_id, now, now + ChronoDuration::hours(1), "noise"),
            service.apply_sanction(secretary, resident_id, now, now + ChronoDuration::hours(2), "noise"),
            service.apply_sanction(secretary, resident_id, now, now + ChronoDuration::hours(3), "noise"),
            service.apply_sanction(secretary, resident_id, now, now + ChronoDuration::hours(4), "noise"),
        );
        for result in [a, b, c, d] {
            result.unwrap();
        }

        assert_eq!(service.list_sanctions().await.unwrap().len(), 4);
        db.close().await;
    }
}
