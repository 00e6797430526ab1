//! # Barangay Persistence
//!
//! Persistence layer cho barangay portal - SQLite store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Database                        │
//! │  ┌─────────────┐    ┌──────────────────────────────┐ │
//! │  │   SQLite    │    │            Repos             │ │
//! │  │   (pool)    │    │ accounts, requests, receipts │ │
//! │  │             │    │ sanctions, community         │ │
//! │  └─────────────┘    └──────────────────────────────┘ │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use barangay_persistence::{Database, PoolSettings, RequestRepo};
//!
//! let db = Database::connect(&PoolSettings::new("sqlite:barangay.db?mode=rwc")).await?;
//! let request = RequestRepo::get_by_id(db.pool(), 1).await?;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::*;

use sqlx::SqlitePool;

/// Database facade
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Mở database và chạy migrations
    pub async fn connect(settings: &PoolSettings) -> PersistenceResult<Self> {
        let pool = init_database(settings).await?;
        Ok(Self { pool })
    }

    /// In-memory database đã migrate, dùng cho tests
    pub async fn in_memory() -> PersistenceResult<Self> {
        let pool = create_memory_pool().await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip tới database
    pub async fn ping(&self) -> PersistenceResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barangay_core::{time, DocumentType, RequestStatus, Requirements, Role};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn resident(email: &str) -> NewResident {
        NewResident {
            first_name: "Juan".to_string(),
            last_name: "Dela Cruz".to_string(),
            age: 30,
            gender: "Male".to_string(),
            birth_date: "1994-01-01".to_string(),
            contact_number: "09171234567".to_string(),
            civil_status: "Single".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            address: "Purok 1".to_string(),
        }
    }

    async fn seed(db: &Database) -> (i64, i64, i64) {
        let now = time::now();
        let resident_id = ResidentRepo::insert(db.pool(), &resident("juan@example.com"), now)
            .await
            .unwrap();
        let secretary_id =
            StaffRepo::insert(db.pool(), Role::Secretary, "sec", "sec@brgy.ph", "hash", now)
                .await
                .unwrap();
        let treasurer_id =
            StaffRepo::insert(db.pool(), Role::Treasurer, "tres", "tres@brgy.ph", "hash", now)
                .await
                .unwrap();
        (resident_id, secretary_id, treasurer_id)
    }

    fn new_request(resident_id: i64, document_type: DocumentType) -> NewRequest {
        NewRequest {
            resident_id,
            document_type,
            price: document_type.price(),
            requirements: Requirements::purpose("school"),
            status: RequestStatus::initial(),
            created_at: time::now(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_database_migrates() {
        let db = Database::in_memory().await.unwrap();
        db.ping().await.unwrap();
        assert_eq!(AccountRepo::count(db.pool(), Role::Resident).await.unwrap(), 0);
        assert_eq!(RequestRepo::count(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("portal.db").display());
        let db = Database::connect(&PoolSettings::new(url)).await.unwrap();
        db.ping().await.unwrap();
        db.close().await;
        assert!(dir.path().join("portal.db").exists());
    }

    #[tokio::test]
    async fn test_account_lookup_per_role() {
        let db = Database::in_memory().await.unwrap();
        let (resident_id, secretary_id, _) = seed(&db).await;

        let creds = AccountRepo::find_credentials(db.pool(), Role::Resident, "juan@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(creds.id, resident_id);

        // Same email is not visible from another role table
        assert!(AccountRepo::find_credentials(db.pool(), Role::Treasurer, "juan@example.com")
            .await
            .unwrap()
            .is_none());

        assert!(AccountRepo::email_exists(db.pool(), Role::Secretary, "sec@brgy.ph")
            .await
            .unwrap());

        AccountRepo::set_active(db.pool(), Role::Secretary, secretary_id, true)
            .await
            .unwrap();
        let online = StaffRepo::active_staff(db.pool()).await.unwrap();
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].role, "secretary");

        let missing = AccountRepo::set_active(db.pool(), Role::Resident, 999, true).await;
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_resident_filter_and_unique_email() {
        let db = Database::in_memory().await.unwrap();
        let (resident_id, _, _) = seed(&db).await;

        let duplicate =
            ResidentRepo::insert(db.pool(), &resident("juan@example.com"), time::now()).await;
        let err = duplicate.unwrap_err();
        assert!(err.is_database_error());
        assert!(err.is_unique_violation());

        AccountRepo::set_active(db.pool(), Role::Resident, resident_id, true)
            .await
            .unwrap();
        assert_eq!(ResidentRepo::list(db.pool(), Some(true)).await.unwrap().len(), 1);
        assert!(ResidentRepo::list(db.pool(), Some(false)).await.unwrap().is_empty());
        assert_eq!(ResidentRepo::list(db.pool(), None).await.unwrap().len(), 1);

        let row = ResidentRepo::get_by_id(db.pool(), resident_id).await.unwrap();
        assert_eq!(row.full_name(), "Juan Dela Cruz");
    }

    #[tokio::test]
    async fn test_request_review_and_listing() {
        let db = Database::in_memory().await.unwrap();
        let (resident_id, secretary_id, _) = seed(&db).await;

        let id = RequestRepo::insert(db.pool(), &new_request(resident_id, DocumentType::BarangayClearance))
            .await
            .unwrap();
        let row = RequestRepo::get_by_id(db.pool(), id).await.unwrap();
        assert_eq!(row.status().unwrap(), RequestStatus::ToPay);
        assert_eq!(row.price().unwrap(), dec!(50));
        assert_eq!(row.requirements().unwrap().get("purpose"), Some("school"));

        RequestRepo::update_review(db.pool(), id, RequestStatus::ToPickUp, secretary_id, time::now())
            .await
            .unwrap();

        let mine = RequestRepo::list_for_resident(db.pool(), resident_id, None)
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].reviewer_username.as_deref(), Some("sec"));

        let to_pay = RequestRepo::list_all(db.pool(), Some(RequestStatus::ToPay))
            .await
            .unwrap();
        assert!(to_pay.is_empty());
        let all = RequestRepo::list_all(db.pool(), None).await.unwrap();
        assert_eq!(all[0].resident_name, "Juan Dela Cruz");
    }

    #[tokio::test]
    async fn test_delete_owned_request_cascades_receipts() {
        let db = Database::in_memory().await.unwrap();
        let (resident_id, _, _) = seed(&db).await;
        let other = ResidentRepo::insert(db.pool(), &resident("maria@example.com"), time::now())
            .await
            .unwrap();

        let id = RequestRepo::insert(db.pool(), &new_request(resident_id, DocumentType::IndigencyCertificate))
            .await
            .unwrap();
        ReceiptRepo::insert(db.pool(), id, &NewReceipt::unpaid())
            .await
            .unwrap();

        let err = RequestRepo::delete_owned(db.pool(), id, other).await.unwrap_err();
        assert!(err.is_not_found());

        RequestRepo::delete_owned(db.pool(), id, resident_id).await.unwrap();
        assert_eq!(ReceiptRepo::count(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_receipt_payment_and_paid_lines() {
        let db = Database::in_memory().await.unwrap();
        let (resident_id, _, treasurer_id) = seed(&db).await;

        let id = RequestRepo::insert(db.pool(), &new_request(resident_id, DocumentType::BusinessPermit))
            .await
            .unwrap();
        ReceiptRepo::insert(db.pool(), id, &NewReceipt::unpaid())
            .await
            .unwrap();

        assert_eq!(ReceiptRepo::mark_paid(db.pool(), 999, treasurer_id, time::now()).await.unwrap(), 0);

        let paid_at = Utc.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap();
        assert_eq!(
            ReceiptRepo::mark_paid(db.pool(), id, treasurer_id, paid_at).await.unwrap(),
            1
        );

        let from = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let lines = ReceiptRepo::paid_lines(db.pool(), from, until).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].to_paid_line().unwrap().amount, dec!(200));

        let after = ReceiptRepo::paid_lines(db.pool(), until, until + Duration::days(30))
            .await
            .unwrap();
        assert!(after.is_empty());

        let recent = ReceiptRepo::recent_payments(db.pool(), from).await.unwrap();
        assert_eq!(recent[0].resident_name.as_deref(), Some("Juan Dela Cruz"));
    }

    #[tokio::test]
    async fn test_release_overview_labels() {
        let db = Database::in_memory().await.unwrap();
        let (resident_id, _, treasurer_id) = seed(&db).await;

        let released = RequestRepo::insert(db.pool(), &new_request(resident_id, DocumentType::BarangayClearance))
            .await
            .unwrap();
        ReceiptRepo::insert(db.pool(), released, &NewReceipt::unpaid()).await.unwrap();
        ReceiptRepo::insert(db.pool(), released, &NewReceipt::unpaid()).await.unwrap();
        RequestRepo::set_status(db.pool(), released, RequestStatus::Released).await.unwrap();
        ReceiptRepo::set_issuer(db.pool(), released, treasurer_id).await.unwrap();

        let waiting = RequestRepo::insert(db.pool(), &new_request(resident_id, DocumentType::CertificateOfResidency))
            .await
            .unwrap();

        let overview = RequestRepo::release_overview(db.pool()).await.unwrap();
        assert_eq!(overview.len(), 2);
        let by_id = |id: i64| overview.iter().find(|row| row.request_id == id).unwrap();
        assert_eq!(by_id(released).released_by.as_deref(), Some("tres"));
        assert_eq!(by_id(waiting).released_by.as_deref(), Some("Pending Payment"));

        assert_eq!(
            RequestRepo::sum_price_by_status(db.pool(), RequestStatus::Released).await.unwrap(),
            dec!(50)
        );
    }

    #[tokio::test]
    async fn test_sanction_queries() {
        let db = Database::in_memory().await.unwrap();
        let (resident_id, secretary_id, _) = seed(&db).await;
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();

        for (offset, reason) in [(-1, "Expired"), (1, "Old"), (2, "Newest")] {
            SanctionRepo::insert(
                db.pool(),
                &NewSanction {
                    resident_id,
                    issued_by: secretary_id,
                    issued_at: now + Duration::minutes(offset),
                    expires_at: now + Duration::hours(offset),
                    reason: reason.to_string(),
                },
            )
            .await
            .unwrap();
        }

        let active = SanctionRepo::latest_active(db.pool(), resident_id, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.reason, "Newest");

        assert_eq!(SanctionRepo::delete_expired(db.pool(), now).await.unwrap(), 1);
        assert_eq!(SanctionRepo::list_for_resident(db.pool(), resident_id).await.unwrap().len(), 2);

        assert_eq!(SanctionRepo::delete_for_resident(db.pool(), resident_id).await.unwrap(), 2);
        assert!(SanctionRepo::latest_active(db.pool(), resident_id, now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_updates_comments_and_votes() {
        let db = Database::in_memory().await.unwrap();
        let (resident_id, secretary_id, _) = seed(&db).await;

        let update_id = UpdateRepo::insert(db.pool(), "Clean-up drive", "Saturday", secretary_id, time::now())
            .await
            .unwrap();
        CommentRepo::insert(db.pool(), update_id, resident_id, "Count me in", time::now())
            .await
            .unwrap();

        VoteRepo::cast(db.pool(), update_id, resident_id, VoteDirection::Up).await.unwrap();
        VoteRepo::cast(db.pool(), update_id, resident_id, VoteDirection::Down).await.unwrap();

        let listing = UpdateRepo::get_listing(db.pool(), update_id).await.unwrap();
        assert_eq!(listing.author_username, "sec");
        assert_eq!(listing.comment_count, 1);
        assert_eq!((listing.up_votes, listing.down_votes), (0, 1));

        assert!(!VoteRepo::retract(db.pool(), update_id, resident_id, VoteDirection::Up).await.unwrap());
        assert!(VoteRepo::retract(db.pool(), update_id, resident_id, VoteDirection::Down).await.unwrap());

        let comments = CommentRepo::list_for_update(db.pool(), update_id).await.unwrap();
        assert_eq!(comments[0].author_name, "Juan Dela Cruz");
    }

    #[tokio::test]
    async fn test_reports_resolve() {
        let db = Database::in_memory().await.unwrap();
        let (resident_id, secretary_id, _) = seed(&db).await;

        let id = ReportRepo::insert(db.pool(), resident_id, "Broken light", "Purok 2", "Infrastructure", time::now())
            .await
            .unwrap();
        ReportRepo::resolve(db.pool(), id, secretary_id).await.unwrap();

        let reports = ReportRepo::list_for_resident(db.pool(), resident_id).await.unwrap();
        assert_eq!(reports[0].report.status, "Resolved");
        assert_eq!(reports[0].reviewer_username.as_deref(), Some("sec"));
    }
}
