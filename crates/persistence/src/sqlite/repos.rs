//! Repository implementations cho SQLite
//!
//! Mỗi repo là một unit struct với các hàm async nhận executor: `&SqlitePool`
//! cho câu lệnh đơn lẻ, hoặc `&mut *tx` khi nhiều câu lệnh phải commit cùng nhau.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use barangay_core::{Role, RequestStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteExecutor, SqlitePool};

// ============================================================================
// Account Repository (role tables)
// ============================================================================

/// Prepared statements for one role table. Role tables are never chosen by
/// interpolating request data; [`Role`] selects one of these entries.
struct RoleQueries {
    entity: &'static str,
    credentials_by_email: &'static str,
    email_exists: &'static str,
    set_active: &'static str,
    count: &'static str,
}

const RESIDENT_QUERIES: RoleQueries = RoleQueries {
    entity: "Resident",
    credentials_by_email: "SELECT id, email, password FROM resident WHERE email = ?",
    email_exists: "SELECT COUNT(*) FROM resident WHERE email = ?",
    set_active: "UPDATE resident SET is_active = ? WHERE id = ?",
    count: "SELECT COUNT(*) FROM resident",
};

const SECRETARY_QUERIES: RoleQueries = RoleQueries {
    entity: "Secretary",
    credentials_by_email: "SELECT id, email, password FROM secretary WHERE email = ?",
    email_exists: "SELECT COUNT(*) FROM secretary WHERE email = ?",
    set_active: "UPDATE secretary SET is_active = ? WHERE id = ?",
    count: "SELECT COUNT(*) FROM secretary",
};

const TREASURER_QUERIES: RoleQueries = RoleQueries {
    entity: "Treasurer",
    credentials_by_email: "SELECT id, email, password FROM treasurer WHERE email = ?",
    email_exists: "SELECT COUNT(*) FROM treasurer WHERE email = ?",
    set_active: "UPDATE treasurer SET is_active = ? WHERE id = ?",
    count: "SELECT COUNT(*) FROM treasurer",
};

fn queries(role: Role) -> &'static RoleQueries {
    match role {
        Role::Resident => &RESIDENT_QUERIES,
        Role::Secretary => &SECRETARY_QUERIES,
        Role::Treasurer => &TREASURER_QUERIES,
    }
}

/// Operations shared by the three role tables
pub struct AccountRepo;

impl AccountRepo {
    /// Lấy credentials theo email trong bảng của role
    pub async fn find_credentials(
        pool: &SqlitePool,
        role: Role,
        email: &str,
    ) -> PersistenceResult<Option<CredentialRow>> {
        let row = sqlx::query_as::<_, CredentialRow>(queries(role).credentials_by_email)
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Email đã tồn tại trong bảng của role chưa
    pub async fn email_exists<'e, E: SqliteExecutor<'e>>(
        executor: E,
        role: Role,
        email: &str,
    ) -> PersistenceResult<bool> {
        let count: i64 = sqlx::query_scalar(queries(role).email_exists)
            .bind(email)
            .fetch_one(executor)
            .await?;
        Ok(count > 0)
    }

    /// Cập nhật is_active
    pub async fn set_active<'e, E: SqliteExecutor<'e>>(
        executor: E,
        role: Role,
        id: i64,
        active: bool,
    ) -> PersistenceResult<()> {
        let result = sqlx::query(queries(role).set_active)
            .bind(active)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found(queries(role).entity, id));
        }
        Ok(())
    }

    pub async fn count(pool: &SqlitePool, role: Role) -> PersistenceResult<i64> {
        let count: i64 = sqlx::query_scalar(queries(role).count)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

// ============================================================================
// Resident Repository
// ============================================================================

/// Repository cho bảng resident
pub struct ResidentRepo;

impl ResidentRepo {
    /// Thêm resident mới, trả về id
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        resident: &NewResident,
        created_at: DateTime<Utc>,
    ) -> PersistenceResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO resident
                (first_name, last_name, age, gender, birth_date, contact_number,
                 civil_status, email, password, address, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(&resident.first_name)
        .bind(&resident.last_name)
        .bind(resident.age)
        .bind(&resident.gender)
        .bind(&resident.birth_date)
        .bind(&resident.contact_number)
        .bind(&resident.civil_status)
        .bind(&resident.email)
        .bind(&resident.password_hash)
        .bind(&resident.address)
        .bind(created_at)
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Lấy resident theo ID
    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> PersistenceResult<ResidentRow> {
        sqlx::query_as::<_, ResidentRow>("SELECT * FROM resident WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Resident", id))
    }

    /// Danh sách residents, lọc theo is_active nếu có
    pub async fn list(
        pool: &SqlitePool,
        is_active: Option<bool>,
    ) -> PersistenceResult<Vec<ResidentRow>> {
        let rows = sqlx::query_as::<_, ResidentRow>(
            "SELECT * FROM resident WHERE (? IS NULL OR is_active = ?) ORDER BY id",
        )
        .bind(is_active)
        .bind(is_active)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

// ============================================================================
// Staff Repository (secretary / treasurer)
// ============================================================================

/// Repository cho bảng secretary và treasurer
pub struct StaffRepo;

impl StaffRepo {
    fn table_queries(role: Role) -> PersistenceResult<(&'static str, &'static str)> {
        match role {
            Role::Secretary => Ok((
                "INSERT INTO secretary (username, email, password, is_active, created_at) VALUES (?, ?, ?, FALSE, ?)",
                "SELECT * FROM secretary WHERE id = ?",
            )),
            Role::Treasurer => Ok((
                "INSERT INTO treasurer (username, email, password, is_active, created_at) VALUES (?, ?, ?, FALSE, ?)",
                "SELECT * FROM treasurer WHERE id = ?",
            )),
            Role::Resident => Err(PersistenceError::Configuration(
                "resident is not a staff role".to_string(),
            )),
        }
    }

    /// Thêm staff account mới, trả về id
    pub async fn insert(
        pool: &SqlitePool,
        role: Role,
        username: &str,
        email: &str,
        password_hash: &str,
        created_at: DateTime<Utc>,
    ) -> PersistenceResult<i64> {
        let (insert, _) = Self::table_queries(role)?;
        let result = sqlx::query(insert)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .bind(created_at)
            .execute(pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Lấy staff theo ID
    pub async fn get_by_id(pool: &SqlitePool, role: Role, id: i64) -> PersistenceResult<StaffRow> {
        let (_, select) = Self::table_queries(role)?;
        sqlx::query_as::<_, StaffRow>(select)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found(queries(role).entity, id))
    }

    /// Staff đang online
    pub async fn active_staff(pool: &SqlitePool) -> PersistenceResult<Vec<ActiveStaffRow>> {
        let rows = sqlx::query_as::<_, ActiveStaffRow>(
            r#"
            SELECT 'secretary' AS role, id, username FROM secretary WHERE is_active = TRUE
            UNION ALL
            SELECT 'treasurer' AS role, id, username FROM treasurer WHERE is_active = TRUE
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

// ============================================================================
// Request Repository
// ============================================================================

/// Repository cho bảng request_document
pub struct RequestRepo;

impl RequestRepo {
    /// Thêm request mới, trả về id
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        request: &NewRequest,
    ) -> PersistenceResult<i64> {
        let requirements = request.requirements.to_json()?;
        let result = sqlx::query(
            r#"
            INSERT INTO request_document
                (resident_id, document_type, price, requirements, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.resident_id)
        .bind(request.document_type.as_str())
        .bind(request.price.to_string())
        .bind(requirements)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Lấy request theo ID
    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> PersistenceResult<RequestRow> {
        sqlx::query_as::<_, RequestRow>("SELECT * FROM request_document WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Request", id))
    }

    /// Staff review: status + reviewed_by + reviewed_at together
    pub async fn update_review<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
        status: RequestStatus,
        reviewer_id: i64,
        reviewed_at: DateTime<Utc>,
    ) -> PersistenceResult<()> {
        let result = sqlx::query(
            "UPDATE request_document SET status = ?, reviewed_by = ?, reviewed_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(reviewer_id)
        .bind(reviewed_at)
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Request", id));
        }
        Ok(())
    }

    /// Cập nhật status (không đụng review fields)
    pub async fn set_status<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
        status: RequestStatus,
    ) -> PersistenceResult<()> {
        let result = sqlx::query("UPDATE request_document SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Request", id));
        }
        Ok(())
    }

    /// Xóa request của chính resident đó
    pub async fn delete_owned<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
        resident_id: i64,
    ) -> PersistenceResult<()> {
        let result = sqlx::query("DELETE FROM request_document WHERE id = ? AND resident_id = ?")
            .bind(id)
            .bind(resident_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Request", id));
        }
        Ok(())
    }

    /// Requests của một resident, mới nhất trước
    pub async fn list_for_resident(
        pool: &SqlitePool,
        resident_id: i64,
        status: Option<RequestStatus>,
    ) -> PersistenceResult<Vec<ResidentRequestRow>> {
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, ResidentRequestRow>(
            r#"
            SELECT rd.*, s.username AS reviewer_username
            FROM request_document rd
            LEFT JOIN secretary s ON rd.reviewed_by = s.id
            WHERE rd.resident_id = ? AND (? IS NULL OR rd.status = ?)
            ORDER BY rd.created_at DESC, rd.id DESC
            "#,
        )
        .bind(resident_id)
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Tất cả requests kèm tên resident
    pub async fn list_all(
        pool: &SqlitePool,
        status: Option<RequestStatus>,
    ) -> PersistenceResult<Vec<RequestWithResidentRow>> {
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, RequestWithResidentRow>(
            r#"
            SELECT rd.*, r.first_name || ' ' || r.last_name AS resident_name
            FROM request_document rd
            JOIN resident r ON rd.resident_id = r.id
            WHERE (? IS NULL OR rd.status = ?)
            ORDER BY rd.created_at DESC, rd.id DESC
            "#,
        )
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Ai đã release từng request
    pub async fn release_overview(pool: &SqlitePool) -> PersistenceResult<Vec<ReleaseOverviewRow>> {
        let rows = sqlx::query_as::<_, ReleaseOverviewRow>(
            r#"
            SELECT
                rd.id AS request_id,
                rd.status,
                CASE
                    WHEN rd.status = 'Released' THEN t.username
                    WHEN rd.status = 'To Pay' THEN 'Pending Payment'
                    WHEN rd.status = 'Rejected' THEN 'Rejected'
                    ELSE 'Pending Review'
                END AS released_by
            FROM request_document rd
            LEFT JOIN treasurer t ON t.id = (
                SELECT rc.issued_by FROM receipt rc
                WHERE rc.request_id = rd.id AND rc.issued_by IS NOT NULL
                ORDER BY rc.id DESC
                LIMIT 1
            )
            ORDER BY rd.id DESC
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Tổng price của các request ở một status
    pub async fn sum_price_by_status(
        pool: &SqlitePool,
        status: RequestStatus,
    ) -> PersistenceResult<Decimal> {
        let prices: Vec<String> =
            sqlx::query_scalar("SELECT price FROM request_document WHERE status = ?")
                .bind(status.as_str())
                .fetch_all(pool)
                .await?;
        prices
            .iter()
            .try_fold(Decimal::ZERO, |acc, raw| -> PersistenceResult<Decimal> {
                Ok(acc + parse_decimal(raw)?)
            })
    }

    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM request_document")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

// ============================================================================
// Receipt Repository
// ============================================================================

/// Repository cho bảng receipt
pub struct ReceiptRepo;

impl ReceiptRepo {
    /// Thêm receipt mới cho request, trả về id
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        request_id: i64,
        receipt: &NewReceipt,
    ) -> PersistenceResult<i64> {
        let result = sqlx::query(
            "INSERT INTO receipt (request_id, payment_status, paid_at) VALUES (?, ?, ?)",
        )
        .bind(request_id)
        .bind(receipt.payment_status.as_str())
        .bind(receipt.paid_at)
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Đánh dấu đã thanh toán. Trả về số rows bị ảnh hưởng.
    pub async fn mark_paid<'e, E: SqliteExecutor<'e>>(
        executor: E,
        request_id: i64,
        issuer_id: i64,
        paid_at: DateTime<Utc>,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query(
            "UPDATE receipt SET payment_status = 'Paid', paid_at = ?, issued_by = ? WHERE request_id = ?",
        )
        .bind(paid_at)
        .bind(issuer_id)
        .bind(request_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Ghi treasurer đã release. Trả về số rows bị ảnh hưởng.
    pub async fn set_issuer<'e, E: SqliteExecutor<'e>>(
        executor: E,
        request_id: i64,
        issuer_id: i64,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query("UPDATE receipt SET issued_by = ? WHERE request_id = ?")
            .bind(issuer_id)
            .bind(request_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Receipts của một request theo thứ tự tạo
    pub async fn list_for_request<'e, E: SqliteExecutor<'e>>(
        executor: E,
        request_id: i64,
    ) -> PersistenceResult<Vec<ReceiptRow>> {
        let rows = sqlx::query_as::<_, ReceiptRow>(
            "SELECT * FROM receipt WHERE request_id = ? ORDER BY id",
        )
        .bind(request_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Hàng đợi receipt của treasurer
    pub async fn pending(pool: &SqlitePool) -> PersistenceResult<Vec<PendingReceiptRow>> {
        let rows = sqlx::query_as::<_, PendingReceiptRow>(
            r#"
            SELECT
                rc.id AS receipt_id,
                rc.request_id,
                rd.document_type,
                rd.price,
                rd.status,
                rc.payment_status,
                rc.paid_at,
                rc.issued_by,
                r.first_name || ' ' || r.last_name AS resident_name
            FROM receipt rc
            JOIN request_document rd ON rc.request_id = rd.id
            LEFT JOIN resident r ON rd.resident_id = r.id
            WHERE rd.status IN ('To Pay', 'Released', 'To Pick Up')
            ORDER BY rc.id DESC
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Thanh toán từ `since` đến nay
    pub async fn recent_payments(
        pool: &SqlitePool,
        since: DateTime<Utc>,
    ) -> PersistenceResult<Vec<RecentPaymentRow>> {
        let rows = sqlx::query_as::<_, RecentPaymentRow>(
            r#"
            SELECT
                rc.paid_at,
                rd.price,
                rd.document_type,
                r.first_name || ' ' || r.last_name AS resident_name
            FROM receipt rc
            JOIN request_document rd ON rc.request_id = rd.id
            LEFT JOIN resident r ON rd.resident_id = r.id
            WHERE rc.paid_at IS NOT NULL AND rc.paid_at >= ?
            ORDER BY rc.paid_at DESC
            "#,
        )
        .bind(since)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Paid receipts với `from <= paid_at < until`
    pub async fn paid_lines(
        pool: &SqlitePool,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> PersistenceResult<Vec<PaidLineRow>> {
        let rows = sqlx::query_as::<_, PaidLineRow>(
            r#"
            SELECT rd.document_type, rd.price, rc.paid_at
            FROM request_document rd
            JOIN receipt rc ON rc.request_id = rd.id
            WHERE rc.paid_at IS NOT NULL
              AND rc.paid_at >= ? AND rc.paid_at < ?
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipt")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

// ============================================================================
// Sanction Repository
// ============================================================================

/// Repository cho bảng sanctions
pub struct SanctionRepo;

impl SanctionRepo {
    /// Thêm sanction, trả về id
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        sanction: &NewSanction,
    ) -> PersistenceResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sanctions (resident_id, issued_by, issued_at, expires_at, reason)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(sanction.resident_id)
        .bind(sanction.issued_by)
        .bind(sanction.issued_at)
        .bind(sanction.expires_at)
        .bind(&sanction.reason)
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Xóa tất cả sanctions của resident
    pub async fn delete_for_resident<'e, E: SqliteExecutor<'e>>(
        executor: E,
        resident_id: i64,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query("DELETE FROM sanctions WHERE resident_id = ?")
            .bind(resident_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Xóa sanctions có `expires_at < now`
    pub async fn delete_expired<'e, E: SqliteExecutor<'e>>(
        executor: E,
        now: DateTime<Utc>,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query("DELETE FROM sanctions WHERE expires_at < ?")
            .bind(now)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Sanction còn hiệu lực gần nhất của resident
    pub async fn latest_active<'e, E: SqliteExecutor<'e>>(
        executor: E,
        resident_id: i64,
        now: DateTime<Utc>,
    ) -> PersistenceResult<Option<SanctionRow>> {
        let row = sqlx::query_as::<_, SanctionRow>(
            r#"
            SELECT * FROM sanctions
            WHERE resident_id = ? AND expires_at > ?
            ORDER BY issued_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(resident_id)
        .bind(now)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn list_all(pool: &SqlitePool) -> PersistenceResult<Vec<SanctionRow>> {
        let rows = sqlx::query_as::<_, SanctionRow>("SELECT * FROM sanctions ORDER BY id")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_resident(
        pool: &SqlitePool,
        resident_id: i64,
    ) -> PersistenceResult<Vec<SanctionRow>> {
        let rows = sqlx::query_as::<_, SanctionRow>(
            "SELECT * FROM sanctions WHERE resident_id = ? ORDER BY id",
        )
        .bind(resident_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sanctions")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
