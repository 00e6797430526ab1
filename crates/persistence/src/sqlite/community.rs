//! Community repos: reports, updates, comments, votes

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};

/// Vote direction on a community update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

// ============================================================================
// Report Repository
// ============================================================================

/// Repository cho bảng community_report
pub struct ReportRepo;

impl ReportRepo {
    pub async fn insert(
        pool: &SqlitePool,
        resident_id: i64,
        title: &str,
        content: &str,
        category: &str,
        posted_at: DateTime<Utc>,
    ) -> PersistenceResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO community_report (resident_id, title, content, category, status, posted_at)
            VALUES (?, ?, ?, ?, 'Pending', ?)
            "#,
        )
        .bind(resident_id)
        .bind(title)
        .bind(content)
        .bind(category)
        .bind(posted_at)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Xóa report của chính resident đó
    pub async fn delete_owned(pool: &SqlitePool, id: i64, resident_id: i64) -> PersistenceResult<()> {
        let result = sqlx::query("DELETE FROM community_report WHERE id = ? AND resident_id = ?")
            .bind(id)
            .bind(resident_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Report", id));
        }
        Ok(())
    }

    /// Secretary đánh dấu report đã xử lý
    pub async fn resolve(pool: &SqlitePool, id: i64, reviewer_id: i64) -> PersistenceResult<()> {
        let result = sqlx::query(
            "UPDATE community_report SET status = 'Resolved', reviewed_by = ? WHERE id = ?",
        )
        .bind(reviewer_id)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Report", id));
        }
        Ok(())
    }

    pub async fn list_for_resident(
        pool: &SqlitePool,
        resident_id: i64,
    ) -> PersistenceResult<Vec<ReportListingRow>> {
        let rows = sqlx::query_as::<_, ReportListingRow>(
            r#"
            SELECT cr.*,
                   r.first_name || ' ' || r.last_name AS resident_name,
                   s.username AS reviewer_username
            FROM community_report cr
            LEFT JOIN resident r ON cr.resident_id = r.id
            LEFT JOIN secretary s ON cr.reviewed_by = s.id
            WHERE cr.resident_id = ?
            ORDER BY cr.posted_at DESC, cr.id DESC
            "#,
        )
        .bind(resident_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_all(pool: &SqlitePool) -> PersistenceResult<Vec<ReportListingRow>> {
        let rows = sqlx::query_as::<_, ReportListingRow>(
            r#"
            SELECT cr.*,
                   r.first_name || ' ' || r.last_name AS resident_name,
                   s.username AS reviewer_username
            FROM community_report cr
            LEFT JOIN resident r ON cr.resident_id = r.id
            LEFT JOIN secretary s ON cr.reviewed_by = s.id
            ORDER BY cr.posted_at DESC, cr.id DESC
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

// ============================================================================
// Update Repository
// ============================================================================

const UPDATE_LISTING: &str = r#"
    SELECT cu.*,
           s.username AS author_username,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = cu.id) AS comment_count,
           (SELECT COUNT(*) FROM update_votes v WHERE v.update_id = cu.id AND v.direction = 'up') AS up_votes,
           (SELECT COUNT(*) FROM update_votes v WHERE v.update_id = cu.id AND v.direction = 'down') AS down_votes
    FROM community_update cu
    JOIN secretary s ON cu.created_by = s.id
"#;

/// Repository cho bảng community_update
pub struct UpdateRepo;

impl UpdateRepo {
    pub async fn insert(
        pool: &SqlitePool,
        title: &str,
        content: &str,
        created_by: i64,
        created_at: DateTime<Utc>,
    ) -> PersistenceResult<i64> {
        let result = sqlx::query(
            "INSERT INTO community_update (title, content, created_by, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(content)
        .bind(created_by)
        .bind(created_at)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Tất cả updates, mới nhất trước
    pub async fn list(pool: &SqlitePool) -> PersistenceResult<Vec<UpdateListingRow>> {
        let sql = format!("{UPDATE_LISTING} ORDER BY cu.created_at DESC, cu.id DESC");
        let rows = sqlx::query_as::<_, UpdateListingRow>(&sql)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Updates của một secretary
    pub async fn list_by_author(
        pool: &SqlitePool,
        secretary_id: i64,
    ) -> PersistenceResult<Vec<UpdateListingRow>> {
        let sql = format!(
            "{UPDATE_LISTING} WHERE cu.created_by = ? ORDER BY cu.created_at DESC, cu.id DESC"
        );
        let rows = sqlx::query_as::<_, UpdateListingRow>(&sql)
            .bind(secretary_id)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_listing(pool: &SqlitePool, id: i64) -> PersistenceResult<UpdateListingRow> {
        let sql = format!("{UPDATE_LISTING} WHERE cu.id = ?");
        sqlx::query_as::<_, UpdateListingRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Update", id))
    }
}

// ============================================================================
// Comment Repository
// ============================================================================

/// Repository cho bảng comments
pub struct CommentRepo;

impl CommentRepo {
    pub async fn insert(
        pool: &SqlitePool,
        post_id: i64,
        created_by: i64,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> PersistenceResult<i64> {
        let result = sqlx::query(
            "INSERT INTO comments (post_id, created_by, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(post_id)
        .bind(created_by)
        .bind(content)
        .bind(created_at)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Xóa comment của chính resident đó
    pub async fn delete_owned(pool: &SqlitePool, id: i64, resident_id: i64) -> PersistenceResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ? AND created_by = ?")
            .bind(id)
            .bind(resident_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Comment", id));
        }
        Ok(())
    }

    /// Comments của một update, cũ nhất trước
    pub async fn list_for_update(
        pool: &SqlitePool,
        post_id: i64,
    ) -> PersistenceResult<Vec<CommentListingRow>> {
        let rows = sqlx::query_as::<_, CommentListingRow>(
            r#"
            SELECT c.*, r.first_name || ' ' || r.last_name AS author_name
            FROM comments c
            JOIN resident r ON c.created_by = r.id
            WHERE c.post_id = ?
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(post_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

// ============================================================================
// Vote Repository
// ============================================================================

/// Repository cho bảng update_votes. Mỗi resident có tối đa một vote mỗi update.
pub struct VoteRepo;

impl VoteRepo {
    /// Cast or switch a vote
    pub async fn cast<'e, E: SqliteExecutor<'e>>(
        executor: E,
        update_id: i64,
        resident_id: i64,
        direction: VoteDirection,
    ) -> PersistenceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO update_votes (update_id, resident_id, direction) VALUES (?, ?, ?)
            ON CONFLICT (update_id, resident_id) DO UPDATE SET direction = excluded.direction
            "#,
        )
        .bind(update_id)
        .bind(resident_id)
        .bind(direction.as_str())
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Retract a vote in the given direction. Trả về true nếu có vote bị xóa.
    pub async fn retract<'e, E: SqliteExecutor<'e>>(
        executor: E,
        update_id: i64,
        resident_id: i64,
        direction: VoteDirection,
    ) -> PersistenceResult<bool> {
        let result = sqlx::query(
            "DELETE FROM update_votes WHERE update_id = ? AND resident_id = ? AND direction = ?",
        )
        .bind(update_id)
        .bind(resident_id)
        .bind(direction.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
