//! Database schema definitions
//!
//! Row types cho sqlx mapping từ SQLite tables.
//! Schema được định nghĩa trong migrations/20250101000000_init.sql

use crate::error::{PersistenceError, PersistenceResult};
use barangay_core::{DocumentType, PaidLine, PaymentStatus, RequestStatus, Requirements};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub(crate) fn parse_decimal(raw: &str) -> PersistenceResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| PersistenceError::InvalidDecimal(format!("{raw}: {e}")))
}

// === Accounts ===

/// Row type cho bảng `resident`
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ResidentRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub gender: String,
    pub birth_date: String,
    pub contact_number: String,
    pub civil_status: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub address: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ResidentRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Insert payload cho bảng `resident` (password đã hash)
#[derive(Debug, Clone)]
pub struct NewResident {
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub gender: String,
    pub birth_date: String,
    pub contact_number: String,
    pub civil_status: String,
    pub email: String,
    pub password_hash: String,
    pub address: String,
}

/// Row type cho bảng `secretary` và `treasurer`
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct StaffRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Email + password hash, looked up per role table during login
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRow {
    pub id: i64,
    pub email: String,
    pub password: String,
}

/// Staff currently online (secretary ∪ treasurer)
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ActiveStaffRow {
    pub role: String,
    pub id: i64,
    pub username: String,
}

// === Requests ===

/// Row type cho bảng `request_document`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RequestRow {
    pub id: i64,
    pub resident_id: i64,
    pub document_type: String,
    pub price: String, // Decimal stored as TEXT
    pub requirements: String, // JSON object
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl RequestRow {
    pub fn document_type(&self) -> PersistenceResult<DocumentType> {
        Ok(DocumentType::from_str(&self.document_type)?)
    }

    pub fn status(&self) -> PersistenceResult<RequestStatus> {
        Ok(RequestStatus::from_str(&self.status)?)
    }

    pub fn price(&self) -> PersistenceResult<Decimal> {
        parse_decimal(&self.price)
    }

    pub fn requirements(&self) -> PersistenceResult<Requirements> {
        Ok(Requirements::from_json(&self.requirements)?)
    }
}

/// Insert payload cho bảng `request_document`
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub resident_id: i64,
    pub document_type: DocumentType,
    pub price: Decimal,
    pub requirements: Requirements,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// A resident's own request with the reviewing secretary's username
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ResidentRequestRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: RequestRow,
    pub reviewer_username: Option<String>,
}

/// Staff view of a request with the requester's name
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct RequestWithResidentRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: RequestRow,
    pub resident_name: String,
}

/// Who released each request
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ReleaseOverviewRow {
    pub request_id: i64,
    pub status: String,
    pub released_by: Option<String>,
}

// === Receipts ===

/// Row type cho bảng `receipt`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ReceiptRow {
    pub id: i64,
    pub request_id: i64,
    pub payment_status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub issued_by: Option<i64>,
}

impl ReceiptRow {
    pub fn payment_status(&self) -> PersistenceResult<PaymentStatus> {
        Ok(PaymentStatus::from_str(&self.payment_status)?)
    }
}

/// Insert payload cho bảng `receipt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReceipt {
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

impl NewReceipt {
    /// Receipt with payment fields unset
    pub fn unpaid() -> Self {
        Self {
            payment_status: PaymentStatus::Unpaid,
            paid_at: None,
        }
    }

    pub fn paid(at: DateTime<Utc>) -> Self {
        Self {
            payment_status: PaymentStatus::Paid,
            paid_at: Some(at),
        }
    }
}

/// Treasurer's receipt queue
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PendingReceiptRow {
    pub receipt_id: i64,
    pub request_id: i64,
    pub document_type: String,
    pub price: String,
    pub status: String,
    pub payment_status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub issued_by: Option<i64>,
    pub resident_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct RecentPaymentRow {
    pub paid_at: DateTime<Utc>,
    pub price: String,
    pub document_type: String,
    pub resident_name: Option<String>,
}

/// Paid receipt joined with its request, input of the financial reducer
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaidLineRow {
    pub document_type: String,
    pub price: String,
    pub paid_at: DateTime<Utc>,
}

impl PaidLineRow {
    pub fn to_paid_line(&self) -> PersistenceResult<PaidLine> {
        Ok(PaidLine {
            document_type: DocumentType::from_str(&self.document_type)?,
            amount: parse_decimal(&self.price)?,
        })
    }
}

// === Sanctions ===

/// Row type cho bảng `sanctions`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct SanctionRow {
    pub id: i64,
    pub resident_id: i64,
    pub issued_by: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub reason: String,
}

impl SanctionRow {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone)]
pub struct NewSanction {
    pub resident_id: i64,
    pub issued_by: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub reason: String,
}

// === Community ===

/// Row type cho bảng `community_report`
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ReportRow {
    pub id: i64,
    pub resident_id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: String,
    pub posted_at: DateTime<Utc>,
    pub reviewed_by: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ReportListingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub report: ReportRow,
    pub resident_name: Option<String>,
    pub reviewer_username: Option<String>,
}

/// Row type cho bảng `community_update`
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UpdateRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UpdateListingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub update: UpdateRow,
    pub author_username: String,
    pub comment_count: i64,
    pub up_votes: i64,
    pub down_votes: i64,
}

/// Row type cho bảng `comments`
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub created_by: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CommentListingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub comment: CommentRow,
    pub author_name: String,
}
