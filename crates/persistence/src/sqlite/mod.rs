//! SQLite persistence module
//!
//! Repository pattern cho SQLite database access.

pub mod community;
pub mod pool;
pub mod repos;
pub mod schema;

pub use community::{CommentRepo, ReportRepo, UpdateRepo, VoteDirection, VoteRepo};
pub use pool::{create_memory_pool, create_pool, init_database, run_migrations, PoolSettings};
pub use repos::{AccountRepo, ReceiptRepo, RequestRepo, ResidentRepo, SanctionRepo, StaffRepo};
pub use schema::{
    ActiveStaffRow, CommentListingRow, CommentRow, CredentialRow, NewReceipt, NewRequest,
    NewResident, NewSanction, PaidLineRow, PendingReceiptRow, ReceiptRow, RecentPaymentRow,
    ReleaseOverviewRow, ReportListingRow, ReportRow, RequestRow, RequestWithResidentRow,
    ResidentRequestRow, ResidentRow, SanctionRow, StaffRow, UpdateListingRow, UpdateRow,
};
