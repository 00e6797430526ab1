//! # Barangay Core
//!
//! Domain types shared by every layer of the portal.
//!
//! - [`Role`] / [`Actor`]: who is acting (resident, secretary, treasurer)
//! - [`DocumentType`], [`RequestStatus`], [`PaymentStatus`], [`Requirements`]:
//!   the document-request lifecycle
//! - [`ReportType`], [`FinancialSummary`]: read-only income rollups
//!
//! Không có I/O trong crate này - persistence và HTTP nằm ở các crate khác.

pub mod document;
pub mod error;
pub mod finance;
pub mod role;
pub mod text;
pub mod time;

pub use document::{DocumentType, PaymentStatus, RequestStatus, Requirements};
pub use error::{CoreError, CoreResult};
pub use finance::{
    default_date_range, resolve_range, summarize, BreakdownEntry, FinancialReport, FinancialSummary,
    PaidLine, ReportType,
};
pub use role::{Actor, Role};
