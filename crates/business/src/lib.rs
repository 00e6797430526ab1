//! # Barangay Business
//!
//! Business logic layer - document requests, receipts, sanctions,
//! eligibility, financial reports and community records.
//!
//! Mỗi service mượn một [`ServiceContext`] (pool + settings):
//!
//! ```rust,ignore
//! let ctx = ServiceContext::new(&db);
//! let actor = AuthService::new(&ctx).login("juan@example.com", "secret").await?;
//! RequestService::new(&ctx).create_request(actor.id, doc, requirements).await?;
//! ```

pub mod auth;
pub mod community;
pub mod directory;
pub mod eligibility;
pub mod error;
pub mod finance;
pub mod receipts;
pub mod requests;
pub mod sanctions;
pub mod services;
pub mod uploads;

pub use auth::{AuthService, Profile, RegisterForm};
pub use community::{CommunityService, UpdateThread, VoteAction};
pub use directory::{greeting_at, DirectoryService, ResidentFilter};
pub use eligibility::EligibilityGate;
pub use error::{classify, BusinessError, BusinessResult, ErrorKind};
pub use finance::FinanceService;
pub use receipts::{Collections, ReceiptService};
pub use requests::{EveryTransition, PaymentTransitionsOnly, ReceiptPolicy, RequestService, StatusChange};
pub use sanctions::{SanctionService, SanctionSweeper};
pub use services::{ServiceContext, ServiceSettings};
pub use uploads::{UploadStore, UploadedFile};
