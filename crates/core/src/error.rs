//! # Core Errors
//!
//! Lỗi domain: parse enum, validation input.

use thiserror::Error;

/// Domain-level errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    #[error("Unknown request status: {0}")]
    UnknownRequestStatus(String),

    #[error("Unknown payment status: {0}")]
    UnknownPaymentStatus(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Result type alias với CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Kiểm tra có phải lỗi do input người dùng không
    pub fn is_user_input(&self) -> bool {
        !matches!(self, CoreError::UnknownRole(_))
    }
}
