//! Business layer errors
//!
//! Uses anyhow for error aggregation with custom error types.

use barangay_core::{time, CoreError};
use barangay_persistence::PersistenceError;
use chrono::{DateTime, Utc};
use thiserror::Error;

fn until(ts: &DateTime<Utc>) -> String {
    time::format_long(*ts)
}

/// Business operation errors
#[derive(Debug, Error)]
pub enum BusinessError {
    // === Validation errors ===
    #[error("{0}")]
    Validation(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Email already exists")]
    EmailExists,

    // === Authentication / permission errors ===
    #[error("Email does not exist")]
    UnknownEmail,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("You are currently under sanctions for the Reason:\"{reason}\" until {}", until(.expires_at))]
    Sanctioned {
        reason: String,
        expires_at: DateTime<Utc>,
    },

    #[error("Operation not permitted for {role}: {operation}")]
    OperationNotPermitted { role: String, operation: String },

    // === Not found errors ===
    #[error("Request not found: {0}")]
    RequestNotFound(i64),

    #[error("No receipt found for request {0}")]
    ReceiptNotFound(i64),

    #[error("Resident not found: {0}")]
    ResidentNotFound(i64),

    #[error("Report not found: {0}")]
    ReportNotFound(i64),

    #[error("Update not found: {0}")]
    UpdateNotFound(i64),

    #[error("Comment not found: {0}")]
    CommentNotFound(i64),

    // === Wrapped errors ===
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type alias for business operations
pub type BusinessResult<T> = anyhow::Result<T>;

/// Coarse error class used at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; the message is safe to show
    Validation,
    /// Wrong role, bad credentials or an active sanction
    Authorization,
    NotFound,
    /// Store or unexpected failure; log the cause, show a generic message
    Internal,
}

impl BusinessError {
    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create operation not permitted error
    pub fn not_permitted(role: &str, operation: &str) -> Self {
        Self::OperationNotPermitted {
            role: role.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::PasswordMismatch | Self::EmailExists => ErrorKind::Validation,
            Self::UnknownEmail
            | Self::IncorrectPassword
            | Self::Sanctioned { .. }
            | Self::OperationNotPermitted { .. } => ErrorKind::Authorization,
            Self::RequestNotFound(_)
            | Self::ReceiptNotFound(_)
            | Self::ResidentNotFound(_)
            | Self::ReportNotFound(_)
            | Self::UpdateNotFound(_)
            | Self::CommentNotFound(_) => ErrorKind::NotFound,
            Self::Persistence(err) if err.is_not_found() => ErrorKind::NotFound,
            Self::Persistence(_) => ErrorKind::Internal,
            Self::Core(err) if err.is_user_input() => ErrorKind::Validation,
            Self::Core(_) => ErrorKind::Internal,
        }
    }
}

/// Classify an error returned by a service method.
pub fn classify(err: &anyhow::Error) -> ErrorKind {
    if let Some(err) = err.downcast_ref::<BusinessError>() {
        return err.kind();
    }
    if let Some(err) = err.downcast_ref::<PersistenceError>() {
        if err.is_not_found() {
            return ErrorKind::NotFound;
        }
        return ErrorKind::Internal;
    }
    match err.downcast_ref::<CoreError>() {
        Some(err) if err.is_user_input() => ErrorKind::Validation,
        _ => ErrorKind::Internal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use chrono::TimeZone;

    #[test]
    fn test_sanctioned_message() {
        let err = BusinessError::Sanctioned {
            reason: "Noise complaint".to_string(),
            expires_at: Utc.with_ymd_and_hms(2024, 5, 15, 15, 30, 0).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "You are currently under sanctions for the Reason:\"Noise complaint\" until May 15, 2024 03:30 PM"
        );
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_not_permitted_error() {
        let err = BusinessError::not_permitted("treasurer", "set_status");
        assert!(err.to_string().contains("treasurer"));
        assert!(err.to_string().contains("set_status"));
    }

    #[test]
    fn test_classify_through_context() {
        let err: anyhow::Error = Err::<(), _>(BusinessError::ReceiptNotFound(3))
            .context("Failed to mark paid")
            .unwrap_err();
        assert_eq!(classify(&err), ErrorKind::NotFound);

        let err = anyhow::Error::new(PersistenceError::Configuration("pool".into()));
        assert_eq!(classify(&err), ErrorKind::Internal);

        let err = anyhow::Error::new(CoreError::InvalidDate("2024-13-01".into()));
        assert_eq!(classify(&err), ErrorKind::Validation);

        let err = anyhow::Error::new(PersistenceError::not_found("Request", 9));
        assert_eq!(classify(&err), ErrorKind::NotFound);
    }
}
