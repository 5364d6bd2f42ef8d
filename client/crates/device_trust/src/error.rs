//! Device Trust Error Types
//!
//! Trust-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. None of these ever reach the end user
//! as-is: the orchestrator resolves them into a [`SecurityCheck`] verdict.
//!
//! [`SecurityCheck`]: crate::application::SecurityCheck

use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rpc::RpcError;
use thiserror::Error;

/// Trust-specific result type alias
pub type TrustResult<T> = Result<T, TrustError>;

#[derive(Debug, Error)]
pub enum TrustError {
    /// A fingerprint hash that is not 64 lowercase hex characters
    #[error("Invalid fingerprint hash: {0}")]
    InvalidHash(String),

    /// Remote lockout backend failed
    #[error("Lockout backend error: {0}")]
    Backend(#[from] RpcError),

    /// Lockout backend is unreachable (non-HTTP implementations)
    #[error("Lockout backend unavailable: {0}")]
    Unavailable(String),

    /// The owning view closed before the result arrived
    #[error("Request cancelled: view scope closed")]
    Cancelled,

    /// Canonical fingerprint encoding failed
    #[error("Canonical encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl TrustError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrustError::InvalidHash(_) => ErrorKind::InvalidInput,
            TrustError::Backend(RpcError::Decode { .. }) => ErrorKind::ContractViolation,
            TrustError::Backend(e) => e
                .status()
                .map(ErrorKind::from_backend_status)
                .unwrap_or(ErrorKind::BackendUnavailable),
            TrustError::Unavailable(_) => ErrorKind::BackendUnavailable,
            TrustError::Cancelled => ErrorKind::Cancelled,
            TrustError::Encoding(_) => ErrorKind::Internal,
        }
    }

    /// Whether the failure is an outage the failure policy may absorb
    pub fn is_fail_open(&self) -> bool {
        self.kind().is_fail_open()
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self, operation: &'static str) {
        match self {
            TrustError::Backend(e) if e.is_timeout() => {
                tracing::warn!(operation, error = %e, "Lockout backend timed out");
            }
            TrustError::Backend(e) => {
                tracing::warn!(operation, error = %e, "Lockout backend error");
            }
            TrustError::Unavailable(msg) => {
                tracing::warn!(operation, message = %msg, "Lockout backend unavailable");
            }
            TrustError::Encoding(e) => {
                tracing::error!(operation, error = %e, "Fingerprint encoding error");
            }
            TrustError::Cancelled => {
                tracing::debug!(operation, "Result discarded after view closed");
            }
            TrustError::InvalidHash(hash) => {
                tracing::debug!(operation, hash = %hash, "Rejected fingerprint hash");
            }
        }
    }
}

impl From<TrustError> for AppError {
    fn from(err: TrustError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        AppError::new(kind, message).with_source(err)
    }
}
