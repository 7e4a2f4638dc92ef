//! Error taxonomy shared by every remote capability.

use thiserror::Error;

/// The four outcomes a remote call can fail with.
///
/// Callers must be able to tell these apart, so adapters map transport- and
/// API-specific failures onto exactly one variant instead of collapsing them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The addressed object (file, ref, issue, resource) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The credentials in use are not allowed to perform the call.
    #[error("permission denied ({code}): {detail}")]
    PermissionDenied { code: String, detail: String },

    /// The object being created already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Network failure, rate limiting, timeouts, 5xx and anything unclassified.
    #[error("upstream error ({code}): {detail}")]
    Upstream { code: String, detail: String },
}

impl RemoteError {
    pub fn permission_denied(code: impl Into<String>, detail: impl Into<String>) -> Self {
        RemoteError::PermissionDenied {
            code: code.into(),
            detail: detail.into(),
        }
    }

    pub fn upstream(code: impl Into<String>, detail: impl Into<String>) -> Self {
        RemoteError::Upstream {
            code: code.into(),
            detail: detail.into(),
        }
    }

    /// Upstream error produced when a call exceeds its time bound.
    pub fn timed_out(operation: &str, secs: u64) -> Self {
        RemoteError::upstream("Timeout", format!("{operation} timed out after {secs}s"))
    }

    /// Short machine-readable code, suitable for log fields.
    pub fn code(&self) -> &str {
        match self {
            RemoteError::NotFound(_) => "NotFound",
            RemoteError::PermissionDenied { code, .. } => code,
            RemoteError::Conflict(_) => "Conflict",
            RemoteError::Upstream { code, .. } => code,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::Conflict(_))
    }
}

/// Result type for remote calls
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
