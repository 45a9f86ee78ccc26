//! Error category classification for unified error handling.
//!
//! The admin layer shows a different page for each category: a transient
//! outage, a rejected request and a tier restriction call for different
//! remediation.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// No usable response was obtained from the cloud platform.
    Unreachable,

    /// The platform answered and refused the request.
    RemoteRejected,

    /// The credential is valid but the account tier does not permit it.
    PolicyRejected,

    /// Invalid input or missing local setup (no credential bound yet).
    User,

    /// The local settings store failed.
    Storage,
}

impl ErrorCategory {
    /// Returns true if the same request may succeed later without changes.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCategory::Unreachable)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Unreachable => "unreachable",
            ErrorCategory::RemoteRejected => "rejected",
            ErrorCategory::PolicyRejected => "policy",
            ErrorCategory::User => "user",
            ErrorCategory::Storage => "storage",
        }
    }

    /// Returns a user-friendly description of the category.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Unreachable => "Cloud service temporarily unreachable",
            ErrorCategory::RemoteRejected => "Request rejected by the cloud platform",
            ErrorCategory::PolicyRejected => "Not authorized for this edition",
            ErrorCategory::User => "User action required",
            ErrorCategory::Storage => "Settings storage problem",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Unreachable => "Check the server's network connection and try again later",
            ErrorCategory::RemoteRejected => "Check the access key and secret key, or re-issue them",
            ErrorCategory::PolicyRejected => "Contact support to enable cloud services for this edition",
            ErrorCategory::User => "Please check your input and try again",
            ErrorCategory::Storage => "Check file permissions and available disk space",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
