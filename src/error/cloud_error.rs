//! Unified error type for cloud operations.
//!
//! Business-level rejections inside a reconciliation are data, not errors:
//! reconcilers fold them into a `ServiceStatus`. `CloudError::RemoteRejected`
//! is only raised by operations whose whole purpose is the remote answer
//! (key verification, SMS sender application).

use std::fmt;

use super::category::ErrorCategory;
use super::network::NetworkError;
use crate::traits::SettingsError;

/// Unified error type for the cloud integration.
#[derive(Debug, Clone, PartialEq)]
pub enum CloudError {
    /// Transport failure; no response was obtained.
    Unreachable(NetworkError),

    /// A response arrived but was not a JSON object.
    InvalidResponse { endpoint: String, message: String },

    /// The platform answered with an `error` payload.
    RemoteRejected { endpoint: String, message: String },

    /// The credential is valid but the account edition is not permitted.
    PolicyRejected {
        edition: Option<String>,
        required: String,
    },

    /// No access key / secret key pair is bound.
    MissingCredential,

    /// Caller-supplied input failed validation before any remote call.
    InvalidInput { field: String, message: String },

    /// The settings store failed.
    Settings(SettingsError),
}

/// Type alias for Results using CloudError.
pub type CloudResult<T> = Result<T, CloudError>;

impl CloudError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CloudError::Unreachable(_) | CloudError::InvalidResponse { .. } => {
                ErrorCategory::Unreachable
            }
            CloudError::RemoteRejected { .. } => ErrorCategory::RemoteRejected,
            CloudError::PolicyRejected { .. } => ErrorCategory::PolicyRejected,
            CloudError::MissingCredential | CloudError::InvalidInput { .. } => ErrorCategory::User,
            CloudError::Settings(_) => ErrorCategory::Storage,
        }
    }

    /// True when the upstream should render its "service inaccessible" page.
    pub fn is_unreachable(&self) -> bool {
        self.category() == ErrorCategory::Unreachable
    }

    /// True when repeating the same call later may succeed.
    ///
    /// Nothing in the crate retries on its own; callers decide.
    pub fn is_retryable(&self) -> bool {
        match self {
            CloudError::Unreachable(err) => err.is_transient(),
            other => other.category().is_transient(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            CloudError::Unreachable(err) => err.user_message(),
            CloudError::InvalidResponse { .. } => {
                "The cloud platform returned an unreadable response. Please try again later."
                    .to_string()
            }
            CloudError::RemoteRejected { message, .. } => {
                format!("The cloud platform rejected the request: {}", message)
            }
            CloudError::PolicyRejected { .. } => {
                "This access key belongs to an edition that cannot be used with this installation."
                    .to_string()
            }
            CloudError::MissingCredential => {
                "No access key is bound yet. Please bind an access key first.".to_string()
            }
            CloudError::InvalidInput { message, .. } => message.clone(),
            CloudError::Settings(err) => format!("Could not access settings: {}", err),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            CloudError::Unreachable(err) => err.error_code(),
            CloudError::InvalidResponse { .. } => "E_CLOUD_INVALID",
            CloudError::RemoteRejected { .. } => "E_CLOUD_REJECTED",
            CloudError::PolicyRejected { .. } => "E_CLOUD_POLICY",
            CloudError::MissingCredential => "E_CLOUD_NO_KEY",
            CloudError::InvalidInput { .. } => "E_CLOUD_INPUT",
            CloudError::Settings(_) => "E_SETTINGS",
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }

    pub(crate) fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        CloudError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudError::Unreachable(err) => write!(f, "cloud platform unreachable: {}", err),
            CloudError::InvalidResponse { endpoint, message } => {
                write!(f, "invalid response from {}: {}", endpoint, message)
            }
            CloudError::RemoteRejected { endpoint, message } => {
                write!(f, "{} rejected: {}", endpoint, message)
            }
            CloudError::PolicyRejected { edition, required } => write!(
                f,
                "edition '{}' is not permitted (requires '{}')",
                edition.as_deref().unwrap_or("unknown"),
                required
            ),
            CloudError::MissingCredential => write!(f, "no cloud credential configured"),
            CloudError::InvalidInput { field, message } => {
                write!(f, "invalid {}: {}", field, message)
            }
            CloudError::Settings(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CloudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CloudError::Unreachable(err) => Some(err),
            CloudError::Settings(err) => Some(err),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic error conversion
// ============================================================================

impl From<NetworkError> for CloudError {
    fn from(err: NetworkError) -> Self {
        CloudError::Unreachable(err)
    }
}

impl From<SettingsError> for CloudError {
    fn from(err: SettingsError) -> Self {
        CloudError::Settings(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_category() {
        let err: CloudError = NetworkError::Timeout {
            operation: "GET /me".to_string(),
            duration_secs: 30,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Unreachable);
        assert!(err.is_unreachable());
        assert_eq!(err.error_code(), "E_NET_TIMEOUT");
    }

    #[test]
    fn test_invalid_response_is_treated_as_unreachable() {
        let err = CloudError::InvalidResponse {
            endpoint: "/me".to_string(),
            message: "not json".to_string(),
        };
        assert!(err.is_unreachable());
    }

    #[test]
    fn test_rejections_are_distinct() {
        let rejected = CloudError::RemoteRejected {
            endpoint: "/keys/ak/verification".to_string(),
            message: "bad key".to_string(),
        };
        let policy = CloudError::PolicyRejected {
            edition: Some("saas".to_string()),
            required: "opensource".to_string(),
        };
        assert_eq!(rejected.category(), ErrorCategory::RemoteRejected);
        assert_eq!(policy.category(), ErrorCategory::PolicyRejected);
        assert!(!rejected.is_unreachable());
        assert_ne!(rejected.recovery_hint(), policy.recovery_hint());
    }

    #[test]
    fn test_policy_display() {
        let err = CloudError::PolicyRejected {
            edition: None,
            required: "opensource".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("unknown"));
        assert!(display.contains("opensource"));
    }

    #[test]
    fn test_settings_error_conversion() {
        let err: CloudError = SettingsError::Io("disk full".to_string()).into();
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_user_errors() {
        assert_eq!(CloudError::MissingCredential.category(), ErrorCategory::User);
        let err = CloudError::invalid_input("name", "too short");
        assert_eq!(err.category(), ErrorCategory::User);
        assert_eq!(err.user_message(), "too short");
    }
}
