//! Service status values shared by the messaging and email integrations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalised status of a cloud service account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceState {
    Disable,
    Enable,
    Waiting,
    Error,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Disable => "disable",
            ServiceState::Enable => "enable",
            ServiceState::Waiting => "waiting",
            ServiceState::Error => "error",
        }
    }

    /// Map a status string reported by the platform.
    ///
    /// Unrecognised values map to `Error` so an unknown state is never shown
    /// as healthy.
    pub fn from_remote(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "enable" | "enabled" | "used" | "passed" | "ok" => ServiceState::Enable,
            "disable" | "disabled" | "stop" | "stopped" => ServiceState::Disable,
            "waiting" | "checking" | "applying" | "auditing" | "pending" => ServiceState::Waiting,
            _ => ServiceState::Error,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ServiceState {
    fn from(value: String) -> Self {
        Self::from_remote(&value)
    }
}

impl From<ServiceState> for String {
    fn from(value: ServiceState) -> Self {
        value.as_str().to_string()
    }
}

/// Local view of a messaging or email service.
///
/// Always produced whole by a reconciler; callers never see a status with
/// some fields fresh and others stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub enabled: bool,
    pub status: ServiceState,
    pub signature_name: String,
    pub last_error: Option<String>,
}

impl ServiceStatus {
    pub fn new(enabled: bool, status: ServiceState, signature_name: impl Into<String>) -> Self {
        Self {
            enabled,
            status,
            signature_name: signature_name.into(),
            last_error: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.status = ServiceState::Error;
        self.last_error = Some(message.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == ServiceState::Error
    }
}

/// Lifecycle of the remote search-indexing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IndexingState {
    #[default]
    Closed,
    Waiting,
    Ok,
}

impl IndexingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexingState::Closed => "closed",
            IndexingState::Waiting => "waiting",
            IndexingState::Ok => "ok",
        }
    }
}

impl fmt::Display for IndexingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for IndexingState {
    fn from(value: String) -> Self {
        match value.trim() {
            "waiting" => IndexingState::Waiting,
            "ok" => IndexingState::Ok,
            _ => IndexingState::Closed,
        }
    }
}

impl From<IndexingState> for String {
    fn from(value: IndexingState) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_mapping() {
        assert_eq!(ServiceState::from_remote("enable"), ServiceState::Enable);
        assert_eq!(ServiceState::from_remote("used"), ServiceState::Enable);
        assert_eq!(ServiceState::from_remote("Disabled"), ServiceState::Disable);
        assert_eq!(ServiceState::from_remote("checking"), ServiceState::Waiting);
        assert_eq!(ServiceState::from_remote("error"), ServiceState::Error);
        assert_eq!(ServiceState::from_remote("mystery"), ServiceState::Error);
    }

    #[test]
    fn test_service_state_serde() {
        let json = serde_json::to_string(&ServiceState::Waiting).unwrap();
        assert_eq!(json, "\"waiting\"");
        let state: ServiceState = serde_json::from_str("\"enable\"").unwrap();
        assert_eq!(state, ServiceState::Enable);
    }

    #[test]
    fn test_with_error() {
        let status = ServiceStatus::new(true, ServiceState::Enable, "School").with_error("boom");
        assert!(status.is_error());
        assert!(status.enabled);
        assert_eq!(status.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_indexing_state_unknown_is_closed() {
        assert_eq!(IndexingState::from("bogus".to_string()), IndexingState::Closed);
        assert_eq!(IndexingState::from("ok".to_string()), IndexingState::Ok);
        assert_eq!(IndexingState::default(), IndexingState::Closed);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let value = serde_json::to_value(ServiceStatus::new(false, ServiceState::Disable, "")).unwrap();
        assert_eq!(value["signatureName"], "");
        assert_eq!(value["status"], "disable");
        assert!(value["lastError"].is_null());
    }
}
