//! Audit log trait abstraction.
//!
//! Business-level audit records (who changed which setting and why) are
//! kept apart from diagnostic tracing so the host can persist them in its
//! own log table.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Severity of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Warning,
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub level: AuditLevel,
    /// Owning module, e.g. `system`
    pub module: String,
    /// Action identifier, e.g. `update_settings`
    pub action: String,
    /// Human-readable message
    pub message: String,
    /// Structured payload. Callers must redact secrets before recording.
    pub data: Value,
}

impl AuditEntry {
    /// Create an info-level entry.
    pub fn info(
        module: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            level: AuditLevel::Info,
            module: module.into(),
            action: action.into(),
            message: message.into(),
            data,
        }
    }
}

/// Sink for audit records.
///
/// Recording is best-effort: a sink that cannot persist an entry reports it
/// through its own diagnostics instead of failing the reconciliation.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry);
}
