//! Audit log adapter emitting `tracing` events.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::traits::{AuditEntry, AuditLevel, AuditLog};

/// Writes audit entries as structured events on the `audit` target.
///
/// Route them to a dedicated sink with a filter such as
/// `EDUCLOUD_LOG=info,audit=info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLog;

impl TracingAuditLog {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, entry: AuditEntry) {
        let data = entry.data.to_string();
        match entry.level {
            AuditLevel::Info => info!(
                target: "audit",
                module = %entry.module,
                action = %entry.action,
                data = %data,
                "{}",
                entry.message
            ),
            AuditLevel::Warning => warn!(
                target: "audit",
                module = %entry.module,
                action = %entry.action,
                data = %data,
                "{}",
                entry.message
            ),
        }
    }
}
