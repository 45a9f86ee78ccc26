//! Transactional email account reconciliation.
//!
//! Same create-if-absent discipline as messaging, plus one coupling: once
//! the platform confirms cloud email is enabled, the host's own SMTP
//! transport is switched off so mail is not delivered twice.
//!
//! Error outcomes are returned to the caller but never written; the last
//! good `cloud_email` state stays in the store.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::cloud::{EmailAccountView, Mutation, SignedClient};
use crate::error::CloudResult;
use crate::settings::{
    EmailSetting, MailerSetting, ServiceState, ServiceStatus, Settings, SiteSetting,
};
use crate::traits::{AuditEntry, AuditLog};

const ACCOUNT_PATH: &str = "/me/email_account";
const CREATE_PATH: &str = "/email_accounts";

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailIntent {
    Open,
    SetSignature { sender: String },
    Close,
    Refresh,
}

impl EmailIntent {
    /// Read an intent from admin form fields.
    ///
    /// Precedence: `email-open`, `sign`, `email-close`, then refresh.
    pub fn from_form(form: &Map<String, Value>) -> Self {
        if form.contains_key("email-open") {
            EmailIntent::Open
        } else if let Some(sign) = form.get("sign") {
            EmailIntent::SetSignature {
                sender: sign.as_str().unwrap_or_default().to_string(),
            }
        } else if form.contains_key("email-close") {
            EmailIntent::Close
        } else {
            EmailIntent::Refresh
        }
    }
}

pub struct EmailReconciler {
    client: SignedClient,
    settings: Settings,
    audit: Arc<dyn AuditLog>,
    default_sender: String,
}

impl EmailReconciler {
    pub fn new(
        client: SignedClient,
        settings: Settings,
        audit: Arc<dyn AuditLog>,
        default_sender: impl Into<String>,
    ) -> Self {
        Self {
            client,
            settings,
            audit,
            default_sender: default_sender.into(),
        }
    }

    /// Dispatch an intent.
    pub async fn reconcile(&self, intent: EmailIntent) -> CloudResult<ServiceStatus> {
        match intent {
            EmailIntent::Open => self.open().await,
            EmailIntent::SetSignature { sender } => self.set_signature(&sender).await,
            EmailIntent::Close => self.close().await,
            EmailIntent::Refresh => self.refresh().await,
        }
    }

    /// Enable cloud email, creating the account if the platform has none.
    pub async fn open(&self) -> CloudResult<ServiceStatus> {
        let mut setting: EmailSetting = self.settings.load().await?;
        let current = setting.service_status();

        let view = EmailAccountView::from_payload(&self.client.get(ACCOUNT_PATH, None).await?);
        let status = match view {
            EmailAccountView::Missing => {
                let site: SiteSetting = self.settings.load().await?;
                let sender = site.name.unwrap_or_else(|| self.default_sender.clone());
                let created = Mutation::from_email_create(
                    &self.client.post(CREATE_PATH, Some(&sender_params(&sender))).await?,
                );
                match created {
                    Mutation::Ok { nickname } => {
                        info!(sender = %sender, "email account created");
                        ServiceStatus::new(true, ServiceState::Enable, nickname.unwrap_or(sender))
                    }
                    other => current.clone().with_error(
                        other
                            .failure_message()
                            .unwrap_or_else(|| "email account could not be created".to_string()),
                    ),
                }
            }
            EmailAccountView::Rejected { message } => current.clone().with_error(message),
            EmailAccountView::Account { nickname, .. } => {
                let sign = setting.sign.clone().or(nickname).unwrap_or_default();
                ServiceStatus::new(true, ServiceState::Enable, sign)
            }
        };
        if status.is_error() {
            warn!(error = status.last_error.as_deref().unwrap_or(""), "enabling cloud email failed");
            return Ok(status);
        }

        let confirmed = EmailAccountView::from_payload(&self.client.get(ACCOUNT_PATH, None).await?);
        let status = match confirmed {
            EmailAccountView::Account { status: remote, nickname } => {
                let state = remote
                    .as_deref()
                    .map(ServiceState::from_remote)
                    .unwrap_or(ServiceState::Error);
                let sign = nickname.unwrap_or(status.signature_name);
                ServiceStatus::new(state == ServiceState::Enable, state, sign)
            }
            EmailAccountView::Rejected { message } => return Ok(status.with_error(message)),
            EmailAccountView::Missing => {
                return Ok(status.with_error("email account does not exist"))
            }
        };
        if status.is_error() {
            warn!("email account reported no usable status");
            return Ok(status.with_error("email account status unavailable"));
        }
        if status.status == ServiceState::Enable {
            self.disable_mailer().await?;
        }

        setting.apply_status(&status);
        self.settings.save(&setting).await?;
        Ok(status)
    }

    /// Change the sender name. An empty name changes nothing.
    pub async fn set_signature(&self, sender: &str) -> CloudResult<ServiceStatus> {
        let mut setting: EmailSetting = self.settings.load().await?;
        let current = setting.service_status();

        let sender = sender.trim();
        if sender.is_empty() {
            return Ok(current);
        }

        let update = Mutation::from_email_update(
            &self.client.post(ACCOUNT_PATH, Some(&sender_params(sender))).await?,
        );
        match update {
            Mutation::Ok { nickname } => {
                let status = ServiceStatus {
                    signature_name: nickname.unwrap_or_else(|| sender.to_string()),
                    last_error: None,
                    ..current
                };
                setting.apply_status(&status);
                self.settings.save(&setting).await?;
                Ok(status)
            }
            other => {
                let message = other.failure_message().unwrap_or_default();
                warn!(sender, %message, "email sender update rejected");
                Ok(current.with_error(message))
            }
        }
    }

    /// Disable cloud email locally. No remote call.
    pub async fn close(&self) -> CloudResult<ServiceStatus> {
        let mut setting: EmailSetting = self.settings.load().await?;
        let current = setting.service_status();
        let status = ServiceStatus::new(false, ServiceState::Disable, current.signature_name);
        setting.apply_status(&status);
        self.settings.save(&setting).await?;
        Ok(status)
    }

    /// Read the remote account without touching `cloud_email`.
    ///
    /// An account without a nickname reads as disabled. The mailer coupling
    /// still applies when the platform reports the account enabled.
    pub async fn refresh(&self) -> CloudResult<ServiceStatus> {
        let setting: EmailSetting = self.settings.load().await?;
        let stored_sign = setting.sign.clone().unwrap_or_default();

        let view = EmailAccountView::from_payload(&self.client.get(ACCOUNT_PATH, None).await?);
        let status = match view {
            EmailAccountView::Account {
                status,
                nickname: Some(nickname),
            } => {
                let state = status
                    .as_deref()
                    .map(ServiceState::from_remote)
                    .unwrap_or(ServiceState::Error);
                ServiceStatus::new(state == ServiceState::Enable, state, nickname)
            }
            EmailAccountView::Account { nickname: None, .. } | EmailAccountView::Missing => {
                ServiceStatus::new(false, ServiceState::Disable, stored_sign)
            }
            EmailAccountView::Rejected { message } => setting.service_status().with_error(message),
        };

        if status.status == ServiceState::Enable {
            self.disable_mailer().await?;
        }
        Ok(status)
    }

    /// Turn the host's SMTP transport off if it is on.
    ///
    /// Returns whether anything changed.
    async fn disable_mailer(&self) -> CloudResult<bool> {
        let mut mailer: MailerSetting = self.settings.load().await?;
        if !mailer.enabled {
            return Ok(false);
        }

        mailer.enabled = false;
        self.settings.save(&mailer).await?;

        let redacted = serde_json::to_value(mailer.redacted()).unwrap_or(Value::Null);
        info!("cloud email enabled; third-party mail server disabled");
        self.audit
            .record(AuditEntry::info(
                "system",
                "update_settings",
                "Cloud email enabled; third-party mail server disabled",
                redacted,
            ))
            .await;
        Ok(true)
    }
}

fn sender_params(sender: &str) -> Map<String, Value> {
    match json!({ "sender": sender }) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
