//! Messaging (SMS) account reconciliation.
//!
//! Keeps the `cloud_sms` category consistent with the platform's SMS
//! account: creates the account on first open, renames it, recreates it when
//! the platform has lost it, and folds the remote status into local state.
//!
//! Every public operation loads the category once, performs its remote
//! calls in sequence and writes the category at most once.

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::cloud::{ApplicationStatus, Mutation, SignedClient, SmsAccountView};
use crate::error::{CloudError, CloudResult};
use crate::settings::serde_ext::truthy;
use crate::settings::{ServiceState, ServiceStatus, Settings, SmsNotification, SmsSetting};

const ACCOUNT_PATH: &str = "/me/sms_account";
const CREATE_PATH: &str = "/sms_accounts";

/// Bounds on the display width of an SMS sender name.
const MIN_NAME_WIDTH: usize = 2;
const MAX_NAME_WIDTH: usize = 16;

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagingIntent {
    Open { name: Option<String> },
    Close,
    SetSignature { name: String },
    Configure { switches: Vec<(SmsNotification, bool)> },
    Refresh,
}

impl MessagingIntent {
    /// Read an intent from admin form fields.
    ///
    /// Precedence: `sms-open`, `sms-close`, `sign`, notification switches,
    /// then a plain refresh.
    pub fn from_form(form: &Map<String, Value>) -> Self {
        let text = |key: &str| form.get(key).and_then(Value::as_str).map(str::to_string);

        if form.contains_key("sms-open") {
            return MessagingIntent::Open { name: text("sign") };
        }
        if form.contains_key("sms-close") {
            return MessagingIntent::Close;
        }
        if form.contains_key("sign") {
            return MessagingIntent::SetSignature {
                name: text("sign").unwrap_or_default(),
            };
        }

        let switches: Vec<(SmsNotification, bool)> = form
            .iter()
            .filter_map(|(key, value)| {
                let notification = SmsNotification::from_name(key)?;
                Some((notification, truthy(value)))
            })
            .collect();
        if switches.is_empty() {
            MessagingIntent::Refresh
        } else {
            MessagingIntent::Configure { switches }
        }
    }
}

/// Result of a rename.
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureUpdate {
    /// Accepted by the platform and persisted.
    Applied(ServiceStatus),
    /// Refused; local state was not touched.
    Rejected {
        current: ServiceStatus,
        message: String,
    },
}

pub struct MessagingReconciler {
    client: SignedClient,
    settings: Settings,
}

impl MessagingReconciler {
    pub fn new(client: SignedClient, settings: Settings) -> Self {
        Self { client, settings }
    }

    /// Dispatch an intent.
    pub async fn reconcile(&self, intent: MessagingIntent) -> CloudResult<ServiceStatus> {
        match intent {
            MessagingIntent::Open { name } => self.open(name.as_deref()).await,
            MessagingIntent::Close => self.close().await,
            MessagingIntent::SetSignature { name } => match self.set_signature(&name).await? {
                SignatureUpdate::Applied(status) => Ok(status),
                SignatureUpdate::Rejected { current, message } => Ok(ServiceStatus {
                    last_error: Some(message),
                    ..current
                }),
            },
            MessagingIntent::Configure { switches } => self.configure(&switches).await,
            MessagingIntent::Refresh => self.refresh().await,
        }
    }

    /// Enable messaging.
    ///
    /// With a school name already stored this only re-derives status from
    /// the platform (recreating a lost account). Otherwise the account is
    /// created under `name`.
    pub async fn open(&self, name: Option<&str>) -> CloudResult<ServiceStatus> {
        let mut setting: SmsSetting = self.settings.load().await?;

        if let Some(existing) = setting.sms_school_name.clone() {
            debug!(name = %existing, "messaging already named; refreshing");
            let view = self.fetch_healing(Some(&existing)).await?;
            let enabled = enabled_after(&view, true, setting.sms_enabled);
            let status = status_from_view(&view, enabled, &existing);
            return self.persist(&mut setting, status).await;
        }

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CloudError::invalid_input("sign", "A school name is required to enable SMS"))?
            .to_string();

        let created = Mutation::from_sms(&self.client.post(CREATE_PATH, Some(&name_params(&name))).await?);
        let status = if created.is_ok() {
            info!(name = %name, "messaging account created");
            let view = SmsAccountView::from_payload(&self.client.get(ACCOUNT_PATH, None).await?);
            status_from_view(&view, true, &name)
        } else {
            let message = created.failure_message().unwrap_or_default();
            warn!(name = %name, %message, "messaging account creation failed");
            ServiceStatus::new(false, ServiceState::Error, "").with_error(message)
        };

        self.persist(&mut setting, status).await
    }

    /// Disable messaging locally.
    ///
    /// The platform is asked for the current status, but the local switch
    /// goes off even when it cannot be reached.
    pub async fn close(&self) -> CloudResult<ServiceStatus> {
        let mut setting: SmsSetting = self.settings.load().await?;
        let current = setting.service_status();

        let status = match self.client.get(ACCOUNT_PATH, None).await {
            Ok(payload) => match SmsAccountView::from_payload(&payload) {
                SmsAccountView::Missing => {
                    ServiceStatus::new(false, ServiceState::Disable, current.signature_name.clone())
                }
                view => status_from_view(&view, false, &current.signature_name),
            },
            Err(err) => {
                warn!(error = %err, "closing messaging without remote status");
                ServiceStatus {
                    enabled: false,
                    last_error: Some(err.user_message()),
                    ..current
                }
            }
        };

        self.persist(&mut setting, status).await
    }

    /// Rename the sender. An empty name re-submits the stored one.
    pub async fn set_signature(&self, name: &str) -> CloudResult<SignatureUpdate> {
        let mut setting: SmsSetting = self.settings.load().await?;
        let current = setting.service_status();

        let name = match name.trim() {
            "" => setting
                .sms_school_name
                .clone()
                .ok_or_else(|| CloudError::invalid_input("sign", "Signature must not be empty"))?,
            trimmed => trimmed.to_string(),
        };

        let update = Mutation::from_sms(&self.client.post(ACCOUNT_PATH, Some(&name_params(&name))).await?);
        if let Some(message) = update.failure_message() {
            warn!(name = %name, %message, "messaging rename rejected");
            return Ok(SignatureUpdate::Rejected { current, message });
        }

        let view = SmsAccountView::from_payload(&self.client.get(ACCOUNT_PATH, None).await?);
        let status = status_from_view(&view, true, &name);
        let status = self.persist(&mut setting, status).await?;
        Ok(SignatureUpdate::Applied(status))
    }

    /// Re-derive status from the platform.
    ///
    /// When messaging is enabled and the platform reports the account
    /// missing, it is recreated under the stored name.
    pub async fn refresh(&self) -> CloudResult<ServiceStatus> {
        let mut setting: SmsSetting = self.settings.load().await?;
        let status = self.derive_status(&setting).await?;
        self.persist(&mut setting, status).await
    }

    /// Apply notification switches, then refresh.
    ///
    /// The four buy-notify switches always follow `order_pay_success`.
    pub async fn configure(&self, switches: &[(SmsNotification, bool)]) -> CloudResult<ServiceStatus> {
        let mut setting: SmsSetting = self.settings.load().await?;

        for (notification, on) in switches {
            setting.set_notification(*notification, *on);
        }
        let order_paid = setting.notification(SmsNotification::OrderPaySuccess);
        for notification in SmsNotification::BUY_NOTIFY {
            setting.set_notification(notification, order_paid);
        }

        let status = self.derive_status(&setting).await?;
        self.persist(&mut setting, status).await
    }

    /// Apply for a new sender name. Review happens on the platform side.
    pub async fn apply(&self, name: &str) -> CloudResult<()> {
        let name = name.trim();
        let width = display_width(name);
        if !(MIN_NAME_WIDTH..=MAX_NAME_WIDTH).contains(&width) {
            return Err(CloudError::invalid_input(
                "name",
                format!(
                    "Name must be {} to {} characters wide (got {})",
                    MIN_NAME_WIDTH, MAX_NAME_WIDTH, width
                ),
            ));
        }

        let endpoint = format!("/sms/{}/apply", urlencoding::encode(self.client.access_key()?));
        let result = Mutation::from_sms(&self.client.post(&endpoint, Some(&name_params(name))).await?);
        if let Some(message) = result.failure_message() {
            return Err(CloudError::RemoteRejected { endpoint, message });
        }

        let mut setting: SmsSetting = self.settings.load().await?;
        setting.sms_school_candidate_name = Some(name.to_string());
        setting.show_message = true;
        self.settings.save(&setting).await?;
        info!(name, "sender name application submitted");
        Ok(())
    }

    /// Review state of the last sender application, if any.
    pub async fn application_status(&self) -> CloudResult<Option<ApplicationStatus>> {
        let endpoint = format!(
            "/sms/{}/applyResult",
            urlencoding::encode(self.client.access_key()?)
        );
        let payload = self.client.post(&endpoint, None).await?;
        Ok(ApplicationStatus::from_payload(&payload))
    }

    /// Hide the application notice.
    pub async fn dismiss_notice(&self) -> CloudResult<()> {
        let mut setting: SmsSetting = self.settings.load().await?;
        setting.show_message = false;
        self.settings.save(&setting).await
    }

    async fn derive_status(&self, setting: &SmsSetting) -> CloudResult<ServiceStatus> {
        let fallback = setting.sms_school_name.clone().unwrap_or_default();

        let view = if setting.sms_enabled {
            self.fetch_healing(setting.sms_school_name.as_deref()).await?
        } else {
            SmsAccountView::from_payload(&self.client.get(ACCOUNT_PATH, None).await?)
        };

        if !setting.sms_enabled && view == SmsAccountView::Missing {
            return Ok(ServiceStatus::new(false, ServiceState::Disable, fallback));
        }

        let enabled = enabled_after(&view, setting.sms_enabled, setting.sms_enabled);
        Ok(status_from_view(&view, enabled, &fallback))
    }

    /// Fetch the account, recreating it once if the platform lost it.
    async fn fetch_healing(&self, name: Option<&str>) -> CloudResult<SmsAccountView> {
        let view = SmsAccountView::from_payload(&self.client.get(ACCOUNT_PATH, None).await?);
        if view != SmsAccountView::Missing {
            return Ok(view);
        }
        let Some(name) = name else {
            return Ok(view);
        };

        info!(name, "messaging account missing on platform; recreating");
        let created = Mutation::from_sms(&self.client.post(CREATE_PATH, Some(&name_params(name))).await?);
        if let Some(message) = created.failure_message() {
            warn!(name, %message, "messaging account recreation failed");
            return Ok(SmsAccountView::Rejected { message });
        }

        Ok(SmsAccountView::from_payload(&self.client.get(ACCOUNT_PATH, None).await?))
    }

    async fn persist(&self, setting: &mut SmsSetting, status: ServiceStatus) -> CloudResult<ServiceStatus> {
        setting.apply_status(&status);
        self.settings.save(setting).await?;
        debug!(enabled = status.enabled, status = %status.status, "messaging status saved");
        Ok(status)
    }
}

fn name_params(name: &str) -> Map<String, Value> {
    match json!({ "name": name }) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Local switch after a fetch. Rejections keep the stored switch; only a
/// confirmed account turns it on.
fn enabled_after(view: &SmsAccountView, wanted: bool, stored: bool) -> bool {
    match view {
        SmsAccountView::Account { .. } => wanted,
        SmsAccountView::Rejected { .. } => stored,
        SmsAccountView::Missing => false,
    }
}

/// Fold a remote account view into a complete status.
fn status_from_view(view: &SmsAccountView, enabled: bool, fallback_name: &str) -> ServiceStatus {
    match view {
        SmsAccountView::Account { status, name } => ServiceStatus::new(
            enabled,
            status
                .as_deref()
                .map(ServiceState::from_remote)
                .unwrap_or(ServiceState::Error),
            name.clone().unwrap_or_else(|| fallback_name.to_string()),
        ),
        SmsAccountView::Rejected { message } => {
            ServiceStatus::new(enabled, ServiceState::Error, fallback_name).with_error(message.clone())
        }
        SmsAccountView::Missing => ServiceStatus::new(enabled, ServiceState::Error, fallback_name)
            .with_error("SMS account does not exist"),
    }
}

/// Width of a sender name: one per ASCII byte, two per CJK character.
fn display_width(name: &str) -> usize {
    (name.len() + name.chars().count()) / 2
}
