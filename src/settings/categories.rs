//! Typed settings categories.
//!
//! Every category keeps the keys it does not know about in `rest`, so a
//! typed write never drops fields the host application put there.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::serde_ext::{flag, lenient_string, lenient_text, switch, truthy};
use super::status::{IndexingState, ServiceState, ServiceStatus};
use super::SettingCategory;
use crate::cloud::Credential;

// ============================================================================
// storage
// ============================================================================

/// Credential storage. Access key and secret key are written together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSetting {
    #[serde(with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub cloud_access_key: Option<String>,
    #[serde(with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub cloud_secret_key: Option<String>,
    #[serde(with = "flag")]
    pub cloud_key_applied: bool,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SettingCategory for StorageSetting {
    const KEY: &'static str = "storage";
}

impl StorageSetting {
    /// The stored credential, if both halves are present.
    pub fn credential(&self) -> Option<Credential> {
        match (&self.cloud_access_key, &self.cloud_secret_key) {
            (Some(ak), Some(sk)) => Credential::new(ak.as_str(), sk.as_str()).ok(),
            _ => None,
        }
    }

    /// Replace the credential and mark it applied.
    pub fn install(&mut self, credential: &Credential) {
        self.cloud_access_key = Some(credential.access_key().to_string());
        self.cloud_secret_key = Some(credential.secret_key().to_string());
        self.cloud_key_applied = true;
    }
}

// ============================================================================
// cloud_sms
// ============================================================================

/// Per-event SMS notification switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmsNotification {
    Registration,
    ForgetPassword,
    UserPay,
    ForgetPayPassword,
    Bind,
    ClassroomPublish,
    CoursePublish,
    NormalLessonPublish,
    LiveLessonPublish,
    LivePlayOneDay,
    LivePlayOneHour,
    HomeworkCheck,
    TestpaperCheck,
    OrderPaySuccess,
    CourseBuyNotify,
    ClassroomBuyNotify,
    VipBuyNotify,
    CoinBuyNotify,
}

impl SmsNotification {
    pub const ALL: [SmsNotification; 18] = [
        SmsNotification::Registration,
        SmsNotification::ForgetPassword,
        SmsNotification::UserPay,
        SmsNotification::ForgetPayPassword,
        SmsNotification::Bind,
        SmsNotification::ClassroomPublish,
        SmsNotification::CoursePublish,
        SmsNotification::NormalLessonPublish,
        SmsNotification::LiveLessonPublish,
        SmsNotification::LivePlayOneDay,
        SmsNotification::LivePlayOneHour,
        SmsNotification::HomeworkCheck,
        SmsNotification::TestpaperCheck,
        SmsNotification::OrderPaySuccess,
        SmsNotification::CourseBuyNotify,
        SmsNotification::ClassroomBuyNotify,
        SmsNotification::VipBuyNotify,
        SmsNotification::CoinBuyNotify,
    ];

    /// Switches that follow `OrderPaySuccess`.
    pub const BUY_NOTIFY: [SmsNotification; 4] = [
        SmsNotification::CourseBuyNotify,
        SmsNotification::ClassroomBuyNotify,
        SmsNotification::VipBuyNotify,
        SmsNotification::CoinBuyNotify,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SmsNotification::Registration => "registration",
            SmsNotification::ForgetPassword => "forget_password",
            SmsNotification::UserPay => "user_pay",
            SmsNotification::ForgetPayPassword => "forget_pay_password",
            SmsNotification::Bind => "bind",
            SmsNotification::ClassroomPublish => "classroom_publish",
            SmsNotification::CoursePublish => "course_publish",
            SmsNotification::NormalLessonPublish => "normal_lesson_publish",
            SmsNotification::LiveLessonPublish => "live_lesson_publish",
            SmsNotification::LivePlayOneDay => "live_play_one_day",
            SmsNotification::LivePlayOneHour => "live_play_one_hour",
            SmsNotification::HomeworkCheck => "homework_check",
            SmsNotification::TestpaperCheck => "testpaper_check",
            SmsNotification::OrderPaySuccess => "order_pay_success",
            SmsNotification::CourseBuyNotify => "course_buy_notify",
            SmsNotification::ClassroomBuyNotify => "classroom_buy_notify",
            SmsNotification::VipBuyNotify => "vip_buy_notify",
            SmsNotification::CoinBuyNotify => "coin_buy_notify",
        }
    }

    /// Settings key, e.g. `sms_registration`.
    pub fn key(&self) -> String {
        format!("sms_{}", self.name())
    }

    /// Parse a name with or without the `sms_` prefix.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("sms_").unwrap_or(name);
        Self::ALL.into_iter().find(|n| n.name() == name)
    }
}

/// Messaging (SMS) service settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsSetting {
    #[serde(with = "flag")]
    pub sms_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceState>,
    #[serde(with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sms_school_name: Option<String>,
    #[serde(with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sms_school_candidate_name: Option<String>,
    #[serde(with = "switch")]
    pub show_message: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SettingCategory for SmsSetting {
    const KEY: &'static str = "cloud_sms";
}

impl SmsSetting {
    pub fn service_status(&self) -> ServiceStatus {
        ServiceStatus {
            enabled: self.sms_enabled,
            status: self.status.unwrap_or(ServiceState::Disable),
            signature_name: self.sms_school_name.clone().unwrap_or_default(),
            last_error: self.last_error.clone(),
        }
    }

    /// Replace the status fields as one unit.
    pub fn apply_status(&mut self, status: &ServiceStatus) {
        self.sms_enabled = status.enabled;
        self.status = Some(status.status);
        self.sms_school_name = if status.signature_name.is_empty() {
            None
        } else {
            Some(status.signature_name.clone())
        };
        self.last_error = status.last_error.clone();
    }

    pub fn notification(&self, notification: SmsNotification) -> bool {
        self.rest
            .get(&notification.key())
            .map(truthy)
            .unwrap_or(false)
    }

    pub fn set_notification(&mut self, notification: SmsNotification, on: bool) {
        let value = if on { "on" } else { "off" };
        self.rest
            .insert(notification.key(), Value::String(value.to_string()));
    }
}

// ============================================================================
// cloud_email / mailer
// ============================================================================

/// Transactional email service settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSetting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceState>,
    #[serde(with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
    #[serde(with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SettingCategory for EmailSetting {
    const KEY: &'static str = "cloud_email";
}

impl EmailSetting {
    pub fn service_status(&self) -> ServiceStatus {
        let status = self.status.unwrap_or(ServiceState::Disable);
        ServiceStatus {
            enabled: status == ServiceState::Enable,
            status,
            signature_name: self.sign.clone().unwrap_or_default(),
            last_error: self.msg.clone(),
        }
    }

    pub fn apply_status(&mut self, status: &ServiceStatus) {
        self.status = Some(status.status);
        self.sign = Some(status.signature_name.clone()).filter(|s| !s.is_empty());
        self.msg = status.last_error.clone();
    }
}

/// Third-party SMTP transport configured by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailerSetting {
    #[serde(with = "flag")]
    pub enabled: bool,
    #[serde(with = "lenient_text")]
    pub host: String,
    #[serde(with = "lenient_text")]
    pub port: String,
    #[serde(with = "lenient_text")]
    pub username: String,
    #[serde(with = "lenient_text")]
    pub password: String,
    #[serde(with = "lenient_text")]
    pub from: String,
    #[serde(with = "lenient_text")]
    pub name: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SettingCategory for MailerSetting {
    const KEY: &'static str = "mailer";
}

impl MailerSetting {
    /// Copy safe to log.
    pub fn redacted(&self) -> Self {
        Self {
            password: "******".to_string(),
            ..self.clone()
        }
    }
}

// ============================================================================
// cloud_search / site
// ============================================================================

/// Search indexing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSetting {
    #[serde(with = "flag")]
    pub search_enabled: bool,
    pub status: IndexingState,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SettingCategory for SearchSetting {
    const KEY: &'static str = "cloud_search";
}

/// Site identity, owned by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSetting {
    #[serde(with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SettingCategory for SiteSetting {
    const KEY: &'static str = "site";
}

impl SiteSetting {
    /// Site URL without surrounding whitespace or trailing slashes.
    pub fn base_url(&self) -> Option<String> {
        self.url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_storage_credential_requires_both_halves() {
        let mut storage = StorageSetting {
            cloud_access_key: Some("ak".to_string()),
            ..Default::default()
        };
        assert!(storage.credential().is_none());

        storage.install(&Credential::new("ak2", "sk2").unwrap());
        let credential = storage.credential().unwrap();
        assert_eq!(credential.access_key(), "ak2");
        assert!(storage.cloud_key_applied);
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = json!({
            "cloud_access_key": "ak",
            "cloud_secret_key": "sk",
            "cloud_key_applied": "1",
            "cloud_bucket": "videos"
        });
        let storage: StorageSetting = serde_json::from_value(raw).unwrap();
        assert!(storage.cloud_key_applied);
        assert_eq!(storage.rest["cloud_bucket"], "videos");

        let back = serde_json::to_value(&storage).unwrap();
        assert_eq!(back["cloud_bucket"], "videos");
        assert_eq!(back["cloud_key_applied"], 1);
    }

    #[test]
    fn test_sms_status_round_trip() {
        let mut sms = SmsSetting::default();
        let status = ServiceStatus::new(true, ServiceState::Enable, "School");
        sms.apply_status(&status);
        assert_eq!(sms.service_status(), status);

        let value = serde_json::to_value(&sms).unwrap();
        assert_eq!(value["sms_enabled"], 1);
        assert_eq!(value["status"], "enable");
        assert_eq!(value["sms_school_name"], "School");
        assert_eq!(value["show_message"], "off");
    }

    #[test]
    fn test_sms_notifications_live_in_rest() {
        let mut sms: SmsSetting =
            serde_json::from_value(json!({"sms_registration": "on", "sms_bind": "off"})).unwrap();
        assert!(sms.notification(SmsNotification::Registration));
        assert!(!sms.notification(SmsNotification::Bind));
        assert!(!sms.notification(SmsNotification::VipBuyNotify));

        sms.set_notification(SmsNotification::VipBuyNotify, true);
        assert_eq!(sms.rest["sms_vip_buy_notify"], "on");
    }

    #[test]
    fn test_notification_names() {
        assert_eq!(SmsNotification::ALL.len(), 18);
        assert_eq!(
            SmsNotification::from_name("sms_order_pay_success"),
            Some(SmsNotification::OrderPaySuccess)
        );
        assert_eq!(
            SmsNotification::from_name("homework_check"),
            Some(SmsNotification::HomeworkCheck)
        );
        assert_eq!(SmsNotification::from_name("sms_unknown"), None);
    }

    #[test]
    fn test_email_enabled_follows_status() {
        let email: EmailSetting =
            serde_json::from_value(json!({"status": "enable", "sign": "Academy"})).unwrap();
        let status = email.service_status();
        assert!(status.enabled);
        assert_eq!(status.signature_name, "Academy");
    }

    #[test]
    fn test_mailer_redaction() {
        let mailer: MailerSetting = serde_json::from_value(
            json!({"enabled": "1", "host": "smtp.test", "port": 465, "password": "hunter2"}),
        )
        .unwrap();
        assert!(mailer.enabled);
        assert_eq!(mailer.port, "465");
        let redacted = mailer.redacted();
        assert_eq!(redacted.password, "******");
        assert_eq!(redacted.host, "smtp.test");
        assert_eq!(mailer.password, "hunter2");
    }

    #[test]
    fn test_search_default_is_closed() {
        let search = SearchSetting::default();
        let value = serde_json::to_value(&search).unwrap();
        assert_eq!(value, json!({"search_enabled": 0, "status": "closed"}));
    }

    #[test]
    fn test_site_base_url() {
        let site = SiteSetting {
            url: Some(" http://school.test// ".to_string()),
            ..Default::default()
        };
        assert_eq!(site.base_url().as_deref(), Some("http://school.test"));
        assert_eq!(SiteSetting::default().base_url(), None);
    }
}
