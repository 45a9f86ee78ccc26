//! Typed projections of platform responses.
//!
//! The platform answers every call with a flat JSON map whose fields depend
//! on the endpoint and on whether the call was rejected. [`RemotePayload`]
//! wraps that map; the view types below validate it once, at the boundary,
//! so reconcilers match on variants instead of probing keys.
//!
//! Views are snapshots for one reconciliation and are never persisted.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::settings::serde_ext::{scalar_text, truthy};

/// Platform message returned when no SMS account exists yet.
pub const SMS_ACCOUNT_MISSING: &str = "不存在短信账号";

/// Platform code returned when no email account exists yet.
pub const EMAIL_ACCOUNT_MISSING_CODE: i64 = 101;

/// A successful platform answer. May still carry a business-level `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RemotePayload {
    map: Map<String, Value>,
}

impl RemotePayload {
    pub fn new(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Message of the `error` field, if the platform rejected the call.
    ///
    /// The field is either a string or an object with a `message`.
    pub fn error_message(&self) -> Option<String> {
        match self.map.get("error")? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => Some(
                obj.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| Value::Object(obj.clone()).to_string()),
            ),
            other => Some(other.to_string()),
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.error_message().is_some()
    }

    /// Numeric `code`, accepting both numbers and numeric strings.
    pub fn code(&self) -> Option<i64> {
        let code = self.map.get("code").or_else(|| {
            self.map
                .get("error")
                .and_then(Value::as_object)
                .and_then(|err| err.get("code"))
        })?;
        match code {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    /// A string field; numbers are rendered, empty strings count as absent.
    pub fn string(&self, key: &str) -> Option<String> {
        scalar_text(self.map.get(key)?)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.map.get(key).map(truthy)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.map
    }
}

impl From<Map<String, Value>> for RemotePayload {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}

// ============================================================================
// Account profile (GET /me)
// ============================================================================

/// The account bound to the current access key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub access_key: Option<String>,
    pub edition: Option<String>,
    pub level: Option<String>,
    pub access_cloud: bool,
    pub locked: bool,
    pub enabled: bool,
    pub license_domains: Vec<String>,
    pub license_domain_count: usize,
    pub copyright: bool,
    pub third_copyright: bool,
}

impl AccountProfile {
    pub fn from_payload(payload: &RemotePayload) -> Self {
        let license_domains: Vec<String> = payload
            .string("licenseDomains")
            .map(|domains| {
                domains
                    .split(';')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            access_key: payload.string("accessKey"),
            edition: payload.string("edition"),
            level: payload.string("level"),
            access_cloud: payload.flag("accessCloud").unwrap_or(false),
            locked: payload.flag("locked").unwrap_or(false),
            enabled: payload.flag("enabled").unwrap_or(true),
            license_domain_count: license_domains.len(),
            license_domains,
            copyright: payload.flag("copyright").unwrap_or(false),
            third_copyright: payload.flag("thirdCopyright").unwrap_or(false),
        }
    }

    pub fn has_access_key(&self) -> bool {
        self.access_key.is_some()
    }

    /// Whether the account has been placed on any cloud service level.
    pub fn has_level(&self) -> bool {
        self.level
            .as_deref()
            .map(|level| !matches!(level, "" | "0" | "none"))
            .unwrap_or(false)
    }
}

// ============================================================================
// Service accounts
// ============================================================================

/// GET /me/sms_account
#[derive(Debug, Clone, PartialEq)]
pub enum SmsAccountView {
    /// No SMS account exists for this key yet.
    Missing,
    Rejected { message: String },
    Account {
        status: Option<String>,
        name: Option<String>,
    },
}

impl SmsAccountView {
    pub fn from_payload(payload: &RemotePayload) -> Self {
        match payload.error_message() {
            Some(message) if is_missing_account_message(&message) => SmsAccountView::Missing,
            Some(message) => SmsAccountView::Rejected { message },
            None => SmsAccountView::Account {
                status: payload.string("status"),
                name: payload.string("name"),
            },
        }
    }
}

fn is_missing_account_message(message: &str) -> bool {
    if message.trim() == SMS_ACCOUNT_MISSING {
        return true;
    }
    let lower = message.to_lowercase();
    lower.contains("not found") || lower.contains("not exist")
}

/// GET /me/email_account
#[derive(Debug, Clone, PartialEq)]
pub enum EmailAccountView {
    /// Platform code 101: no email account exists for this key yet.
    Missing,
    Rejected { message: String },
    Account {
        status: Option<String>,
        nickname: Option<String>,
    },
}

impl EmailAccountView {
    pub fn from_payload(payload: &RemotePayload) -> Self {
        if payload.code() == Some(EMAIL_ACCOUNT_MISSING_CODE) {
            return EmailAccountView::Missing;
        }
        match payload.error_message() {
            Some(message) => EmailAccountView::Rejected { message },
            None => EmailAccountView::Account {
                status: payload.string("status"),
                nickname: payload.string("nickname"),
            },
        }
    }
}

/// Outcome of a create/update call on a service account.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Ok { nickname: Option<String> },
    Rejected { message: String },
    /// Neither a rejection nor the expected success marker.
    Unexpected { status: Option<String> },
}

impl Mutation {
    /// POST /sms_accounts, POST /me/sms_account, POST /sms/{ak}/apply
    pub fn from_sms(payload: &RemotePayload) -> Self {
        Self::classify(payload, |p| p.string("status").as_deref() == Some("ok"))
    }

    /// POST /email_accounts
    pub fn from_email_create(payload: &RemotePayload) -> Self {
        Self::classify(payload, |p| p.string("status").as_deref() == Some("enable"))
    }

    /// POST /me/email_account
    pub fn from_email_update(payload: &RemotePayload) -> Self {
        Self::classify(payload, |p| p.string("nickname").is_some())
    }

    fn classify(payload: &RemotePayload, accepted: impl Fn(&RemotePayload) -> bool) -> Self {
        if let Some(message) = payload.error_message() {
            Mutation::Rejected { message }
        } else if accepted(payload) {
            Mutation::Ok {
                nickname: payload.string("nickname"),
            }
        } else {
            Mutation::Unexpected {
                status: payload.string("status"),
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Mutation::Ok { .. })
    }

    /// Human-readable reason for a non-ok outcome.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Mutation::Ok { .. } => None,
            Mutation::Rejected { message } => Some(message.clone()),
            Mutation::Unexpected { status } => Some(format!(
                "unexpected status '{}'",
                status.as_deref().unwrap_or("none")
            )),
        }
    }
}

/// POST /sms/{ak}/applyResult
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationStatus {
    pub status: String,
    pub message: Option<String>,
}

impl ApplicationStatus {
    pub fn from_payload(payload: &RemotePayload) -> Option<Self> {
        if let Some(apply) = payload.get("apply").and_then(Value::as_object) {
            if let Some(status) = apply.get("status").and_then(scalar_text) {
                return Some(Self {
                    status,
                    message: apply.get("message").and_then(scalar_text),
                });
            }
        }
        payload.error_message().map(|message| Self {
            status: "error".to_string(),
            message: Some(message),
        })
    }
}

// ============================================================================
// Search indexing
// ============================================================================

/// POST /search/accounts
#[derive(Debug, Clone, PartialEq)]
pub enum SearchSubmission {
    Accepted,
    Failed { message: String },
}

impl SearchSubmission {
    pub fn from_payload(payload: &RemotePayload) -> Self {
        if payload.flag("success").unwrap_or(false) {
            return SearchSubmission::Accepted;
        }
        SearchSubmission::Failed {
            message: payload
                .error_message()
                .unwrap_or_else(|| "search submission was not accepted".to_string()),
        }
    }
}

/// GET /users/{ak}/overview
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceOverview {
    pub storage: bool,
    pub live: bool,
    pub sms: bool,
    pub email: bool,
}

impl ServiceOverview {
    pub fn from_payload(payload: &RemotePayload) -> Self {
        let service = payload.get("service").and_then(Value::as_object);
        let present = |name: &str| {
            service
                .and_then(|s| s.get(name))
                .map(|v| !v.is_null())
                .unwrap_or(false)
        };
        Self {
            storage: present("storage"),
            live: present("live"),
            sms: present("sms"),
            email: present("email"),
        }
    }

    /// Storage, live or SMS is provisioned. Email alone does not count.
    pub fn has_core_service(&self) -> bool {
        self.storage || self.live || self.sms
    }
}
