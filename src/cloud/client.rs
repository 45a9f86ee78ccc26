//! Signed client for the cloud platform API.
//!
//! Every request is authenticated with an [`AuthToken`] derived from the
//! held [`Credential`]. The client never retries; composing several calls
//! is the caller's job.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use super::auth_token::{AuthToken, AUTH_HEADER};
use super::credential::Credential;
use super::views::RemotePayload;
use crate::config::CloudConfig;
use crate::error::{CloudError, CloudResult, NetworkError};
use crate::traits::{Headers, HttpClient, Response};

/// HTTP verb of a platform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Client for the cloud platform.
#[derive(Clone)]
pub struct SignedClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    credential: Option<Credential>,
    auth_ttl_secs: i64,
}

impl SignedClient {
    /// Create a client without a credential.
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential: None,
            auth_ttl_secs: 600,
        }
    }

    /// Create a client from configuration.
    pub fn from_config(http: Arc<dyn HttpClient>, config: &CloudConfig) -> Self {
        Self::new(http, config.api_url.clone()).with_auth_ttl_secs(config.auth_ttl_secs)
    }

    /// Bind a credential.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_auth_ttl_secs(mut self, secs: i64) -> Self {
        self.auth_ttl_secs = secs;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Access key of the bound credential.
    pub fn access_key(&self) -> CloudResult<&str> {
        self.credential
            .as_ref()
            .map(Credential::access_key)
            .ok_or(CloudError::MissingCredential)
    }

    /// GET `path`, with `params` encoded into the query string.
    pub async fn get(&self, path: &str, params: Option<&Map<String, Value>>) -> CloudResult<RemotePayload> {
        self.call(Method::Get, path, params).await
    }

    /// POST `path`, with `params` sent as a JSON body.
    pub async fn post(&self, path: &str, params: Option<&Map<String, Value>>) -> CloudResult<RemotePayload> {
        self.call(Method::Post, path, params).await
    }

    /// Perform one signed call.
    ///
    /// A JSON object is returned as-is even when it carries an `error` key;
    /// callers inspect it. Transport failures and unreadable answers are
    /// errors.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        params: Option<&Map<String, Value>>,
    ) -> CloudResult<RemotePayload> {
        let credential = self.credential.as_ref().ok_or(CloudError::MissingCredential)?;

        let url = self.build_url(method, path, params)?;
        let body = match method {
            Method::Get => String::new(),
            Method::Post => params
                .map(|p| Value::Object(p.clone()).to_string())
                .unwrap_or_else(|| "{}".to_string()),
        };

        let uri = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let deadline = chrono::Utc::now().timestamp() + self.auth_ttl_secs;
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let token = AuthToken::issue(credential, method.as_str(), &uri, &body, deadline, &nonce)?;

        let mut headers = Headers::new();
        headers.insert(AUTH_HEADER.to_string(), token.header_value());
        headers.insert("Accept".to_string(), "application/json".to_string());
        if method == Method::Post {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }

        debug!(method = method.as_str(), endpoint = path, "cloud call");

        let result = match method {
            Method::Get => self.http.get(url.as_str(), &headers).await,
            Method::Post => self.http.post(url.as_str(), &body, &headers).await,
        };

        let response = result.map_err(|err| {
            warn!(method = method.as_str(), endpoint = path, error = %err, "cloud platform unreachable");
            CloudError::Unreachable(err)
        })?;

        classify_response(path, response)
    }

    fn build_url(
        &self,
        method: Method,
        path: &str,
        params: Option<&Map<String, Value>>,
    ) -> CloudResult<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|_| NetworkError::InvalidUrl { url: raw.clone() })?;

        if method == Method::Get {
            if let Some(params) = params.filter(|p| !p.is_empty()) {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in params {
                    pairs.append_pair(key, &query_value(value));
                }
            }
        }

        Ok(url)
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Turn a raw response into a payload.
///
/// - JSON object: `Ok`, whatever the status code
/// - empty JSON array: `Ok` with an empty payload
/// - anything else on a 5xx: `Unreachable`
/// - anything else: `InvalidResponse`
fn classify_response(endpoint: &str, response: Response) -> CloudResult<RemotePayload> {
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(Value::Object(map)) => Ok(RemotePayload::new(map)),
        Ok(Value::Array(items)) if items.is_empty() => Ok(RemotePayload::default()),
        Ok(other) => Err(CloudError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
        Err(_) if response.is_server_error() => {
            warn!(endpoint, status = response.status, "cloud platform server error");
            Err(CloudError::Unreachable(NetworkError::HttpStatus {
                status: response.status,
                message: body_snippet(&response),
            }))
        }
        Err(err) => Err(CloudError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: format!("{} (status {}): {}", err, response.status, body_snippet(&response)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn body_snippet(response: &Response) -> String {
    let text = String::from_utf8_lossy(&response.body);
    text.chars().take(200).collect()
}
