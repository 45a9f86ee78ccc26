//! Search-indexing job lifecycle.
//!
//! ```text
//! closed --submit(accepted)--> waiting --callback--> ok
//!    ^                                                |
//!    +-------------------- close ---------------------+
//! ```
//!
//! A callback that arrives while `closed` is ignored so a replayed callback
//! cannot revive a job the admin has closed.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::cloud::{AccountProfile, CallbackSigner, SearchSubmission, ServiceOverview, SignedClient};
use crate::error::{CloudError, CloudResult};
use crate::settings::{IndexingState, SearchSetting, Settings, SiteSetting};

const SUBMIT_PATH: &str = "/search/accounts";

/// Outcome of a submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Accepted by the platform; the job is now waiting.
    Accepted,
    /// Refused; state stays closed.
    Rejected { message: String },
    /// A job is already running or finished; nothing was sent.
    AlreadyActive { state: IndexingState },
}

/// Whether this site can use cloud search at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// The platform could not be reached.
    Unlink,
    /// Reachable, but the account has no level or no core service.
    Unconnect,
    Ready,
}

pub struct IndexingStateMachine {
    client: SignedClient,
    settings: Settings,
    signer: CallbackSigner,
    callback_path: String,
}

impl IndexingStateMachine {
    pub fn new(
        client: SignedClient,
        settings: Settings,
        signer: CallbackSigner,
        callback_path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            settings,
            signer,
            callback_path: callback_path.into(),
        }
    }

    /// Current job state, initialising the category on first use.
    pub async fn status(&self) -> CloudResult<SearchSetting> {
        if let Some(setting) = self.settings.load_existing::<SearchSetting>().await? {
            return Ok(setting);
        }
        let setting = SearchSetting::default();
        self.settings.save(&setting).await?;
        Ok(setting)
    }

    /// Submit the site's resource feeds for indexing.
    ///
    /// `site_url` overrides the stored site URL.
    pub async fn submit(&self, site_url: Option<&str>) -> CloudResult<SubmitOutcome> {
        let current = self.status().await?;
        if current.status != IndexingState::Closed {
            debug!(state = %current.status, "indexing job already active");
            return Ok(SubmitOutcome::AlreadyActive {
                state: current.status,
            });
        }

        let site = match site_url {
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => self
                .settings
                .load::<SiteSetting>()
                .await?
                .base_url()
                .unwrap_or_default(),
        };
        if site.is_empty() {
            return Err(CloudError::invalid_input("url", "The site URL is not configured"));
        }

        let access_key = self.client.access_key()?;
        let callback = self
            .signer
            .signed_callback_url(&format!("{}{}", site, self.callback_path), access_key);

        self.submit_job(&feed_urls(&site), &callback).await
    }

    /// Post a job for explicit feed URLs and an already signed callback.
    ///
    /// Only an accepted submission moves `closed` to `waiting`.
    pub async fn submit_job(&self, urls: &[Value], callback: &str) -> CloudResult<SubmitOutcome> {
        let mut setting = self.status().await?;
        if setting.status != IndexingState::Closed {
            return Ok(SubmitOutcome::AlreadyActive {
                state: setting.status,
            });
        }

        let encoded: String =
            form_urlencoded::byte_serialize(Value::Array(urls.to_vec()).to_string().as_bytes())
                .collect();
        let mut params = Map::new();
        params.insert("urls".to_string(), Value::String(encoded));
        params.insert("callback".to_string(), Value::String(callback.to_string()));

        match SearchSubmission::from_payload(&self.client.post(SUBMIT_PATH, Some(&params)).await?) {
            SearchSubmission::Accepted => {
                setting.search_enabled = true;
                setting.status = IndexingState::Waiting;
                self.settings.save(&setting).await?;
                info!(feeds = urls.len(), "search indexing submitted");
                Ok(SubmitOutcome::Accepted)
            }
            SearchSubmission::Failed { message } => {
                warn!(%message, "search indexing submission refused");
                Ok(SubmitOutcome::Rejected { message })
            }
        }
    }

    /// Mark the job done. Only `waiting` moves; every other state is kept.
    pub async fn on_callback_confirmed(&self) -> CloudResult<IndexingState> {
        let mut setting = self.status().await?;
        if setting.status != IndexingState::Waiting {
            debug!(state = %setting.status, "ignoring indexing callback");
            return Ok(setting.status);
        }
        setting.status = IndexingState::Ok;
        self.settings.save(&setting).await?;
        info!("search indexing completed");
        Ok(setting.status)
    }

    /// Verify a signed callback URL, then confirm.
    pub async fn accept_callback(&self, signed_url: &str) -> CloudResult<IndexingState> {
        let access_key = self.client.access_key()?;
        if !self.signer.verify_callback_url(signed_url, access_key) {
            warn!("indexing callback signature mismatch");
            return Err(CloudError::invalid_input("sign", "Callback signature is invalid"));
        }
        self.on_callback_confirmed().await
    }

    /// Reset to `closed` from any state.
    pub async fn close(&self) -> CloudResult<SearchSetting> {
        let mut setting: SearchSetting = self.settings.load().await?;
        setting.search_enabled = false;
        setting.status = IndexingState::Closed;
        self.settings.save(&setting).await?;
        info!("search indexing closed");
        Ok(setting)
    }

    /// Check that the account can use cloud search.
    ///
    /// Transport trouble reads as `Unlink`; storage and credential errors
    /// propagate.
    pub async fn connection_status(&self) -> CloudResult<ConnectionStatus> {
        let access_key = self.client.access_key()?;
        let overview_path = format!("/users/{}/overview", urlencoding::encode(access_key));

        let fetched = async {
            let overview = self.client.get(&overview_path, None).await?;
            let me = self.client.get("/me", None).await?;
            Ok::<_, CloudError>((
                ServiceOverview::from_payload(&overview),
                AccountProfile::from_payload(&me),
            ))
        }
        .await;

        let (overview, profile) = match fetched {
            Ok(pair) => pair,
            Err(err) if err.is_unreachable() => {
                warn!(error = %err, "search connection check failed");
                return Ok(ConnectionStatus::Unlink);
            }
            Err(err) => return Err(err),
        };

        if !profile.has_level() || !overview.has_core_service() {
            return Ok(ConnectionStatus::Unconnect);
        }
        Ok(ConnectionStatus::Ready)
    }
}

/// Resource feeds the indexer crawls, rooted at `site`.
fn feed_urls(site: &str) -> Vec<Value> {
    let paged = "cursor=0&start=0&limit=100";
    vec![
        json!({"category": "course", "url": format!("{}/api/courses?{}", site, paged)}),
        json!({"category": "lesson", "url": format!("{}/api/lessons?{}", site, paged)}),
        json!({"category": "user", "url": format!("{}/api/users?{}", site, paged)}),
        json!({
            "category": "thread",
            "url": format!("{}/api/chaos_threads?cursor=0,0,0&start=0,0,0&limit=50", site)
        }),
        json!({"category": "article", "url": format!("{}/api/articles?{}", site, paged)}),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_urls() {
        let feeds = feed_urls("http://school.test");
        let categories: Vec<&str> = feeds
            .iter()
            .filter_map(|f| f["category"].as_str())
            .collect();
        assert_eq!(categories, vec!["course", "lesson", "user", "thread", "article"]);
        assert_eq!(
            feeds[3]["url"],
            "http://school.test/api/chaos_threads?cursor=0,0,0&start=0,0,0&limit=50"
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(SubmitOutcome::AlreadyActive {
            state: IndexingState::Waiting,
        })
        .unwrap();
        assert_eq!(json["result"], "already_active");
        assert_eq!(json["state"], "waiting");
        assert_eq!(
            serde_json::to_value(ConnectionStatus::Unconnect).unwrap(),
            "unconnect"
        );
    }
}
