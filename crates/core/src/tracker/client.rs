//! Issue-tracker REST API client.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::TrackerConfig;
use crate::errors::TrackerError;

/// A user record from `GET /user` or `GET /user/search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerUser {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// An issue as returned by the search endpoint. Only the key is needed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueRef {
    pub key: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSearchResponse {
    #[serde(default)]
    pub issues: Vec<IssueRef>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Asynchronous issue-tracker REST API client using basic auth.
#[derive(Clone)]
pub struct TrackerClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    participants_field_name: String,
    participants_field_id: String,
    max_results: u32,
    first_party_account_type: String,
    notify_users: bool,
}

impl TrackerClient {
    /// Build a client from a resolved [`TrackerConfig`].
    pub fn new(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let username = config
            .username
            .clone()
            .ok_or(TrackerError::MissingCredential("tracker.username"))?;
        let password = config
            .password
            .clone()
            .ok_or(TrackerError::MissingCredential("tracker.password"))?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("acctremap/0.1"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        info!(base_url = %base_url, "created TrackerClient");
        Ok(Self {
            http,
            base_url,
            username,
            password,
            participants_field_name: config.participants_field_name.clone(),
            participants_field_id: config.participants_field_id.clone(),
            max_results: config.max_results,
            first_party_account_type: config.first_party_account_type.clone(),
            notify_users: config.notify_users,
        })
    }

    /// Look up the email address of an account.
    ///
    /// Returns `None` when the account is unknown (HTTP 404) or its profile
    /// hides the email.
    #[instrument(skip(self))]
    pub async fn get_user_email(&self, account_id: &str) -> Result<Option<String>, TrackerError> {
        let url = format!("{}/user", self.base_url);
        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("accountId", account_id)])
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!(account_id, "account not found");
            return Ok(None);
        }
        let resp = check_response(resp).await?;
        let user: TrackerUser = resp
            .json()
            .await
            .map_err(|e| TrackerError::ParseError(e.to_string()))?;
        let email = user.email_address.filter(|e| !e.is_empty());
        debug!(account_id, has_email = email.is_some(), "fetched user");
        Ok(email)
    }

    /// Search users by free-text query (an email address, here).
    #[instrument(skip(self))]
    pub async fn search_users(&self, query: &str) -> Result<Vec<TrackerUser>, TrackerError> {
        let url = format!("{}/user/search", self.base_url);
        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("query", query)])
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let users: Vec<TrackerUser> = resp
            .json()
            .await
            .map_err(|e| TrackerError::ParseError(e.to_string()))?;
        debug!(count = users.len(), "fetched user candidates");
        Ok(users)
    }

    /// Resolve an email to the account ID of its first-party account.
    #[instrument(skip(self))]
    pub async fn find_account_id_by_email(
        &self,
        email: &str,
    ) -> Result<Option<String>, TrackerError> {
        let users = self.search_users(email).await?;
        Ok(select_first_party(&users, &self.first_party_account_type).map(str::to_string))
    }

    /// Find issues whose participants field contains `account_id`.
    #[instrument(skip(self))]
    pub async fn find_participant_issues(
        &self,
        account_id: &str,
    ) -> Result<Vec<IssueRef>, TrackerError> {
        let url = format!("{}/search", self.base_url);
        let jql = participants_jql(&self.participants_field_name, account_id);
        let max_results = self.max_results.to_string();
        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("jql", jql.as_str()), ("maxResults", max_results.as_str())])
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let result: IssueSearchResponse = resp
            .json()
            .await
            .map_err(|e| TrackerError::ParseError(e.to_string()))?;
        if let Some(total) = result.total {
            if total > result.issues.len() as u64 {
                warn!(
                    account_id,
                    total,
                    returned = result.issues.len(),
                    "issue search truncated; rerun after this pass to pick up the rest"
                );
            }
        }
        debug!(count = result.issues.len(), "fetched participant issues");
        Ok(result.issues)
    }

    /// Swap `old_account_id` for `new_account_id` in an issue's participants
    /// field with a single update request.
    #[instrument(skip(self))]
    pub async fn replace_participant(
        &self,
        issue_key: &str,
        old_account_id: &str,
        new_account_id: &str,
    ) -> Result<(), TrackerError> {
        let url = format!("{}/issue/{}", self.base_url, issue_key);
        let body =
            participant_update_body(&self.participants_field_id, old_account_id, new_account_id);
        let notify = if self.notify_users { "true" } else { "false" };
        let resp = self
            .http
            .put(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("notifyUsers", notify)])
            .json(&body)
            .send()
            .await?;
        check_response(resp).await?;
        debug!(issue_key, "participants field updated");
        Ok(())
    }
}

/// Search query matching issues whose participants field holds `account_id`.
pub fn participants_jql(field_name: &str, account_id: &str) -> String {
    format!(
        "\"{}\" = \"{}\"",
        escape_jql(field_name),
        escape_jql(account_id)
    )
}

fn escape_jql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Update payload removing the old ID and adding the new one.
pub fn participant_update_body(
    field_id: &str,
    old_account_id: &str,
    new_account_id: &str,
) -> serde_json::Value {
    let mut update = serde_json::Map::new();
    update.insert(
        field_id.to_string(),
        serde_json::json!([
            { "remove": { "id": old_account_id } },
            { "add": { "id": new_account_id } },
        ]),
    );
    serde_json::json!({ "update": update })
}

/// First candidate with the given account type that carries an account ID.
pub fn select_first_party<'a>(users: &'a [TrackerUser], account_type: &str) -> Option<&'a str> {
    users
        .iter()
        .filter(|u| u.account_type.as_deref() == Some(account_type))
        .find_map(|u| u.account_id.as_deref())
}

async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TrackerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(TrackerError::AuthenticationFailed(format!("HTTP {}", status)));
    }
    let body = resp.text().await.unwrap_or_default();
    Err(TrackerError::ApiError {
        status: status.as_u16(),
        body,
    })
}
