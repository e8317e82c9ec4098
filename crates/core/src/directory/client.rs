//! Institutional identity directory client.
//!
//! Resolves an email address to the organization's own identifier. The
//! directory is authoritative but flaky about response shape, so anything
//! other than a usable identifier is reported as `None` rather than an error.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info, instrument, warn};

use crate::config::DirectoryConfig;
use crate::errors::DirectoryError;

/// Asynchronous client for the email resolution endpoint.
#[derive(Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    url: String,
}

impl DirectoryClient {
    /// Build a client from a resolved [`DirectoryConfig`].
    ///
    /// The API key is sent verbatim as the `Authorization` header on every
    /// request.
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or(DirectoryError::MissingCredential("directory.api_key"))?;
        let mut auth = HeaderValue::from_str(api_key).map_err(|_| DirectoryError::InvalidApiKey)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        if config.accept_invalid_certs {
            warn!(url = %config.url, "TLS certificate verification disabled for directory");
        }
        info!(url = %config.url, "created DirectoryClient");
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    /// Resolve `email` to an institutional identifier.
    ///
    /// Non-2xx responses and empty bodies are logged and yield `None`.
    /// Transport failures are returned as errors.
    #[instrument(skip(self))]
    pub async fn resolve_email(&self, email: &str) -> Result<Option<String>, DirectoryError> {
        let resp = self
            .http
            .get(&self.url)
            .query(&[("email", email)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(email, status = %status, body = %body, "directory lookup failed");
            return Ok(None);
        }

        let body = resp.text().await?;
        let id = parse_institutional_id(&body);
        if id.is_none() {
            warn!(email, "directory returned no identifier");
        } else {
            debug!(email, "directory resolved email");
        }
        Ok(id)
    }
}

/// Extract the identifier from a directory response body.
///
/// Accepts a JSON string, a JSON object with a `upn` string field, or a bare
/// non-JSON token. `null`, empty bodies and other JSON shapes yield `None`.
pub fn parse_institutional_id(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let id = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Object(map)) => match map.get("upn") {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => return None,
        },
        Ok(_) => return None,
        Err(_) => trimmed.to_string(),
    };
    let id = id.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_string() {
        assert_eq!(parse_institutional_id(r#""WATIAM1""#), Some("WATIAM1".into()));
    }

    #[test]
    fn test_parse_object_upn() {
        assert_eq!(
            parse_institutional_id(r#"{"upn":"jdoe","email":"a@b.com"}"#),
            Some("jdoe".into())
        );
        assert_eq!(parse_institutional_id(r#"{"email":"a@b.com"}"#), None);
    }

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(parse_institutional_id("jdoe\n"), Some("jdoe".into()));
    }

    #[test]
    fn test_parse_empty_and_null() {
        assert_eq!(parse_institutional_id(""), None);
        assert_eq!(parse_institutional_id("   "), None);
        assert_eq!(parse_institutional_id("null"), None);
        assert_eq!(parse_institutional_id(r#""""#), None);
        assert_eq!(parse_institutional_id("[]"), None);
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = DirectoryConfig::default();
        assert!(matches!(
            DirectoryClient::new(&config),
            Err(DirectoryError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_new_rejects_unprintable_key() {
        let config = DirectoryConfig {
            api_key: Some("bad\nkey".into()),
            ..DirectoryConfig::default()
        };
        assert!(matches!(
            DirectoryClient::new(&config),
            Err(DirectoryError::InvalidApiKey)
        ));
    }
}
