//! HTTP client for the local whoami identity service.

use crate::resolver::UsernameLookup;
use async_trait::async_trait;
use dirfill_common::error::LookupError;
use serde::Deserialize;
use std::time::Duration;

/// Default loopback endpoint of the identity service.
pub const DEFAULT_WHOAMI_URL: &str = "http://127.0.0.1:7777/whoami";

#[derive(Debug, Deserialize)]
pub struct WhoamiResponse {
    #[serde(default)]
    pub active_console_user: Option<ReportedUser>,
    #[serde(default)]
    pub process_user: Option<ReportedUser>,
}

#[derive(Debug, Deserialize)]
pub struct ReportedUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

/// Identity lookup against the local whoami service. The deadline is
/// enforced per request; an aborted request surfaces as
/// `LookupError::Timeout`.
pub struct HttpUsernameLookup {
    client: reqwest::Client,
    url: String,
}

impl HttpUsernameLookup {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for HttpUsernameLookup {
    fn default() -> Self {
        Self::new(DEFAULT_WHOAMI_URL)
    }
}

#[async_trait]
impl UsernameLookup for HttpUsernameLookup {
    async fn lookup(&self, deadline: Duration) -> Result<String, LookupError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else {
                    LookupError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Http(status.as_u16()));
        }

        let body: WhoamiResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        pick_username(&body).ok_or(LookupError::EmptyUsername)
    }
}

/// Prefer the interactive console user, then the service process user.
fn pick_username(body: &WhoamiResponse) -> Option<String> {
    [&body.active_console_user, &body.process_user]
        .into_iter()
        .flatten()
        .filter_map(|u| u.username.as_deref())
        .map(str::trim)
        .find(|u| !u.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_user_is_preferred() {
        let body: WhoamiResponse = serde_json::from_str(
            r#"{
                "active_console_user": {"domain": "CORP", "username": "jdoe"},
                "process_user": {"username": "svc-account"}
            }"#,
        )
        .unwrap();
        assert_eq!(pick_username(&body).as_deref(), Some("jdoe"));
    }

    #[test]
    fn process_user_backs_up_a_missing_console_session() {
        let body: WhoamiResponse = serde_json::from_str(
            r#"{"active_console_user": null, "process_user": {"username": " svc-account "}}"#,
        )
        .unwrap();
        assert_eq!(pick_username(&body).as_deref(), Some("svc-account"));
    }

    #[test]
    fn blank_usernames_are_no_username() {
        let body: WhoamiResponse = serde_json::from_str(
            r#"{"active_console_user": {"username": "  "}, "process_user": {"username": ""}}"#,
        )
        .unwrap();
        assert_eq!(pick_username(&body), None);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let body: WhoamiResponse = serde_json::from_str(
            r#"{"process_user": {"username": "jdoe", "raw": "CORP\\jdoe"}, "host": "pc-1", "ts": 0}"#,
        )
        .unwrap();
        assert_eq!(pick_username(&body).as_deref(), Some("jdoe"));
    }
}
