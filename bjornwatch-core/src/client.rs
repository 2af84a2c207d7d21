//! HTTP client for the Björn session backend
//!
//! One endpoint matters here: `GET {base}/api/session/{code}?pin={pin}`,
//! which returns either `{"child_name": ..., "messages": [...]}` or
//! `{"error": "..."}`. The client normalizes every outcome into a
//! [`SessionResponse`]; `fetch_session` has no error path of its own so
//! the poll loop never has to distinguish transport faults from domain
//! faults.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{LogItem, SessionResponse};

/// Failure message when no backend base URL is configured
pub const MSG_NO_BASE_URL: &str = "API base URL is not configured";

/// User copy for the backend's `invalid_session` error code
pub const MSG_INVALID_SESSION: &str = "This session code does not exist.";

/// User copy for the backend's `invalid_password` error code
pub const MSG_INVALID_PASSWORD: &str = "Incorrect parent password.";

/// User copy for any other backend error code
pub const MSG_INCORRECT_LOGIN: &str = "Session ID or parent password is incorrect.";

/// Child name used when the backend omits one
pub const UNKNOWN_CHILD_NAME: &str = "(unknown)";

/// HTTP client for session transcript lookups
pub struct SessionClient {
    http_client: reqwest::Client,
    base_url: Option<String>,
}

impl SessionClient {
    /// Create a new session client from configuration
    ///
    /// A missing base URL is not an error here: the client is still built
    /// and every fetch fails locally with [`MSG_NO_BASE_URL`]. Construction
    /// only fails when the bearer token cannot form a valid header or the
    /// HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = config
            .resolved_base_url()
            .map(|url| url.trim_end_matches('/').to_string());

        // Build default headers
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Add authorization header
        if let Some(token) = config.resolved_token() {
            let auth_value = format!("Bearer {}", token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Api(format!("invalid token: {}", e)))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Api(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Whether a backend base URL is configured
    pub fn has_base_url(&self) -> bool {
        self.base_url.is_some()
    }

    /// Fetch the transcript for one session
    ///
    /// Never returns `Err`; the failure arm of [`SessionResponse`] carries
    /// user-ready copy:
    /// - no base URL configured: [`MSG_NO_BASE_URL`], no network call
    /// - transport failure (connect, timeout): `request failed: ...`
    /// - body with an `error` field (any status): mapped per
    ///   [`user_message_for_code`]
    /// - non-2xx without an `error` field: `<code> <reason>`
    /// - 2xx without a decodable `messages` array: a short decode message
    pub async fn fetch_session(&self, session_code: &str, pin: &str) -> SessionResponse {
        let Some(base_url) = &self.base_url else {
            return SessionResponse::failure(MSG_NO_BASE_URL);
        };

        let url = format!(
            "{}/api/session/{}",
            base_url,
            urlencoding::encode(session_code)
        );

        let response = match self
            .http_client
            .get(&url)
            .query(&[("pin", pin)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(session_code, error = %e, "session request failed");
                return SessionResponse::failure(format!("request failed: {}", e));
            }
        };

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        // A body that is not valid JSON counts as an empty object; the
        // status and error-field rules below still apply.
        let body: serde_json::Value =
            serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({}));

        // An explicit error field wins regardless of HTTP status.
        if let Some(err) = body.get("error") {
            let code = err
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            tracing::debug!(session_code, code = %code, "backend rejected session lookup");
            return SessionResponse::failure(user_message_for_code(&code));
        }

        if !status.is_success() {
            return SessionResponse::failure(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            ));
        }

        let child_name = body
            .get("child_name")
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_CHILD_NAME)
            .to_string();

        let messages = match body.get("messages") {
            Some(value) => match serde_json::from_value::<Vec<LogItem>>(value.clone()) {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::warn!(session_code, error = %e, "transcript failed to decode");
                    return SessionResponse::failure("malformed transcript in response");
                }
            },
            None => return SessionResponse::failure("response is missing the transcript"),
        };

        SessionResponse::Success {
            child_name,
            messages,
        }
    }
}

/// Map a backend error code to user-facing copy
///
/// Only `invalid_session` and `invalid_password` have dedicated copy;
/// everything else falls back to the generic message so unexpected codes
/// still read as a login problem rather than leaking protocol strings.
pub fn user_message_for_code(code: &str) -> &'static str {
    match code {
        "invalid_session" => MSG_INVALID_SESSION,
        "invalid_password" => MSG_INVALID_PASSWORD,
        _ => MSG_INCORRECT_LOGIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_without_base_url() {
        let config = ApiConfig::default();
        let client = SessionClient::new(&config).unwrap();
        assert!(!client.has_base_url());
    }

    #[test]
    fn test_client_rejects_invalid_token() {
        let config = ApiConfig {
            base_url: Some("https://bjorn.example.com".to_string()),
            token: Some("tok\nwith-newline".to_string()),
            ..Default::default()
        };
        assert!(SessionClient::new(&config).is_err());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let config = ApiConfig {
            base_url: Some("https://bjorn.example.com/".to_string()),
            ..Default::default()
        };
        let client = SessionClient::new(&config).unwrap();
        assert_eq!(
            client.base_url.as_deref(),
            Some("https://bjorn.example.com")
        );
    }

    #[test]
    fn test_user_message_for_code() {
        assert_eq!(user_message_for_code("invalid_session"), MSG_INVALID_SESSION);
        assert_eq!(
            user_message_for_code("invalid_password"),
            MSG_INVALID_PASSWORD
        );
        assert_eq!(user_message_for_code("rate_limited"), MSG_INCORRECT_LOGIN);
        assert_eq!(user_message_for_code("null"), MSG_INCORRECT_LOGIN);
    }
}
