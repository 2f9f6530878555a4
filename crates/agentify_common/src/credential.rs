//! Caller-supplied Google credentials.
//!
//! A [`CredentialRecord`] arrives with every `/invoke` request and is never
//! persisted. Before any provider call it is passed through
//! [`CredentialRecord::ensure_fresh`], which exchanges the refresh token for a
//! new access token when the current one is missing or about to expire.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{authentication_error, AgentifyError};

const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.compose",
];

/// Tokens expiring within this window are refreshed up front.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default, alias = "token")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default, alias = "scope", deserialize_with = "deserialize_scopes")]
    pub scopes: Option<Vec<String>>,
    /// RFC 3339, or a naive UTC timestamp as written by google-auth.
    #[serde(default)]
    pub expiry: Option<String>,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("CredentialRecord")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScopeList {
    Joined(String),
    List(Vec<String>),
}

fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let scopes = Option::<ScopeList>::deserialize(deserializer)?;
    Ok(scopes.map(|s| match s {
        ScopeList::Joined(joined) => joined.split_whitespace().map(str::to_string).collect(),
        ScopeList::List(list) => list,
    }))
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// RFC 3339 expiry `secs` from now; out-of-range lifetimes count as no expiry.
fn expiry_after(secs: i64) -> Option<String> {
    let lifetime = Duration::try_seconds(secs)?;
    Utc::now()
        .checked_add_signed(lifetime)
        .map(|expiry| expiry.to_rfc3339())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CredentialRecord {
    /// Parses the `token` object of an invocation request.
    pub fn from_value(value: Value) -> Result<Self, AgentifyError> {
        if !value.is_object() {
            return Err(authentication_error("credential record must be a JSON object"));
        }
        serde_json::from_value(value)
            .map_err(|e| authentication_error(format!("malformed credential record: {}", e)))
    }

    /// The current access token, if any.
    pub fn access_token(&self) -> Result<&str, AgentifyError> {
        non_empty(&self.access_token)
            .ok_or_else(|| authentication_error("credential record has no access token"))
    }

    /// Scopes requested on refresh, defaulting to calendar and mail access.
    pub fn scopes(&self) -> Vec<String> {
        self.scopes
            .clone()
            .unwrap_or_else(|| DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect())
    }

    /// Parsed expiry; unparseable values are treated as unknown.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = non_empty(&self.expiry)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(naive) => Some(naive.and_utc()),
            Err(_) => {
                warn!("Ignoring unparseable credential expiry");
                None
            }
        }
    }

    /// True when the token is missing or expires within the skew window.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        if non_empty(&self.access_token).is_none() {
            return true;
        }
        match self.expires_at() {
            Some(expiry) => expiry <= now + Duration::seconds(EXPIRY_SKEW_SECS),
            None => false,
        }
    }

    /// True when the record carries everything the refresh grant needs.
    pub fn can_refresh(&self) -> bool {
        non_empty(&self.refresh_token).is_some()
            && non_empty(&self.client_id).is_some()
            && non_empty(&self.client_secret).is_some()
    }

    /// Exchanges the refresh token for a new access token at `token_endpoint`.
    ///
    /// The record's own `token_uri`, when present, must name the same endpoint;
    /// the client secret is never posted anywhere else.
    pub async fn refresh(
        &self,
        http: &Client,
        token_endpoint: &str,
    ) -> Result<Self, AgentifyError> {
        let (refresh_token, client_id, client_secret) = match (
            non_empty(&self.refresh_token),
            non_empty(&self.client_id),
            non_empty(&self.client_secret),
        ) {
            (Some(r), Some(id), Some(secret)) => (r, id, secret),
            _ => {
                return Err(authentication_error(
                    "credential record lacks refresh_token, client_id or client_secret",
                ))
            }
        };
        if let Some(requested) = non_empty(&self.token_uri) {
            if requested.trim_end_matches('/') != token_endpoint.trim_end_matches('/') {
                warn!("Refusing refresh against unexpected token_uri {}", requested);
                return Err(authentication_error(format!(
                    "credential token_uri {} is not the configured token endpoint",
                    requested
                )));
            }
        }

        info!("Refreshing Google access token");
        let scope = self.scopes().join(" ");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("scope", scope.as_str()),
        ];
        let response = http
            .post(token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| authentication_error(format!("token refresh request failed: {}", e)))?;

        let status = response.status();
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| authentication_error(format!("invalid token refresh response: {}", e)))?;

        if !status.is_success() {
            let reason = body
                .error_description
                .or(body.error)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(authentication_error(format!(
                "token refresh rejected ({}): {}",
                status.as_u16(),
                reason
            )));
        }

        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| authentication_error("token refresh response had no access_token"))?;
        debug!("Token refresh succeeded");

        Ok(Self {
            access_token: Some(access_token),
            refresh_token: body.refresh_token.or_else(|| self.refresh_token.clone()),
            expiry: body.expires_in.and_then(expiry_after),
            ..self.clone()
        })
    }

    /// Returns a record whose access token is usable right now.
    pub async fn ensure_fresh(
        &self,
        http: &Client,
        token_endpoint: &str,
    ) -> Result<Self, AgentifyError> {
        if !self.needs_refresh(Utc::now()) {
            return Ok(self.clone());
        }
        if self.can_refresh() {
            return self.refresh(http, token_endpoint).await;
        }
        if non_empty(&self.access_token).is_none() {
            Err(authentication_error(
                "credential record has no access token and cannot be refreshed",
            ))
        } else {
            Err(authentication_error(
                "access token has expired and no refresh token is available",
            ))
        }
    }
}
