//! Gmail API v1 client over REST.
//!
//! One client is bound to one caller's access token and is discarded with the
//! request that created it.

use agentify_common::{
    authentication_error, provider_error, AgentifyError, MailService, MailSummary,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

const SERVICE_NAME: &str = "Gmail";

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<IdOnly>,
}

#[derive(Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Deserialize, Default)]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Deserialize)]
struct MessageMetadata {
    id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: Payload,
}

impl MessageMetadata {
    fn header(&self, name: &str) -> Option<String> {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
    }
}

pub struct GmailClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(http: Client, base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/users/me/{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AgentifyError> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", status));
        if status == StatusCode::UNAUTHORIZED {
            Err(authentication_error(format!(
                "Gmail rejected the credential: {}",
                message
            )))
        } else {
            Err(provider_error(SERVICE_NAME, message))
        }
    }
}

#[async_trait]
impl MailService for GmailClient {
    async fn send_message(&self, raw: String) -> Result<String, AgentifyError> {
        let sent: IdOnly = self
            .execute(self.http.post(self.url("messages/send")).json(&json!({ "raw": raw })))
            .await?;
        info!("Gmail message sent: {}", sent.id);
        Ok(sent.id)
    }

    async fn create_draft(&self, raw: String) -> Result<String, AgentifyError> {
        let draft: IdOnly = self
            .execute(
                self.http
                    .post(self.url("drafts"))
                    .json(&json!({ "message": { "raw": raw } })),
            )
            .await?;
        info!("Gmail draft created: {}", draft.id);
        Ok(draft.id)
    }

    async fn list_message_ids(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<String>, AgentifyError> {
        let max_results = max_results.to_string();
        let list: MessageList = self
            .execute(
                self.http
                    .get(self.url("messages"))
                    .query(&[("q", query), ("maxResults", max_results.as_str())]),
            )
            .await?;
        debug!("Gmail query matched {} message(s)", list.messages.len());
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn message_summary(&self, id: &str) -> Result<MailSummary, AgentifyError> {
        let message: MessageMetadata = self
            .execute(self.http.get(self.url(&format!("messages/{}", id))).query(&[
                ("format", "metadata"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "Subject"),
            ]))
            .await?;
        Ok(MailSummary {
            from: message.header("From"),
            subject: message.header("Subject"),
            id: message.id,
            snippet: message.snippet,
        })
    }
}
