use agentify_common::{
    log_result, AgentifyError, CredentialRecord, SessionFactory, Sessions,
};
use agentify_config::GoogleConfig;
use agentify_gcal::{create_calendar_hub, GoogleCalendarService};
use agentify_gmail::GmailClient;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Builds live Google sessions from a caller's credential record.
///
/// Refreshes the access token when needed, then binds a Calendar hub and a
/// Gmail client to it. Each call starts from the record it is given.
pub struct GoogleSessionFactory {
    http: Client,
    token_uri: String,
    gmail_base_url: String,
}

impl GoogleSessionFactory {
    pub fn new(http: Client, config: &GoogleConfig) -> Self {
        Self {
            http,
            token_uri: config.token_uri.clone(),
            gmail_base_url: config.gmail_base_url.clone(),
        }
    }
}

#[async_trait]
impl SessionFactory for GoogleSessionFactory {
    async fn obtain_sessions(
        &self,
        credential: &CredentialRecord,
    ) -> Result<Sessions, AgentifyError> {
        let fresh = log_result(
            credential.ensure_fresh(&self.http, &self.token_uri).await,
            "Google credential ready",
            "Google credential unusable",
        )?;
        let access_token = fresh.access_token()?;

        let hub = create_calendar_hub(access_token)?;
        Ok(Sessions {
            calendar: Arc::new(GoogleCalendarService::new(Arc::new(hub))),
            mail: Arc::new(GmailClient::new(
                self.http.clone(),
                self.gmail_base_url.as_str(),
                access_token,
            )),
        })
    }
}
