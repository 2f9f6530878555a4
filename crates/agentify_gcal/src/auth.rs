use agentify_common::{authentication_error, AgentifyError, Context};
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    CalendarHub,
};

// Type aliases for clarity
type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

/// Builds a Calendar hub that authenticates every call with `access_token`.
///
/// The token is used as-is; refreshing it is the caller's job
/// (see `CredentialRecord::ensure_fresh`).
pub fn create_calendar_hub(access_token: &str) -> Result<HubType, AgentifyError> {
    if access_token.trim().is_empty() {
        return Err(authentication_error("empty access token"));
    }

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("loading native TLS roots")?
        .https_or_http()
        .enable_http1()
        .build();

    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    Ok(CalendarHub::new(client, access_token.to_string()))
}
