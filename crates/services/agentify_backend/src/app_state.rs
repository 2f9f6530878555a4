use agentify_agent::{AzureOpenAiClient, Dispatcher};
use agentify_common::{create_client, AgentifyError};
use agentify_config::AppConfig;
use agentify_gcal::CalendarSettings;
use std::sync::Arc;

use crate::service_factory::GoogleSessionFactory;

/// State shared by every route.
///
/// Holds nothing caller-specific: credentials arrive with each request and
/// travel through the dispatcher explicitly.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    /// Wires the Azure OpenAI model and the Google session factory.
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, AgentifyError> {
        let settings = CalendarSettings::from_config(&config.google)?;
        let model = AzureOpenAiClient::from_config(&config.llm)?;
        let http = create_client(config.google.timeout_secs)
            .map_err(|e| AgentifyError::Config(format!("building Google HTTP client: {}", e)))?;
        let sessions = GoogleSessionFactory::new(http, &config.google);

        let dispatcher = Dispatcher::new(
            Arc::new(model),
            Arc::new(sessions),
            settings,
            config.llm.max_iterations,
        );
        Ok(Self::new(config, Arc::new(dispatcher)))
    }
}
