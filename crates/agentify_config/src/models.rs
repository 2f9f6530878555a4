use serde::{Deserialize, Serialize};
use std::fmt;

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// --- Azure OpenAI Config ---
// endpoint, api_key and deployment are mandatory; usually supplied through
// AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_KEY and AZURE_OPENAI_CHAT_DEPLOYMENT_NAME.
#[derive(Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: String::new(),
            api_version: default_api_version(),
            temperature: 0.0,
            max_iterations: default_max_iterations(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("temperature", &self.temperature)
            .field("max_iterations", &self.max_iterations)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// --- Inbound Auth Config ---
// Shared secret expected as `Authorization: Bearer <secret>` on /invoke.
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub shared_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("shared_secret", &"<redacted>")
            .finish()
    }
}

// --- Google Calendar / Gmail Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GoogleConfig {
    /// IANA zone used for naive event times and for the free/busy window.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// Start of the working window, `HH:MM`.
    #[serde(default = "default_work_start")]
    pub work_start: String,
    /// End of the working window, `HH:MM`.
    #[serde(default = "default_work_end")]
    pub work_end: String,
    /// The only endpoint refresh grants are sent to. A credential naming a
    /// different `token_uri` is rejected.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default = "default_gmail_base_url")]
    pub gmail_base_url: String,
    #[serde(default = "default_google_timeout")]
    pub timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            calendar_id: default_calendar_id(),
            work_start: default_work_start(),
            work_end: default_work_end(),
            token_uri: default_token_uri(),
            gmail_base_url: default_gmail_base_url(),
            timeout_secs: default_google_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_api_version() -> String {
    "2024-12-01-preview".to_string()
}

fn default_max_iterations() -> usize {
    15
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_time_zone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_work_start() -> String {
    "09:00".to_string()
}

fn default_work_end() -> String {
    "18:00".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_gmail_base_url() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}

fn default_google_timeout() -> u64 {
    30
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}
