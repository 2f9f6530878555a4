use chrono::NaiveTime;
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
use tracing::debug;

pub mod env_vars;
pub mod models;
pub use models::*;

/// Loads the service configuration.
///
/// Sources, lowest precedence first: `config/default.toml`, `config/<RUN_ENV>.toml`,
/// `AGENTIFY__*` variables, then the deployment-facing names listed in
/// [`env_vars::EXTERNAL_ENV_VARS`]. The result is validated before it is returned.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env_vars::get_config_prefix();
    let config_dir = PathBuf::from(env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!(
        "Loading config from {} and {}",
        default_path.display(),
        env_path.display()
    );

    let mut builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .separator(env_vars::CONFIG_SEPARATOR)
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins")
                .try_parsing(true),
        );

    for (path, value) in env_vars::external_overrides() {
        if env_vars::is_secret_path(path) {
            debug!("Applying environment override for {} (redacted)", path);
        } else {
            debug!("Applying environment override for {} = {}", path, value);
        }
        builder = builder.set_override(path, value)?;
    }

    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    /// Checks the values serde cannot: non-empty secrets, a known time zone and
    /// a sane working window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("llm.endpoint", &self.llm.endpoint),
            ("llm.api_key", &self.llm.api_key),
            ("llm.deployment", &self.llm.deployment),
            ("auth.shared_secret", &self.auth.shared_secret),
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(path, _)| match env_vars::external_env_var_for(path) {
                Some(name) => name.to_string(),
                None => env_vars::config_path_to_env_var(path),
            })
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Message(format!(
                "Missing required environment variables: {:?}",
                missing
            )));
        }

        self.google.zone()?;
        let (start, end) = self.google.work_window()?;
        if start >= end {
            return Err(ConfigError::Message(format!(
                "google.work_start ({}) must be before google.work_end ({})",
                self.google.work_start, self.google.work_end
            )));
        }
        if self.llm.max_iterations == 0 {
            return Err(ConfigError::Message(
                "llm.max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl GoogleConfig {
    /// Parsed IANA zone.
    pub fn zone(&self) -> Result<Tz, ConfigError> {
        self.time_zone.parse::<Tz>().map_err(|_| {
            ConfigError::Message(format!("Unknown time zone: {}", self.time_zone))
        })
    }

    /// Parsed `(work_start, work_end)`.
    pub fn work_window(&self) -> Result<(NaiveTime, NaiveTime), ConfigError> {
        let parse = |key: &str, value: &str| {
            NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
                ConfigError::Message(format!("Invalid {} (expected HH:MM): {}", key, value))
            })
        };
        Ok((
            parse("google.work_start", &self.work_start)?,
            parse("google.work_end", &self.work_end)?,
        ))
    }
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// Uses `DOTENV_OVERRIDE` when set, otherwise `.env` in the working directory.
/// A missing file is not an error. Returns the path that was tried.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
