//! Environment variable handling for the Agentify service.
//!
//! Two naming schemes are understood. Prefixed variables follow the config
//! path (`AGENTIFY__LLM__ENDPOINT`) and are read by the `config` crate. The
//! deployment-facing names (`AZURE_OPENAI_ENDPOINT`, `PORT`, ...) are mapped
//! onto config paths here and applied as overrides on top of everything else.

use std::env;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "AGENTIFY";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// Deployment-facing variable names and the config path each one sets.
pub const EXTERNAL_ENV_VARS: &[(&str, &str)] = &[
    ("AZURE_OPENAI_ENDPOINT", "llm.endpoint"),
    ("AZURE_OPENAI_API_KEY", "llm.api_key"),
    ("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME", "llm.deployment"),
    ("OPENAI_API_VERSION", "llm.api_version"),
    ("PORT", "server.port"),
    ("AGENT_API_SECRET_KEY", "auth.shared_secret"),
];

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a configuration path to a prefixed environment variable name
///
/// `llm.endpoint` becomes `AGENTIFY__LLM__ENDPOINT`.
pub fn config_path_to_env_var(path: &str) -> String {
    let prefix = get_config_prefix();
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Look up the deployment-facing variable name for a config path, if any.
pub fn external_env_var_for(path: &str) -> Option<&'static str> {
    EXTERNAL_ENV_VARS
        .iter()
        .find(|(_, p)| *p == path)
        .map(|(name, _)| *name)
}

/// Collect the overrides currently present in the process environment.
///
/// Empty values are treated as unset so that `PORT=` does not clobber the
/// file default.
pub fn external_overrides() -> Vec<(&'static str, String)> {
    EXTERNAL_ENV_VARS
        .iter()
        .filter_map(|(name, path)| {
            env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (*path, v))
        })
        .collect()
}

/// Check if a path is a secret path
///
/// Paths containing "secret", "key", "password" or "token" are considered secret
/// and their values are never logged.
pub fn is_secret_path(path: &str) -> bool {
    let path_lower = path.to_lowercase();
    path_lower.contains("secret")
        || path_lower.contains("key")
        || path_lower.contains("password")
        || path_lower.contains("token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_to_env_var() {
        assert_eq!(
            config_path_to_env_var("server.host"),
            "AGENTIFY__SERVER__HOST"
        );
        assert_eq!(
            config_path_to_env_var("llm.endpoint"),
            "AGENTIFY__LLM__ENDPOINT"
        );
    }

    #[test]
    fn test_external_env_var_for() {
        assert_eq!(
            external_env_var_for("llm.deployment"),
            Some("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME")
        );
        assert_eq!(external_env_var_for("server.port"), Some("PORT"));
        assert_eq!(external_env_var_for("google.time_zone"), None);
    }

    #[test]
    fn test_is_secret_path() {
        assert!(is_secret_path("llm.api_key"));
        assert!(is_secret_path("auth.shared_secret"));
        assert!(!is_secret_path("server.port"));
        assert!(!is_secret_path("llm.endpoint"));
    }
}
