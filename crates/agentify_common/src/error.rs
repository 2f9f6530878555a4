use std::fmt;
use thiserror::Error;

/// The base error type for all Agentify errors.
///
/// Capability functions never let these escape: they render them into the text
/// handed back to the model. Only the dispatcher and the HTTP layer see them as
/// values.
#[derive(Error, Debug)]
pub enum AgentifyError {
    /// Bad, expired or malformed credential, or a failed token refresh
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Malformed request envelope or tool arguments
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failure reported by the calendar or mail provider
    #[error("{service} error: {message}")]
    Provider { service: String, message: String },

    /// Failure inside the model tool-calling loop
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure talking to an upstream service
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Upstream returned something we could not decode
    #[error("Failed to parse data: {0}")]
    Parse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for AgentifyError {
    fn status_code(&self) -> u16 {
        match self {
            AgentifyError::Authentication(_) => 401,
            AgentifyError::Validation(_) => 400,
            AgentifyError::Provider { .. } => 502,
            AgentifyError::Dispatch(_) => 500,
            AgentifyError::Config(_) => 500,
            AgentifyError::Http(_) => 502,
            AgentifyError::Parse(_) => 400,
            AgentifyError::Internal(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, AgentifyError>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, AgentifyError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| AgentifyError::Internal(format!("{}: {}", context, error)))
    }
}

impl From<reqwest::Error> for AgentifyError {
    fn from(err: reqwest::Error) -> Self {
        AgentifyError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for AgentifyError {
    fn from(err: serde_json::Error) -> Self {
        AgentifyError::Parse(err.to_string())
    }
}

pub fn authentication_error<T: fmt::Display>(message: T) -> AgentifyError {
    AgentifyError::Authentication(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> AgentifyError {
    AgentifyError::Validation(message.to_string())
}

pub fn provider_error<T: fmt::Display>(service_name: &str, message: T) -> AgentifyError {
    AgentifyError::Provider {
        service: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn dispatch_error<T: fmt::Display>(message: T) -> AgentifyError {
    AgentifyError::Dispatch(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(authentication_error("expired").status_code(), 401);
        assert_eq!(validation_error("missing input").status_code(), 400);
        assert_eq!(provider_error("Gmail", "quota").status_code(), 502);
        assert_eq!(dispatch_error("model down").status_code(), 500);
    }

    #[test]
    fn test_provider_error_display() {
        let err = provider_error("Google Calendar", "404 Not Found");
        assert_eq!(err.to_string(), "Google Calendar error: 404 Not Found");
    }

    #[test]
    fn test_context_wraps_as_internal() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let err = result.context("building connector").unwrap_err();
        assert_eq!(err.to_string(), "Internal error: building connector: boom");
    }
}
