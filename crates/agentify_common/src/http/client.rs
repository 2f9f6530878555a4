use reqwest::{Client, Error as ReqwestError};
use std::time::Duration;

/// Creates a new HTTP client with the given request timeout.
pub fn create_client(timeout_secs: u64) -> Result<Client, ReqwestError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}
