use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{AgentifyError, HttpStatusCode};

pub mod client;

/// Extension trait for AgentifyError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into the `{success, error, details}` envelope.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for AgentifyError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let summary = match &self {
            AgentifyError::Authentication(_) => "Authentication failed",
            AgentifyError::Validation(_) | AgentifyError::Parse(_) => "Invalid request",
            _ => "Failed to process request",
        };

        let body = Json(json!({
            "success": false,
            "error": summary,
            "details": self.to_string(),
        }));

        (status_code, body).into_response()
    }
}

impl IntoResponse for AgentifyError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
